//! # tagpool - A Boundary Tag Pool Allocator
//!
//! This crate provides a **first-fit pool allocator** that carves
//! allocations out of one fixed arena reserved up front, using boundary
//! tags and an explicit free list.
//!
//! ## Overview
//!
//! The pool never asks the host for memory after it has been created. All
//! requests are served from a single buffer that starts out as one big free
//! block and gets split and merged as the program runs:
//!
//! ```text
//!   Pool Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌──────┬────────┬──────┬──────────┬──────┬─────────────────────┐   │
//!   │   │ Used │  Free  │ Used │   Free   │ Used │        Free         │   │
//!   │   └──────┴───▲────┴──────┴────▲─────┴──────┴──────────▲──────────┘   │
//!   │              │                │                       │              │
//!   │              └──── free list ─┴───────────────────────┘              │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation: first free block that fits, split if it is too big.
//!   Release: merge with free neighbors, push on the free list.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   tagpool
//!   ├── align      - Word alignment (align!) and size constants
//!   ├── tag        - Boundary tag encoding
//!   ├── arena      - Backing buffer and offset accessors (internal)
//!   ├── freelist   - Explicit free list (internal)
//!   ├── block      - Block views and heap walk
//!   ├── config     - PoolConfig
//!   ├── error      - PoolError
//!   └── pool       - Pool: allocate, split, coalesce, release
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tagpool::Pool;
//!
//! let mut pool = Pool::reserve(4096).expect("arena");
//!
//! let greeting = pool.allocate(5).unwrap();
//! pool.payload_mut(greeting)[..5].copy_from_slice(b"hello");
//! assert_eq!(&pool.payload(greeting)[..5], b"hello");
//!
//! pool.free(greeting);
//! pool.release_arena();
//! ```
//!
//! ## How It Works
//!
//! Every block carries its size and a free flag twice, once in a header word
//! and once in a footer word. The footer of one block sits right before the
//! header of the next, so a block can find both neighbors in O(1):
//!
//! ```text
//!   Single Block:
//!   ┌────────────┬──────────────────────────────────┬────────────┐
//!   │   Header   │             Payload              │   Footer   │
//!   │ size | f   │                                  │ size | f   │
//!   └────────────┴──────────────────────────────────┴────────────┘
//!                ▲
//!                └── Allocation handed to the user
//!
//!   Free Block:
//!   ┌────────────┬────────────┬────────────┬────────┬────────────┐
//!   │ size | 1   │    next    │    prev    │  ...   │ size | 1   │
//!   └────────────┴────────────┴────────────┴────────┴────────────┘
//!                  free list links reuse the payload
//! ```
//!
//! Releasing a block looks at the header right after it and the footer right
//! before it. Any free neighbor is unlinked from the free list and absorbed,
//! so two free blocks are never left side by side.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization, `Pool` is neither `Send`
//!   nor `Sync`
//! - **Fixed size**: the arena never grows, exhausted pools return `None`
//! - **No resizing**: there is no `realloc`
//! - **No zeroing**: allocations carry whatever the previous owner wrote
//! - **No corruption detection**: double release is only caught in debug
//!   builds

pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod freelist;
mod pool;
mod tag;

pub use block::{BlockInfo, Blocks};
pub use config::{DEFAULT_POOL_SIZE, POOL_SIZE_VAR, PoolConfig};
pub use error::{PoolError, Result};
pub use pool::{Allocation, Pool, PoolStats};
pub use tag::Tag;
