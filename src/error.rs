//! Error types for pool creation.
//!
//! Only arena reservation can fail. Running out of free space during
//! `allocate` is an expected outcome and is reported as `None` instead.

use thiserror::Error;

/// Errors raised while reserving a pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
  /// The host allocator refused to hand out the backing buffer.
  #[error("failed to reserve a {size} byte arena from the host allocator")]
  Reserve {
    /// Arena size after rounding.
    size: usize,
  },

  /// Rounding the requested arena size overflowed `usize`.
  #[error("arena size {requested} overflows when rounded to a word multiple")]
  SizeOverflow {
    /// Size the caller asked for.
    requested: usize,
  },
}

/// Shorthand used by pool constructors.
pub type Result<T> = std::result::Result<T, PoolError>;
