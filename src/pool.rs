use std::{
  fmt,
  ptr::NonNull,
  sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, trace};

use crate::{
  align::{MIN_BLOCK_SIZE, TAG_SIZE, checked_align},
  arena::Arena,
  block::{BlockInfo, Blocks},
  config::PoolConfig,
  error::{PoolError, Result},
  freelist::FreeList,
  tag::Tag,
};

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// Handle to an allocated payload. This is what `malloc` would return as a
/// pointer: the arena offset of the first payload byte, right after the
/// leading boundary tag, plus the identity of the pool that handed it out.
///
/// Handles are plain values. They stay valid until passed to
/// [`Pool::release`] and are meaningless once their pool is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
  pool: usize,
  offset: usize,
}

impl Allocation {
  /// Arena offset of the first payload byte. Always a word multiple.
  #[inline]
  pub fn offset(&self) -> usize {
    self.offset
  }

  #[inline]
  fn block(&self) -> usize {
    self.offset - TAG_SIZE
  }
}

/// First-fit allocator over one fixed arena with boundary tags and an
/// explicit free list.
///
/// ```text
///   reserve(P):
///   +-----+-------------------------------------------------------+-----+
///   |P|1  |                      free                             |P|1  |
///   +-----+-------------------------------------------------------+-----+
///
///   allocate(a), allocate(b):
///   +-----+-----+-----+-----+-----+-----+---------------------+-----+
///   |A|0  |  a  |A|0  |B|0  |  b  |B|0  |R|1      free        |R|1  |
///   +-----+-----+-----+-----+-----+-----+---------------------+-----+
///                                       ^
///                                       frontier
/// ```
///
/// The frontier marks the end of the region that splits have carved into
/// distinct blocks. It only moves forward.
pub struct Pool {
  id: usize,
  arena: Arena,
  free_list: FreeList,
  frontier: usize,
}

impl Pool {
  /// Reserves an arena of at least `pool_size` bytes and formats it as one
  /// free block.
  pub fn reserve(pool_size: usize) -> Result<Self> {
    Self::with_config(PoolConfig::new(pool_size))
  }

  pub fn with_config(config: PoolConfig) -> Result<Self> {
    let requested = config.pool_size;
    let size = checked_align(requested)
      .ok_or(PoolError::SizeOverflow { requested })?
      .max(MIN_BLOCK_SIZE);

    let mut arena = Arena::reserve(size).ok_or(PoolError::Reserve { size })?;
    arena.write_tags(0, Tag::encode(size, true));

    let mut free_list = FreeList::new();
    free_list.push(&mut arena, 0);

    let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

    debug!(
      "pool {} reserved {} bytes at {:p} (requested {})",
      id,
      size,
      arena.base_ptr(),
      requested
    );

    Ok(Self {
      id,
      arena,
      free_list,
      frontier: 0,
    })
  }

  /// Hands the whole arena back to the host allocator. Every [`Allocation`]
  /// obtained from this pool becomes meaningless.
  pub fn release_arena(self) {
    debug!(
      "pool {} released {} bytes at {:p}",
      self.id,
      self.arena.len(),
      self.arena.base_ptr()
    );
  }

  /// Allocates at least `size` bytes. Returns `None` for zero sized requests
  /// and when no free block is large enough.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Allocation> {
    if size == 0 {
      return None;
    }

    let total = checked_align(size)?
      .checked_add(2 * TAG_SIZE)?
      .max(MIN_BLOCK_SIZE);

    let Some(block) = self.find_free_block(total) else {
      debug!(
        "pool {}: no free block for {} bytes ({} with tags), {} free blocks",
        self.id,
        size,
        total,
        self.free_list.len()
      );
      return None;
    };

    // Unlink first so the split remainder can never meet a stale entry for
    // its own donor while coalescing.
    self.free_list.remove(&mut self.arena, block);
    let block = self.split(block, total);

    let allocation = Allocation {
      pool: self.id,
      offset: block + TAG_SIZE,
    };

    trace!(
      "pool {}: allocate({}) -> offset {} ({:p})",
      self.id,
      size,
      allocation.offset,
      self.arena.ptr_at(allocation.offset)
    );

    Some(allocation)
  }

  /// Gives a block back to the pool, merging it with free neighbors. `None`
  /// is ignored.
  ///
  /// Releasing a handle twice or one from another pool is a contract
  /// violation. Debug builds catch both, release builds corrupt the pool.
  pub fn release(
    &mut self,
    allocation: Option<Allocation>,
  ) {
    let Some(allocation) = allocation else {
      return;
    };

    debug_assert_eq!(
      allocation.pool, self.id,
      "allocation {allocation:?} does not belong to pool {}",
      self.id
    );

    let block = allocation.block();
    let tag = self.arena.read_tag(block);

    debug_assert!(!tag.is_free(), "double release of {allocation:?}");

    self.arena.write_tags(block, tag.as_free());

    let merged = self.coalesce(block);
    self.free_list.push(&mut self.arena, merged);

    trace!(
      "pool {}: release(offset {}) -> free block at {} of {} bytes",
      self.id,
      allocation.offset,
      merged,
      self.arena.read_tag(merged).size()
    );
  }

  /// Same as `release(Some(allocation))`.
  #[inline]
  pub fn free(
    &mut self,
    allocation: Allocation,
  ) {
    self.release(Some(allocation));
  }

  /// First fit, in free list order.
  fn find_free_block(
    &self,
    total: usize,
  ) -> Option<usize> {
    self
      .free_list
      .iter(&self.arena)
      .find(|&block| self.arena.read_tag(block).size() >= total)
  }

  /// Turns the free, already unlinked `block` into an allocated block of
  /// `total` bytes, handing any usable remainder back to the free list.
  /// Remainders smaller than [`MIN_BLOCK_SIZE`] stay inside the allocated
  /// block.
  fn split(
    &mut self,
    block: usize,
    total: usize,
  ) -> usize {
    let tag = self.arena.read_tag(block);
    let size = tag.size();
    let remaining = size - total;

    if remaining >= MIN_BLOCK_SIZE {
      let rest = block + total;

      self.arena.write_tags(block, Tag::encode(total, false));
      self.arena.write_tags(rest, Tag::encode(remaining, true));
      self.frontier = self.frontier.max(rest);

      trace!(
        "pool {}: split block at {} into {} + {} bytes",
        self.id, block, total, remaining
      );

      let rest = self.coalesce(rest);
      self.free_list.push(&mut self.arena, rest);
    } else {
      self.arena.write_tags(block, tag.as_allocated());
      self.frontier = self.frontier.max(block + size);
    }

    block
  }

  /// Merges the free, unlinked block at `block` with free neighbors on
  /// either side and returns the start of the result. The neighbors are
  /// unlinked; the result is not linked.
  fn coalesce(
    &mut self,
    block: usize,
  ) -> usize {
    let mut start = block;
    let mut size = self.arena.read_tag(block).size();

    let next = start + size;
    if next < self.arena.len() && next <= self.frontier {
      let tag = self.arena.read_tag(next);
      if tag.is_free() {
        self.free_list.remove(&mut self.arena, next);
        size += tag.size();
        trace!("pool {}: merged block at {} into {}", self.id, next, start);
      }
    }

    if start > 0 {
      let tag = self.arena.read_footer(start);
      if tag.is_free() {
        let prev = start - tag.size();
        self.free_list.remove(&mut self.arena, prev);
        size += tag.size();
        trace!("pool {}: merged block at {} into {}", self.id, start, prev);
        start = prev;
      }
    }

    self.arena.write_tags(start, Tag::encode(size, true));
    start
  }

  /// The caller's bytes for `allocation`. At least as long as requested.
  pub fn payload(
    &self,
    allocation: Allocation,
  ) -> &[u8] {
    let len = self.usable_size(allocation);
    self.arena.bytes(allocation.offset, len)
  }

  pub fn payload_mut(
    &mut self,
    allocation: Allocation,
  ) -> &mut [u8] {
    let len = self.usable_size(allocation);
    self.arena.bytes_mut(allocation.offset, len)
  }

  /// Address of the payload. Word aligned.
  pub fn as_ptr(
    &self,
    allocation: Allocation,
  ) -> NonNull<u8> {
    self.arena.ptr_at(allocation.offset)
  }

  /// Payload bytes actually backing `allocation`, including any slack the
  /// allocator kept instead of splitting.
  pub fn usable_size(
    &self,
    allocation: Allocation,
  ) -> usize {
    debug_assert_eq!(allocation.pool, self.id);
    BlockInfo::read(&self.arena, allocation.block()).payload_size()
  }

  /// Arena size in bytes.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.arena.len()
  }

  #[inline]
  pub fn frontier(&self) -> usize {
    self.frontier
  }

  /// Every block in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      arena: &self.arena,
      offset: 0,
    }
  }

  /// Free blocks in free list order, most recently freed first.
  pub fn free_blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    self
      .free_list
      .iter(&self.arena)
      .map(|block| BlockInfo::read(&self.arena, block))
  }

  pub fn stats(&self) -> PoolStats {
    let mut stats = PoolStats {
      capacity: self.capacity(),
      ..PoolStats::default()
    };

    for block in self.blocks() {
      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.used_blocks += 1;
        stats.used_bytes += block.size;
      }
    }

    stats
  }
}

impl fmt::Debug for Pool {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Pool")
      .field("id", &self.id)
      .field("base", &self.arena.base_ptr())
      .field("capacity", &self.arena.len())
      .field("frontier", &self.frontier)
      .field("free_blocks", &self.free_list.len())
      .field("free_list_head", &self.free_list.head())
      .finish()
  }
}

/// Byte and block counts from a heap walk. Sizes include boundary tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
  pub capacity: usize,
  pub free_bytes: usize,
  pub used_bytes: usize,
  pub free_blocks: usize,
  pub used_blocks: usize,
  pub largest_free: usize,
}

impl fmt::Display for PoolStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "capacity = {}, used = {} in {} blocks, free = {} in {} blocks, largest free = {}",
      self.capacity,
      self.used_bytes,
      self.used_blocks,
      self.free_bytes,
      self.free_blocks,
      self.largest_free
    )
  }
}
