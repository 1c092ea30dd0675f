use crate::{align::TAG_SIZE, arena::Arena};

/// Snapshot of one block as described by its leading boundary tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Offset of the leading tag inside the arena.
  pub offset: usize,
  /// Total size, both tags included.
  pub size: usize,
  pub is_free: bool,
}

impl BlockInfo {
  pub(crate) fn read(
    arena: &Arena,
    offset: usize,
  ) -> Self {
    let tag = arena.read_tag(offset);
    Self {
      offset,
      size: tag.size(),
      is_free: tag.is_free(),
    }
  }

  /// Offset one past the trailing tag, which is where the next block starts.
  #[inline]
  pub fn end(&self) -> usize {
    self.offset + self.size
  }

  /// Bytes available between the two tags.
  #[inline]
  pub fn payload_size(&self) -> usize {
    self.size - 2 * TAG_SIZE
  }
}

/// Heap walk: visits every block in address order by hopping from one
/// leading tag to the next.
pub struct Blocks<'a> {
  pub(crate) arena: &'a Arena,
  pub(crate) offset: usize,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.offset >= self.arena.len() {
      return None;
    }

    let block = BlockInfo::read(self.arena, self.offset);

    // A zero size would loop forever; only a corrupted tag can produce it.
    if block.size == 0 {
      self.offset = self.arena.len();
      return None;
    }

    self.offset = block.end();
    Some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{align::MIN_BLOCK_SIZE, tag::Tag};

  #[test]
  fn test_walk_follows_tags() {
    let mut arena = Arena::reserve(MIN_BLOCK_SIZE * 3).unwrap();

    arena.write_tags(0, Tag::encode(MIN_BLOCK_SIZE, false));
    arena.write_tags(MIN_BLOCK_SIZE, Tag::encode(MIN_BLOCK_SIZE * 2, true));

    let blocks: Vec<_> = Blocks { arena: &arena, offset: 0 }.collect();

    assert_eq!(
      blocks,
      vec![
        BlockInfo { offset: 0, size: MIN_BLOCK_SIZE, is_free: false },
        BlockInfo { offset: MIN_BLOCK_SIZE, size: MIN_BLOCK_SIZE * 2, is_free: true },
      ]
    );
    assert_eq!(blocks[1].end(), arena.len());
    assert_eq!(blocks[0].payload_size(), MIN_BLOCK_SIZE - 2 * TAG_SIZE);
  }

  #[test]
  fn test_walk_stops_on_zero_size() {
    let arena = Arena::reserve(MIN_BLOCK_SIZE).unwrap();

    assert_eq!(Blocks { arena: &arena, offset: 0 }.count(), 0);
  }
}
