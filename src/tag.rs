use std::fmt;

/// Boundary tag: one word holding a block's total size and its free flag.
///
/// Every block carries two identical copies of its tag, one at each end, so
/// the block can be identified from either side:
///
/// ```text
///   +-----------+-------------------------------+-----------+
///   |  Tag      |            Payload            |  Tag      |
///   | size|free |                               | size|free |
///   +-----------+-------------------------------+-----------+
///   ^                                                       ^
///   block start                               block start + size
/// ```
///
/// The size is stored shifted up by one bit and the free flag takes the
/// lowest bit. Sizes are always word multiples so no information is lost.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tag(usize);

impl Tag {
  /// Packs `size` and `is_free` into a tag.
  #[inline]
  pub const fn encode(
    size: usize,
    is_free: bool,
  ) -> Self {
    Self((size << 1) | is_free as usize)
  }

  /// Rebuilds a tag from a word read out of the arena.
  #[inline]
  pub const fn from_raw(raw: usize) -> Self {
    Self(raw)
  }

  #[inline]
  pub const fn raw(self) -> usize {
    self.0
  }

  /// Total block size, both tags included.
  #[inline]
  pub const fn size(self) -> usize {
    self.0 >> 1
  }

  #[inline]
  pub const fn is_free(self) -> bool {
    self.0 & 1 == 1
  }

  /// Same size, flag set.
  #[inline]
  pub const fn as_free(self) -> Self {
    Self(self.0 | 1)
  }

  /// Same size, flag cleared.
  #[inline]
  pub const fn as_allocated(self) -> Self {
    Self(self.0 & !1)
  }
}

impl fmt::Debug for Tag {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Tag")
      .field("size", &self.size())
      .field("is_free", &self.is_free())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::{MIN_BLOCK_SIZE, WORD_SIZE};

  #[test]
  fn test_encode_decode() {
    for size in [MIN_BLOCK_SIZE, 48, 4096, 5 * 1024 * 1024] {
      let free = Tag::encode(size, true);
      assert_eq!(free.size(), size);
      assert!(free.is_free());

      let used = Tag::encode(size, false);
      assert_eq!(used.size(), size);
      assert!(!used.is_free());
    }
  }

  #[test]
  fn test_flag_lives_in_lowest_bit() {
    let tag = Tag::encode(WORD_SIZE * 4, true);

    assert_eq!(tag.raw() & 1, 1);
    assert_eq!(tag.raw() >> 1, WORD_SIZE * 4);
    assert_eq!(Tag::from_raw(tag.raw()), tag);
  }

  #[test]
  fn test_flip_flag_keeps_size() {
    let tag = Tag::encode(64, false);

    assert_eq!(tag.as_free(), Tag::encode(64, true));
    assert_eq!(tag.as_free().as_allocated(), tag);
    assert_eq!(tag.as_allocated(), tag);
  }
}
