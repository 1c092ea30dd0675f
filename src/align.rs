use std::mem;

/// Size of a machine word. Every block size, payload offset and payload
/// length handed out by the pool is a multiple of this.
pub const WORD_SIZE: usize = mem::size_of::<usize>();

/// Size of one boundary tag. A tag is a single word.
pub const TAG_SIZE: usize = WORD_SIZE;

/// Smallest block the pool ever creates: two boundary tags plus the two
/// free list links (`next`, `prev`) a free block keeps in its payload.
///
/// ```text
///   +-----------+-----------+-----------+-----------+
///   |  header   |   next    |   prev    |  footer   |
///   +-----------+-----------+-----------+-----------+
///     TAG_SIZE    WORD_SIZE   WORD_SIZE   TAG_SIZE
/// ```
pub const MIN_BLOCK_SIZE: usize = 2 * TAG_SIZE + 2 * WORD_SIZE;

/// Rounds the given size up to the next machine word multiple.
///
/// Wraps on overflow, so callers working with untrusted sizes should use
/// [`checked_align`] instead.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use tagpool::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::WORD_SIZE - 1) & !($crate::align::WORD_SIZE - 1)
  };
}

/// Word alignment that reports overflow instead of wrapping.
#[inline]
pub fn checked_align(size: usize) -> Option<usize> {
  size
    .checked_add(WORD_SIZE - 1)
    .map(|padded| padded & !(WORD_SIZE - 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (WORD_SIZE * i + 1)..=(WORD_SIZE * (i + 1));

      let expected_alignment = WORD_SIZE * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
        assert_eq!(Some(expected), checked_align(size));
      }
    }
  }

  #[test]
  fn test_checked_align_overflow() {
    assert_eq!(checked_align(0), Some(0));
    assert_eq!(checked_align(usize::MAX), None);
    assert_eq!(checked_align(usize::MAX - WORD_SIZE + 2), None);
  }

  #[test]
  fn test_min_block_fits_links() {
    assert_eq!(MIN_BLOCK_SIZE % WORD_SIZE, 0);
    assert!(MIN_BLOCK_SIZE >= 2 * TAG_SIZE + 2 * mem::size_of::<usize>());
  }
}
