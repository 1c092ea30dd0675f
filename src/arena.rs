use std::{ptr::NonNull, slice};

use libc::{c_void, calloc, free};

use crate::{
  align::{TAG_SIZE, WORD_SIZE},
  tag::Tag,
};

/// The backing buffer of a pool.
///
/// One bulk reservation from the host allocator (`calloc(3)`), released in
/// one piece by `free(3)` when the arena is dropped. Everything above this
/// type addresses the buffer through byte offsets, never through raw
/// pointers, so no offset can outlive the buffer it points into.
///
/// ```text
///   base                                                   base + len
///   |                                                               |
///   v                                                               v
///   +------+----------------+------+------+--------------+------+---+
///   | tag  |    payload     | tag  | tag  |   payload    | tag  |...|
///   +------+----------------+------+------+--------------+------+---+
///   0      8                                                        len
/// ```
pub(crate) struct Arena {
  base: NonNull<u8>,
  len: usize,
}

impl Arena {
  /// Reserves `len` bytes. `len` must already be a non-zero word multiple.
  /// Returns `None` if the host allocator is out of memory.
  pub fn reserve(len: usize) -> Option<Self> {
    debug_assert!(len > 0 && len % WORD_SIZE == 0);

    // calloc(3) memory is aligned for any fundamental type, so every word
    // offset is word aligned as an address too. The buffer starts zeroed so
    // payload slices never expose uninitialized bytes; allocations made
    // later carry whatever the previous owner left behind.
    let base = unsafe { calloc(len, 1) } as *mut u8;

    NonNull::new(base).map(|base| Self { base, len })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn base_ptr(&self) -> NonNull<u8> {
    self.base
  }

  /// Address of `offset` inside the buffer.
  #[inline]
  pub fn ptr_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset <= self.len, "offset {offset} outside arena of {} bytes", self.len);
    unsafe { self.base.add(offset) }
  }

  #[inline]
  pub fn read_word(
    &self,
    offset: usize,
  ) -> usize {
    self.check_word(offset);
    unsafe { self.base.add(offset).cast::<usize>().read() }
  }

  #[inline]
  pub fn write_word(
    &mut self,
    offset: usize,
    value: usize,
  ) {
    self.check_word(offset);
    unsafe { self.base.add(offset).cast::<usize>().write(value) }
  }

  /// Reads the leading tag of the block starting at `offset`.
  #[inline]
  pub fn read_tag(
    &self,
    offset: usize,
  ) -> Tag {
    Tag::from_raw(self.read_word(offset))
  }

  /// Reads the trailing tag of the block that ends right before `end`.
  #[inline]
  pub fn read_footer(
    &self,
    end: usize,
  ) -> Tag {
    Tag::from_raw(self.read_word(end - TAG_SIZE))
  }

  /// Writes `tag` at both ends of the block starting at `offset`. The block
  /// extent is taken from the tag itself.
  #[inline]
  pub fn write_tags(
    &mut self,
    offset: usize,
    tag: Tag,
  ) {
    self.write_word(offset, tag.raw());
    self.write_word(offset + tag.size() - TAG_SIZE, tag.raw());
  }

  pub fn bytes(
    &self,
    offset: usize,
    len: usize,
  ) -> &[u8] {
    self.check_range(offset, len);
    unsafe { slice::from_raw_parts(self.base.add(offset).as_ptr(), len) }
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> &mut [u8] {
    self.check_range(offset, len);
    unsafe { slice::from_raw_parts_mut(self.base.add(offset).as_ptr(), len) }
  }

  #[inline]
  fn check_word(
    &self,
    offset: usize,
  ) {
    assert!(offset % WORD_SIZE == 0, "unaligned word offset {offset}");
    self.check_range(offset, WORD_SIZE);
  }

  #[inline]
  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) {
    assert!(
      offset.checked_add(len).is_some_and(|end| end <= self.len),
      "range {offset}+{len} outside arena of {} bytes",
      self.len
    );
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reserve_is_word_aligned() {
    let arena = Arena::reserve(WORD_SIZE * 16).unwrap();

    assert_eq!(arena.len(), WORD_SIZE * 16);
    assert_eq!(arena.base_ptr().as_ptr() as usize % WORD_SIZE, 0);
    assert_eq!(arena.ptr_at(WORD_SIZE).as_ptr() as usize % WORD_SIZE, 0);
  }

  #[test]
  fn test_words_and_tags() {
    let mut arena = Arena::reserve(WORD_SIZE * 8).unwrap();

    arena.write_word(WORD_SIZE, 0xDEAD);
    assert_eq!(arena.read_word(WORD_SIZE), 0xDEAD);

    let tag = Tag::encode(WORD_SIZE * 8, true);
    arena.write_tags(0, tag);

    assert_eq!(arena.read_tag(0), tag);
    assert_eq!(arena.read_footer(WORD_SIZE * 8), tag);
  }

  #[test]
  fn test_bytes_round_trip() {
    let mut arena = Arena::reserve(WORD_SIZE * 4).unwrap();

    arena.bytes_mut(WORD_SIZE, 3).copy_from_slice(&[1, 2, 3]);

    assert_eq!(arena.bytes(WORD_SIZE, 3), &[1, 2, 3]);
  }

  #[test]
  #[should_panic]
  fn test_out_of_bounds_word() {
    let arena = Arena::reserve(WORD_SIZE * 4).unwrap();
    arena.read_word(WORD_SIZE * 4);
  }
}
