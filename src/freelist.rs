use crate::{
  align::{TAG_SIZE, WORD_SIZE},
  arena::Arena,
};

/// Link value meaning "no block".
const NIL: usize = usize::MAX;

/// Offset of the `next` link relative to the block start.
const NEXT: usize = TAG_SIZE;

/// Offset of the `prev` link relative to the block start.
const PREV: usize = TAG_SIZE + WORD_SIZE;

/// Explicit free list: a doubly linked list of every free block in the
/// arena, newest first.
///
/// The links live inside the free blocks themselves, in the first two words
/// of the payload, which nobody else is using while the block is free. They
/// hold arena offsets of block starts, not addresses:
///
/// ```text
///            head
///             |
///             v
///   +-----+------+------+----------+-----+
///   | tag | next | prev |   ...    | tag |   free block at offset A
///   +-----+--|---+------+----------+-----+
///            |     ^
///            v     |
///   +-----+------+-|----+----------+-----+
///   | tag | next | prev |   ...    | tag |   free block at offset B
///   +-----+------+------+----------+-----+
///             NIL
/// ```
///
/// The list is not sorted by address or size. Insertion happens at the head
/// and removal of any member is O(1) because both neighbors are known.
#[derive(Debug)]
pub(crate) struct FreeList {
  head: usize,
  len: usize,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: NIL, len: 0 }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  /// Offset of the most recently inserted free block.
  #[inline]
  pub fn head(&self) -> Option<usize> {
    link(self.head)
  }

  /// Inserts the block starting at `block` at the head of the list.
  pub fn push(
    &mut self,
    arena: &mut Arena,
    block: usize,
  ) {
    arena.write_word(block + NEXT, self.head);
    arena.write_word(block + PREV, NIL);

    if self.head != NIL {
      arena.write_word(self.head + PREV, block);
    }

    self.head = block;
    self.len += 1;
  }

  /// Unlinks `block`, which must currently be a member of the list.
  pub fn remove(
    &mut self,
    arena: &mut Arena,
    block: usize,
  ) {
    let next = arena.read_word(block + NEXT);
    let prev = arena.read_word(block + PREV);

    if prev == NIL {
      debug_assert_eq!(self.head, block, "block {block} is not in the free list");
      self.head = next;
    } else {
      arena.write_word(prev + NEXT, next);
    }

    if next != NIL {
      arena.write_word(next + PREV, prev);
    }

    self.len -= 1;
  }

  /// Walks the list from the head, yielding block offsets.
  pub fn iter<'a>(
    &self,
    arena: &'a Arena,
  ) -> Iter<'a> {
    Iter {
      arena,
      current: self.head,
    }
  }
}

pub(crate) struct Iter<'a> {
  arena: &'a Arena,
  current: usize,
}

impl Iterator for Iter<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<usize> {
    let block = link(self.current)?;
    self.current = self.arena.read_word(block + NEXT);
    Some(block)
  }
}

#[inline]
fn link(offset: usize) -> Option<usize> {
  (offset != NIL).then_some(offset)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::MIN_BLOCK_SIZE;

  fn blocks(
    list: &FreeList,
    arena: &Arena,
  ) -> Vec<usize> {
    list.iter(arena).collect()
  }

  #[test]
  fn test_push_is_lifo() {
    let mut arena = Arena::reserve(MIN_BLOCK_SIZE * 3).unwrap();
    let mut list = FreeList::new();

    assert_eq!(list.head(), None);

    for block in [0, MIN_BLOCK_SIZE, MIN_BLOCK_SIZE * 2] {
      list.push(&mut arena, block);
    }

    assert_eq!(list.len(), 3);
    assert_eq!(list.head(), Some(MIN_BLOCK_SIZE * 2));
    assert_eq!(blocks(&list, &arena), vec![MIN_BLOCK_SIZE * 2, MIN_BLOCK_SIZE, 0]);
  }

  #[test]
  fn test_remove_anywhere() {
    let mut arena = Arena::reserve(MIN_BLOCK_SIZE * 4).unwrap();
    let mut list = FreeList::new();
    let [a, b, c, d] = [0, 1, 2, 3].map(|i| i * MIN_BLOCK_SIZE);

    for block in [a, b, c, d] {
      list.push(&mut arena, block);
    }

    // Middle.
    list.remove(&mut arena, b);
    assert_eq!(blocks(&list, &arena), vec![d, c, a]);

    // Head.
    list.remove(&mut arena, d);
    assert_eq!(blocks(&list, &arena), vec![c, a]);

    // Tail.
    list.remove(&mut arena, a);
    assert_eq!(blocks(&list, &arena), vec![c]);

    list.remove(&mut arena, c);
    assert_eq!(list.len(), 0);
    assert_eq!(list.head(), None);
  }

  #[test]
  fn test_push_after_remove_relinks() {
    let mut arena = Arena::reserve(MIN_BLOCK_SIZE * 2).unwrap();
    let mut list = FreeList::new();

    list.push(&mut arena, 0);
    list.push(&mut arena, MIN_BLOCK_SIZE);
    list.remove(&mut arena, 0);
    list.push(&mut arena, 0);

    assert_eq!(blocks(&list, &arena), vec![0, MIN_BLOCK_SIZE]);
  }
}
