use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "no-std", not(test)))] {
        use alloc::boxed::Box;
    } else {
        use std::boxed::Box;
    }
}

pub type LinkedListResult<T> = Result<T, LinkedListError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkedListError {
    /// the cursor is at the end of the list and holds no value
    PastTheEnd,
    /// the cursor is at the sentinel, before the first element
    BeforeBegin,
    /// there is no element after the given position
    NothingToErase,
}

impl fmt::Display for LinkedListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PastTheEnd => f.write_str("cursor is past the end of the list"),
            Self::BeforeBegin => f.write_str("cursor is before the beginning of the list"),
            Self::NothingToErase => f.write_str("no element follows the given position"),
        }
    }
}

/// an edge to the next node, or the end of the list
type Link<T> = Option<NonNull<Node<T>>>;

/// an owning, singly-linked list with a permanent sentinel node in front of
/// the first element.
///
/// positions in the list are described by [`ListCursor`]s, which are plain
/// copyable handles that do not borrow the list. operations that dereference
/// a cursor are `unsafe` for that reason: the caller vouches that the cursor
/// came from this list and still references a linked node.
pub struct SingleLinkedList<T> {
    /// a sentinel node that always exists, even in empty lists. it is heap
    /// allocated so cursors to it survive moves of the list itself
    sentinel: NonNull<Node<T>>,
    /// the number of non-sentinel elements in the list
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

impl<T> SingleLinkedList<T> {
    /// create a new, empty SingleLinkedList
    pub fn new() -> Self {
        Self {
            sentinel: Node::alloc(Node::sentinel()),
            len: 0,
            _owns: PhantomData,
        }
    }

    /// get the length of the list, not including the sentinel node
    pub fn len(&self) -> usize {
        self.len
    }

    /// returns true if the length of the list is 0
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// a cursor to the sentinel. it may be advanced or passed to
    /// `insert_after`/`erase_after`, but it never holds a value
    pub fn before_begin(&mut self) -> CursorMut<T> {
        ListCursor::from_link(Some(self.sentinel))
    }

    /// read-only counterpart of [`Self::before_begin`]
    pub fn cbefore_begin(&self) -> Cursor<T> {
        ListCursor::from_link(Some(self.sentinel))
    }

    pub fn begin(&mut self) -> CursorMut<T> {
        ListCursor::from_link(self.head())
    }

    pub fn end(&mut self) -> CursorMut<T> {
        ListCursor::default()
    }

    pub fn cbegin(&self) -> Cursor<T> {
        ListCursor::from_link(self.head())
    }

    pub fn cend(&self) -> Cursor<T> {
        ListCursor::default()
    }

    /// immutably borrow the first element, or None if the list is empty
    pub fn front(&self) -> Option<&T> {
        self.iter().next()
    }

    /// mutably borrow the first element, or None if the list is empty
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.iter_mut().next()
    }

    /// insert `value` after the node referenced by `pos`, returning a cursor
    /// to the newly inserted element. `value` is already constructed by the
    /// time it reaches the list, so nothing is linked unless the whole
    /// insertion succeeds.
    ///
    /// # Panics
    /// if `pos` is the end cursor
    ///
    /// # Safety
    /// `pos` must reference the sentinel or an element of this list
    pub unsafe fn insert_after(&mut self, pos: impl Into<Cursor<T>>, value: T) -> CursorMut<T> {
        let pos: Cursor<T> = pos.into();
        let Some(prev) = pos.node else {
            panic!("cannot insert after the end of the list");
        };
        let prev = prev.as_ptr();

        let node = Node::alloc(Node::new(value, (*prev).next));
        (*prev).next = Some(node);
        self.len += 1;
        ListCursor::from_link(Some(node))
    }

    /// like [`Self::insert_after`], but the value is produced by `make`. if
    /// `make` fails the list is left exactly as it was and the error is
    /// returned to the caller.
    ///
    /// # Safety
    /// `pos` must reference the sentinel or an element of this list
    pub unsafe fn try_insert_after_with<E, F>(
        &mut self,
        pos: impl Into<Cursor<T>>,
        make: F,
    ) -> Result<CursorMut<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let pos: Cursor<T> = pos.into();
        let value = make()?;
        Ok(self.insert_after(pos, value))
    }

    /// remove and drop the element following `pos`, returning a cursor to
    /// the element after the removed one (the end cursor if it was last)
    ///
    /// # Panics
    /// if `pos` is the end cursor or the last element
    ///
    /// # Safety
    /// `pos` must reference the sentinel or an element of this list
    pub unsafe fn erase_after(&mut self, pos: impl Into<Cursor<T>>) -> CursorMut<T> {
        let pos: Cursor<T> = pos.into();
        let Some(prev) = pos.node else {
            panic!("cannot erase after the end of the list");
        };
        assert!(
            (*prev.as_ptr()).next.is_some(),
            "cannot erase after the last element of the list"
        );

        let removed = self.unlink_after(prev);
        let next = (*prev.as_ptr()).next;
        drop(removed);
        ListCursor::from_link(next)
    }

    /// checked variant of [`Self::erase_after`]
    ///
    /// # Safety
    /// `pos` must be the end cursor, the sentinel or an element of this list
    pub unsafe fn try_erase_after(
        &mut self,
        pos: impl Into<Cursor<T>>,
    ) -> LinkedListResult<CursorMut<T>> {
        let pos: Cursor<T> = pos.into();
        let Some(prev) = pos.node else {
            return Err(LinkedListError::PastTheEnd);
        };
        if (*prev.as_ptr()).next.is_none() {
            return Err(LinkedListError::NothingToErase);
        }
        Ok(self.erase_after(pos))
    }

    /// push a value to the front of this list
    pub fn push_front(&mut self, value: T) {
        // SAFETY: the sentinel always belongs to this list
        unsafe {
            self.insert_after(self.cbefore_begin(), value);
        }
    }

    /// pop a value from the front of this list. if the list is empty nothing
    /// happens and None is returned
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the sentinel has a successor
        let node = unsafe { self.unlink_after(self.sentinel) };
        node.into_data()
    }

    /// drop every element, leaving only the sentinel
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// exchange the contents of two lists without touching any element.
    /// each list keeps its own sentinel, so `before_begin` cursors stay
    /// with the list they were taken from
    pub fn swap(&mut self, other: &mut Self) {
        // SAFETY: both sentinels are live and distinct
        unsafe {
            core::mem::swap(
                &mut (*self.sentinel.as_ptr()).next,
                &mut (*other.sentinel.as_ptr()).next,
            );
        }
        core::mem::swap(&mut self.len, &mut other.len);
    }

    /// immutably borrow the value at `pos`
    ///
    /// # Safety
    /// `pos` must be the end cursor, the sentinel or an element of this list
    pub unsafe fn get(&self, pos: impl Into<Cursor<T>>) -> LinkedListResult<&T> {
        let pos: Cursor<T> = pos.into();
        let ptr = pos.as_ptr()?;
        Ok(&*ptr)
    }

    /// mutably borrow the value at `pos`
    ///
    /// # Safety
    /// `pos` must be the end cursor, the sentinel or an element of this list
    pub unsafe fn get_mut(&mut self, pos: CursorMut<T>) -> LinkedListResult<&mut T> {
        let ptr = pos.as_mut_ptr()?;
        Ok(&mut *ptr)
    }

    /// copy the list element by element through a fallible `copy`. the first
    /// error is returned and the partial copy is released; `self` is never
    /// modified
    pub fn try_clone_with<E, F>(&self, copy: F) -> Result<Self, E>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        self.iter().map(copy).collect()
    }

    /// replace the contents of `self` with a copy of `source` made through
    /// `copy`. the copy is built in full before it is swapped in, so on error
    /// `self` is untouched
    pub fn try_clone_from_with<E, F>(&mut self, source: &Self, copy: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut replacement = source.try_clone_with(copy)?;
        self.swap(&mut replacement);
        Ok(())
    }

    /// return an immutable iterator for this list
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            curr: self.head(),
            remaining: self.len,
            _ll: PhantomData,
        }
    }

    /// return a mutable iterator for this list
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            curr: self.head(),
            remaining: self.len,
            _ll: PhantomData,
        }
    }

    fn head(&self) -> Link<T> {
        // SAFETY: the sentinel lives as long as the list
        unsafe { self.sentinel.as_ref().next }
    }

    /// the last node in the list, or the sentinel if the list is empty
    fn last_node(&self) -> NonNull<Node<T>> {
        let mut curr = self.sentinel;
        // SAFETY: every link reachable from the sentinel is a node owned by us
        unsafe {
            while let Some(next) = curr.as_ref().next {
                curr = next;
            }
        }
        curr
    }

    /// detach the node following `prev` and hand ownership of it back
    /// # Safety
    /// `prev` must be a node of this list with a successor
    unsafe fn unlink_after(&mut self, prev: NonNull<Node<T>>) -> Box<Node<T>> {
        let prev = prev.as_ptr();
        let Some(victim) = (*prev).next else {
            unreachable!("unlink_after is only called on nodes with a successor");
        };
        let mut removed = Node::reclaim(victim);
        (*prev).next = removed.next.take();
        self.len -= 1;
        removed
    }
}

impl<T> Default for SingleLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SingleLinkedList<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinel was allocated in `new` and is only freed here
        drop(unsafe { Node::reclaim(self.sentinel) });
    }
}

unsafe impl<T: Send> Send for SingleLinkedList<T> {}
unsafe impl<T: Sync> Sync for SingleLinkedList<T> {}

impl<T: Clone> Clone for SingleLinkedList<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }

    /// copy-and-swap: a panicking `T::clone` leaves `self` unchanged
    fn clone_from(&mut self, source: &Self) {
        let mut replacement = source.clone();
        self.swap(&mut replacement);
    }
}

impl<T> Extend<T> for SingleLinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let mut tail: Cursor<T> = ListCursor::from_link(Some(self.last_node()));
        for value in iter {
            // SAFETY: `tail` is always the sentinel or the last node of this list
            tail = unsafe { self.insert_after(tail, value) }.into();
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for SingleLinkedList<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for SingleLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for SingleLinkedList<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: PartialEq> PartialEq for SingleLinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for SingleLinkedList<T> {}

impl<T: PartialOrd> PartialOrd for SingleLinkedList<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for SingleLinkedList<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for SingleLinkedList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SingleLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// exchange the contents of two lists, see [`SingleLinkedList::swap`]
pub fn swap<T>(lhs: &mut SingleLinkedList<T>, rhs: &mut SingleLinkedList<T>) {
    lhs.swap(rhs);
}

/// a cell of the list. only the sentinel is created without data
///
/// every node is created by [`Node::alloc`] and released by
/// [`Node::reclaim`]; nothing else touches the allocator
struct Node<T> {
    internal: InternalNode<T>,
    next: Link<T>,
}

enum InternalNode<T> {
    Sentinel,
    Data(T),
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            internal: InternalNode::Sentinel,
            next: None,
        }
    }

    fn new(data: T, next: Link<T>) -> Self {
        Self {
            internal: InternalNode::Data(data),
            next,
        }
    }

    /// move `node` to the heap and give up ownership of it to the list
    fn alloc(node: Self) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(node)))
    }

    /// take ownership of a node back from the list
    /// # Safety
    /// `node` must come from [`Node::alloc`] and be unlinked, and no other
    /// `reclaim` may be made for it
    unsafe fn reclaim(node: NonNull<Self>) -> Box<Self> {
        Box::from_raw(node.as_ptr())
    }

    fn data(&self) -> Option<&T> {
        match &self.internal {
            InternalNode::Sentinel => None,
            InternalNode::Data(data) => Some(data),
        }
    }

    fn data_mut(&mut self) -> Option<&mut T> {
        match &mut self.internal {
            InternalNode::Sentinel => None,
            InternalNode::Data(data) => Some(data),
        }
    }

    fn into_data(self: Box<Self>) -> Option<T> {
        match self.internal {
            InternalNode::Sentinel => None,
            InternalNode::Data(data) => Some(data),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// the access a [`ListCursor`] grants to the value it references
pub trait Access: sealed::Sealed {}

/// marker for cursors that only read
#[derive(Debug)]
pub enum ReadOnly {}

/// marker for cursors that may also write
#[derive(Debug)]
pub enum ReadWrite {}

impl sealed::Sealed for ReadOnly {}
impl sealed::Sealed for ReadWrite {}
impl Access for ReadOnly {}
impl Access for ReadWrite {}

/// read-only position in a [`SingleLinkedList`]
pub type Cursor<T> = ListCursor<T, ReadOnly>;

/// read-write position in a [`SingleLinkedList`]
pub type CursorMut<T> = ListCursor<T, ReadWrite>;

/// a non-owning position in a [`SingleLinkedList`]: the sentinel, an
/// element, or the end of the list.
///
/// cursors are cheap to copy and compare equal when they reference the same
/// node, regardless of their access kind. a cursor is invalidated when the
/// node it references is removed or the list is dropped.
pub struct ListCursor<T, A: Access> {
    node: Link<T>,
    _access: PhantomData<A>,
}

impl<T, A: Access> ListCursor<T, A> {
    fn from_link(node: Link<T>) -> Self {
        Self {
            node,
            _access: PhantomData,
        }
    }

    /// returns true if the cursor is past the last element
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// a read-only copy of this cursor
    pub fn as_const(&self) -> Cursor<T> {
        ListCursor::from_link(self.node)
    }

    /// move the cursor forward one element
    ///
    /// # Panics
    /// if the cursor is already at the end
    ///
    /// # Safety
    /// the referenced node must still be linked into a live list
    pub unsafe fn move_next(&mut self) {
        let Some(node) = self.node else {
            panic!("cannot advance past the end of the list");
        };
        self.node = node.as_ref().next;
    }

    /// move the cursor forward one element, returning where it was
    ///
    /// # Safety
    /// see [`Self::move_next`]
    pub unsafe fn step(&mut self) -> Self {
        let prev = *self;
        self.move_next();
        prev
    }

    /// a copy of this cursor advanced by one element
    ///
    /// # Safety
    /// see [`Self::move_next`]
    pub unsafe fn next_pos(mut self) -> Self {
        self.move_next();
        self
    }

    /// the address of the referenced value
    ///
    /// # Safety
    /// the cursor must be at the end or reference a node still linked into a
    /// live list
    pub unsafe fn as_ptr(&self) -> LinkedListResult<*const T> {
        let Some(node) = self.node else {
            return Err(LinkedListError::PastTheEnd);
        };
        (*node.as_ptr())
            .data()
            .map(|data| data as *const T)
            .ok_or(LinkedListError::BeforeBegin)
    }
}

impl<T> ListCursor<T, ReadWrite> {
    /// the mutable address of the referenced value
    ///
    /// # Safety
    /// see [`ListCursor::as_ptr`]
    pub unsafe fn as_mut_ptr(&self) -> LinkedListResult<*mut T> {
        let Some(node) = self.node else {
            return Err(LinkedListError::PastTheEnd);
        };
        (*node.as_ptr())
            .data_mut()
            .map(|data| data as *mut T)
            .ok_or(LinkedListError::BeforeBegin)
    }
}

impl<T, A: Access> Clone for ListCursor<T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: Access> Copy for ListCursor<T, A> {}

impl<T, A: Access> Default for ListCursor<T, A> {
    fn default() -> Self {
        Self::from_link(None)
    }
}

impl<T, A: Access, B: Access> PartialEq<ListCursor<T, B>> for ListCursor<T, A> {
    fn eq(&self, other: &ListCursor<T, B>) -> bool {
        self.node == other.node
    }
}

impl<T, A: Access> Eq for ListCursor<T, A> {}

impl<T> From<CursorMut<T>> for Cursor<T> {
    fn from(cursor: CursorMut<T>) -> Self {
        cursor.as_const()
    }
}

impl<T, A: Access> fmt::Debug for ListCursor<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCursor")
            .field("node", &self.node)
            .finish()
    }
}

pub struct Iter<'a, T> {
    curr: Link<T>,
    remaining: usize,
    _ll: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.curr?;

        // SAFETY: `node` is linked into a list that is borrowed for 'a
        unsafe {
            let node = &*node.as_ptr();
            self.curr = node.next;
            self.remaining -= 1;
            node.data()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            curr: self.curr,
            remaining: self.remaining,
            _ll: PhantomData,
        }
    }
}

unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

pub struct IterMut<'a, T> {
    curr: Link<T>,
    remaining: usize,
    _ll: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.curr?;

        // SAFETY: `node` is linked into a list that is mutably borrowed for
        // 'a, and every node is yielded at most once
        unsafe {
            let node = &mut *node.as_ptr();
            self.curr = node.next;
            self.remaining -= 1;
            node.data_mut()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

pub struct IntoIter<T> {
    list: SingleLinkedList<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for SingleLinkedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { list: self }
    }
}

impl<'a, T> IntoIterator for &'a SingleLinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SingleLinkedList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}


#[cfg(test)]
mod iter_test {
    use super::*;

    #[test]
    fn basic_iter_test() {
        let ll = SingleLinkedList::from([42, 73, 1]);
        let mut iter = ll.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(&42));
        assert_eq!(iter.next(), Some(&73));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn iter_on_empty_list_returns_none() {
        let ll = SingleLinkedList::<u32>::new();
        assert!(ll.iter().next().is_none());
    }

    #[test]
    fn independent_iterators_do_not_interfere() {
        let ll = SingleLinkedList::from([1, 2, 3]);
        let mut first = ll.iter();
        first.next();
        let second = first.clone();
        assert_eq!(first.copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(second.copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(ll.iter().count(), ll.len());
    }

    #[test]
    fn basic_iter_mut_test() {
        let mut ll = SingleLinkedList::from([42, 73]);
        for v in ll.iter_mut() {
            *v += 1;
        }
        for v in &mut ll {
            *v *= 2;
        }
        assert_eq!(ll, SingleLinkedList::from([86, 148]));
    }

    #[test]
    fn into_iter_yields_owned_values_in_order() {
        let ll = SingleLinkedList::from([String::from("a"), String::from("b")]);
        let mut iter = ll.into_iter();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next().as_deref(), Some("a"));
        assert_eq!(iter.next().as_deref(), Some("b"));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn partially_consumed_into_iter_drops_the_rest() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counted(Rc<Cell<usize>>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let ll: SingleLinkedList<Counted> = (0..4).map(|_| Counted(drops.clone())).collect();
        let mut iter = ll.into_iter();
        drop(iter.next());
        assert_eq!(drops.get(), 1);
        drop(iter);
        assert_eq!(drops.get(), 4);
    }
}

#[cfg(test)]
mod cursor_tests {
    use super::*;

    #[test]
    fn default_cursor_is_end() {
        let cursor = Cursor::<u32>::default();
        assert!(cursor.is_end());
        let ll = SingleLinkedList::<u32>::from([1]);
        assert_eq!(cursor, ll.cend());
        assert_ne!(cursor, ll.cbegin());
    }

    #[test]
    fn cursor_kinds_compare_with_each_other() {
        let mut ll = SingleLinkedList::from([1, 2]);
        let rw = ll.begin();
        let ro = ll.cbegin();
        assert_eq!(rw, ro);
        assert_eq!(ro, rw);
        assert_eq!(Cursor::<i32>::from(rw), ro);
        assert_eq!(rw.as_const(), ro);
        assert_ne!(rw, ll.cbefore_begin());
    }

    #[test]
    fn cursor_walk_matches_len() {
        let ll = SingleLinkedList::from([5, 6, 7, 8]);
        let mut cursor = ll.cbegin();
        let mut steps = 0;
        while cursor != ll.cend() {
            unsafe { cursor.move_next() };
            steps += 1;
        }
        assert_eq!(steps, ll.len());
    }

    #[test]
    fn step_returns_previous_position() {
        unsafe {
            let ll = SingleLinkedList::from([1, 2]);
            let mut cursor = ll.cbegin();
            let prev = cursor.step();
            assert_eq!(prev, ll.cbegin());
            assert_eq!(ll.get(cursor), Ok(&2));
            assert_eq!(ll.cbegin().next_pos(), cursor);
        }
    }

    #[test]
    fn get_on_sentinel_and_end_is_checked() {
        unsafe {
            let mut ll = SingleLinkedList::from([1]);
            assert_eq!(ll.get(ll.cbefore_begin()), Err(LinkedListError::BeforeBegin));
            assert_eq!(ll.get(ll.cend()), Err(LinkedListError::PastTheEnd));
            let end = ll.end();
            assert!(matches!(ll.get_mut(end), Err(LinkedListError::PastTheEnd)));
            let before_begin = ll.before_begin();
            assert!(matches!(
                ll.get_mut(before_begin),
                Err(LinkedListError::BeforeBegin)
            ));
        }
    }

    #[test]
    fn cursor_can_mutate_elements() {
        unsafe {
            let mut ll = SingleLinkedList::from([42, 73]);
            let first = ll.begin();
            *ll.get_mut(first).unwrap() += 1;
            *first.as_mut_ptr().unwrap() += 1;
            let second = first.next_pos();
            *ll.get_mut(second).unwrap() += 1;
            assert_eq!(ll, SingleLinkedList::from([44, 74]));
            assert_eq!(*ll.cbegin().as_ptr().unwrap(), 44);
        }
    }

    #[test]
    fn insert_after_end_panics() {
        let res = std::panic::catch_unwind(|| {
            let mut ll = SingleLinkedList::from([1]);
            unsafe { ll.insert_after(ll.cend(), 2) };
        });
        assert!(res.is_err());
    }

    #[test]
    fn advancing_end_cursor_panics() {
        let res = std::panic::catch_unwind(|| {
            let mut cursor = Cursor::<u32>::default();
            unsafe { cursor.move_next() };
        });
        assert!(res.is_err());
    }

    #[test]
    fn try_erase_after_reports_missing_successor() {
        unsafe {
            let mut ll = SingleLinkedList::from([1, 2]);
            let last = ll.cbegin().next_pos();
            assert_eq!(ll.try_erase_after(last), Err(LinkedListError::NothingToErase));
            assert_eq!(ll.try_erase_after(ll.cend()), Err(LinkedListError::PastTheEnd));
            assert_eq!(ll.len(), 2);

            let next = ll.try_erase_after(ll.cbegin()).expect("failed to erase");
            assert_eq!(next, ll.cend());
            assert_eq!(ll, SingleLinkedList::from([1]));
        }
    }

    #[test]
    fn erasing_elsewhere_keeps_other_cursors_valid() {
        unsafe {
            let mut ll = SingleLinkedList::from([1, 2, 3, 4]);
            let before_begin = ll.cbefore_begin();
            let fourth = ll.cbegin().next_pos().next_pos().next_pos();

            ll.erase_after(ll.cbegin());
            ll.erase_after(before_begin);

            assert_eq!(ll.get(fourth), Ok(&4));
            assert_eq!(before_begin.next_pos(), ll.cbegin());
            assert_eq!(ll, SingleLinkedList::from([3, 4]));
        }
    }

    #[test]
    fn insert_then_erase_through_returned_cursors() {
        unsafe {
            let mut ll = SingleLinkedList::new();
            let mut pos = ll.before_begin();
            for i in 0..5 {
                pos = ll.insert_after(pos, i);
            }
            assert_eq!(ll, SingleLinkedList::from([0, 1, 2, 3, 4]));
            assert_eq!(pos.next_pos(), ll.end());

            while !ll.is_empty() {
                let next = ll.erase_after(ll.cbefore_begin());
                assert_eq!(next, ll.begin());
            }
            assert_eq!(ll.len(), 0);
            assert_eq!(ll.cbegin(), ll.cend());
        }
    }
}


// proptest doesn't run under miri with default config
#[cfg(all(not(miri), test))]
mod proptests {
    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest::test_runner::Config;
    use proptest_state_machine::{ReferenceStateMachine, StateMachineTest};

    use super::*;

    proptest_state_machine::prop_state_machine! {
        #![proptest_config(Config {
            failure_persistence: None,
            .. Config::default()
        })]

        #[test]
        fn single_linked_list_state_machine_test(
            sequential
            100..500
            =>
            SingleLinkedList<u32>
        );
    }

    #[derive(Clone, Debug)]
    pub enum Transition {
        PushFront(u32),
        PopFront,
        /// insert after the nth position, where 0 is the sentinel
        InsertAfter(usize, u32),
        /// erase after the nth position, where 0 is the sentinel
        EraseAfter(usize),
        Clear,
        /// move the contents into a fresh list through `swap`
        Swap,
        /// replace the list by a clone of itself
        CloneList,
    }

    pub struct SingleLinkedListStateMachine;

    impl ReferenceStateMachine for SingleLinkedListStateMachine {
        type State = Vec<u32>;
        type Transition = Transition;

        fn init_state() -> BoxedStrategy<Self::State> {
            Just(Vec::new()).boxed()
        }

        fn transitions(state: &Self::State) -> BoxedStrategy<Self::Transition> {
            let len = state.len();
            if len == 0 {
                prop_oneof![
                    1 => Just(Transition::PopFront),
                    2 => (any::<u32>()).prop_map(Transition::PushFront),
                    2 => (any::<u32>()).prop_map(|v| Transition::InsertAfter(0, v)),
                    1 => Just(Transition::Clear),
                ]
                .boxed()
            } else {
                prop_oneof![
                    1 => Just(Transition::PopFront),
                    2 => (any::<u32>()).prop_map(Transition::PushFront),
                    3 => (0..=len, any::<u32>()).prop_map(|(i, v)| Transition::InsertAfter(i, v)),
                    2 => (0..len).prop_map(Transition::EraseAfter),
                    1 => Just(Transition::Clear),
                    1 => Just(Transition::Swap),
                    1 => Just(Transition::CloneList),
                ]
                .boxed()
            }
        }

        fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
            match transition {
                Transition::PushFront(value) => state.insert(0, *value),
                Transition::PopFront => {
                    if !state.is_empty() {
                        state.remove(0);
                    }
                }
                Transition::InsertAfter(index, value) => state.insert(*index, *value),
                Transition::EraseAfter(index) => {
                    state.remove(*index);
                }
                Transition::Clear => state.clear(),
                Transition::Swap | Transition::CloneList => {}
            }
            state
        }

        fn preconditions(state: &Self::State, transition: &Self::Transition) -> bool {
            match transition {
                Transition::InsertAfter(index, _) => *index <= state.len(),
                Transition::EraseAfter(index) => *index < state.len(),
                _ => true,
            }
        }
    }

    /// a cursor to the nth position, where 0 is the sentinel
    pub(super) fn cursor_at(ll: &SingleLinkedList<u32>, index: usize) -> Cursor<u32> {
        let mut pos = ll.cbefore_begin();
        for _ in 0..index {
            unsafe { pos.move_next() };
        }
        pos
    }

    impl StateMachineTest for SingleLinkedList<u32> {
        type SystemUnderTest = Self;
        type Reference = SingleLinkedListStateMachine;

        fn init_test(
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) -> Self::SystemUnderTest {
            Self::new()
        }

        fn apply(
            mut state: Self::SystemUnderTest,
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
            transition: Transition,
        ) -> Self::SystemUnderTest {
            match transition {
                Transition::PushFront(value) => state.push_front(value),
                Transition::PopFront => {
                    state.pop_front();
                }
                Transition::InsertAfter(index, value) => {
                    let pos = cursor_at(&state, index);
                    let inserted = unsafe { state.insert_after(pos, value) };
                    assert_eq!(unsafe { state.get(inserted) }, Ok(&value));
                }
                Transition::EraseAfter(index) => {
                    let pos = cursor_at(&state, index);
                    let expected_next = unsafe { pos.next_pos().next_pos() };
                    let next = unsafe { state.erase_after(pos) };
                    assert_eq!(next, expected_next);
                }
                Transition::Clear => state.clear(),
                Transition::Swap => {
                    let mut other = SingleLinkedList::new();
                    other.swap(&mut state);
                    assert!(state.is_empty());
                    return other;
                }
                Transition::CloneList => {
                    let copy = state.clone();
                    assert_eq!(copy, state);
                    return copy;
                }
            }
            state
        }

        fn check_invariants(
            state: &Self::SystemUnderTest,
            ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) {
            assert_eq!(state.len(), ref_state.len());
            assert_eq!(state.is_empty(), ref_state.is_empty());
            assert!(state.iter().eq(ref_state.iter()));

            let mut steps = 0;
            let mut cursor = state.cbegin();
            while cursor != state.cend() {
                unsafe { cursor.move_next() };
                steps += 1;
            }
            assert_eq!(steps, state.len());
        }
    }

    proptest! {
        #[test]
        fn collecting_a_sequence_round_trips(values in vec(any::<u32>(), 0..256)) {
            let ll: SingleLinkedList<u32> = values.iter().copied().collect();
            prop_assert_eq!(ll.len(), values.len());
            prop_assert_eq!(ll.is_empty(), values.is_empty());
            prop_assert_eq!(ll.iter().copied().collect::<Vec<_>>(), values.clone());
            prop_assert_eq!(ll.into_iter().collect::<Vec<_>>(), values);
        }

        #[test]
        fn comparisons_agree_with_vec(
            lhs in vec(0u32..4, 0..8),
            rhs in vec(0u32..4, 0..8),
        ) {
            let a: SingleLinkedList<u32> = lhs.iter().copied().collect();
            let b: SingleLinkedList<u32> = rhs.iter().copied().collect();
            prop_assert_eq!(a == b, lhs == rhs);
            prop_assert_eq!(a.cmp(&b), lhs.cmp(&rhs));
            prop_assert_eq!(a.partial_cmp(&b), lhs.partial_cmp(&rhs));
        }

        #[test]
        fn extend_appends_after_existing_elements(
            head in vec(any::<u32>(), 0..32),
            tail in vec(any::<u32>(), 0..32),
        ) {
            let mut ll: SingleLinkedList<u32> = head.iter().copied().collect();
            ll.extend(tail.iter());

            let expected: Vec<u32> = head.iter().chain(tail.iter()).copied().collect();
            prop_assert_eq!(ll.len(), expected.len());
            prop_assert!(ll.iter().eq(expected.iter()));
        }
    }
}

#[cfg(all(not(miri), test))]
mod longform {
    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest_derive::Arbitrary;
    use rand::Rng;

    use super::proptests::cursor_at;
    use super::*;

    #[derive(Arbitrary, Debug)]
    enum Operation {
        PushFront(u32),
        PopFront,
        InsertAfter(u32),
        EraseAfter,
        Compare,
        Iterate,
    }

    fn random_position(len: usize) -> usize {
        rand::thread_rng().gen_range(0..=len)
    }

    proptest! {
        #[test]
        #[ignore]
        fn longform(ops in vec(any::<Operation>(), 2048)) {
            println!("Executing {} operations against SingleLinkedList", ops.len());

            let mut reference: Vec<u32> = Vec::new();
            let mut ll = SingleLinkedList::new();

            for op in ops.iter() {
                match op {
                    Operation::PushFront(i) => {
                        reference.insert(0, *i);
                        ll.push_front(*i);
                    }
                    Operation::PopFront => {
                        let expected = if reference.is_empty() {
                            None
                        } else {
                            Some(reference.remove(0))
                        };
                        assert_eq!(ll.pop_front(), expected);
                    }
                    Operation::InsertAfter(i) => {
                        let index = random_position(reference.len());
                        reference.insert(index, *i);
                        let pos = cursor_at(&ll, index);
                        let inserted = unsafe { ll.insert_after(pos, *i) };
                        assert_eq!(unsafe { ll.get(inserted) }, Ok(i));
                    }
                    Operation::EraseAfter => {
                        if reference.is_empty() {
                            continue;
                        }
                        let index = random_position(reference.len() - 1);
                        let expected = reference.remove(index);
                        let pos = cursor_at(&ll, index);
                        unsafe {
                            assert_eq!(ll.get(pos.next_pos()), Ok(&expected));
                            ll.erase_after(pos);
                        }
                    }
                    Operation::Compare => {
                        let rebuilt: SingleLinkedList<u32> = reference.iter().copied().collect();
                        assert_eq!(rebuilt, ll);
                        assert_eq!(rebuilt.cmp(&ll), Ordering::Equal);
                    }
                    Operation::Iterate => {
                        let mut ref_iter = reference.iter();
                        let mut ll_iter = ll.iter();
                        loop {
                            match (ref_iter.next(), ll_iter.next()) {
                                (Some(ref_next), Some(ll_next)) => assert_eq!(ref_next, ll_next),
                                (Some(ref_next), None) => panic!("Reference iter returned: {:?} but list iter returned None", ref_next),
                                (None, Some(ll_next)) => panic!("List iter returned: {:?} but reference iter returned None", ll_next),
                                (None, None) => break,
                            }
                        }
                    }
                }
                assert_eq!(ll.len(), reference.len());
            }

            println!("Successfully executed {} operations against SingleLinkedList", ops.len());
        }
    }
}
