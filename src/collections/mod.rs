pub mod single_linked_list;

pub use single_linked_list::{
    Cursor, CursorMut, LinkedListError, LinkedListResult, ListCursor, SingleLinkedList,
};
