#![cfg_attr(all(feature = "no-std", not(test)), no_std)]

#[cfg(all(feature = "no-std", not(test)))]
extern crate alloc;

pub mod collections;
