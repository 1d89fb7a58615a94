//! A separate-chaining hash table keyed by strings.
//!
//! Every bucket heads a singly linked [`Chain`] of entries. Buckets are
//! picked by summing the key's code points modulo the bucket count, and
//! the table doubles its bucket count whenever an insert finds the load
//! factor at or above 0.7.
//!
//! ```
//! use hashtable::{HashTable, KeyNotFound};
//!
//! let mut t = HashTable::new();
//! t.insert("ab", 1);
//! t.insert("ba", 2); // same bucket as "ab"
//!
//! assert_eq!(t.read("ab"), Some(&1));
//! assert_eq!(t.read("ba"), Some(&2));
//! assert_eq!(t.delete("ab"), Ok(()));
//! assert_eq!(t.delete("ab"), Err(KeyNotFound));
//! ```
pub mod chain;
mod macros;
mod table;

use thiserror::Error;

pub use chain::{Chain, Entry};
pub use table::{DEFAULT_BUCKET_SIZE, HashTable, Iter};

/// Returned by [`HashTable::delete`] when the key is not stored
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Key not found")]
pub struct KeyNotFound;
