use std::sync::{Mutex, MutexGuard, OnceLock};

use hashtable::HashTable;
use log::{info, warn};

/// The one table every connection reads and writes,
/// guarded as a whole for the length of each request
pub static MAP: OnceLock<Mutex<HashTable<String>>> = OnceLock::new();

/// Creates the shared table with `buckets` buckets.
///
/// Returns `false` if it already existed, in which case it is left alone.
pub fn init(buckets: usize) -> bool {
    let mut created = false;
    MAP.get_or_init(|| {
        created = true;
        Mutex::new(HashTable::with_buckets(buckets))
    });
    if created {
        info!(target: "storage", "table created with {buckets} buckets");
    } else {
        warn!(target: "storage", "table already created, ignoring {buckets} buckets");
    }
    created
}

/// Locks the shared table, creating it with default settings if needed
pub fn lock() -> MutexGuard<'static, HashTable<String>> {
    let map = MAP.get_or_init(|| Mutex::new(HashTable::new()));
    // requests are single table calls, a poisoned table is still consistent
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
