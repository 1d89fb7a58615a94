use std::collections::HashMap;

use hashtable::{HashTable, KeyNotFound};
use proptest::prelude::*;

// Drive HashTable and std's HashMap with the same operations and compare.
proptest! {
    #[test]
    fn prop_matches_std_hashmap(
        initial in 1usize..=16,
        ops in proptest::collection::vec((0u8..=2u8, "[a-e]{0,3}", any::<i32>()), 1..300),
    ) {
        let mut t: HashTable<i32> = HashTable::with_buckets(initial);
        let mut model: HashMap<String, i32> = HashMap::new();
        let mut last_cap = t.capacity();

        for (op, key, value) in ops {
            match op {
                0 => {
                    t.insert(key.clone(), value);
                    model.insert(key.clone(), value);
                }
                1 => {
                    prop_assert_eq!(t.read(&key), model.get(&key));
                }
                2 => {
                    let expected = model.remove(&key).map(|_| ()).ok_or(KeyNotFound);
                    prop_assert_eq!(t.delete(&key), expected);
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(t.len(), model.len());
            prop_assert!(t.capacity() == last_cap || t.capacity() == last_cap * 2);
            last_cap = t.capacity();
        }

        for (k, v) in &model {
            prop_assert_eq!(t.read(k), Some(v));
        }
        prop_assert_eq!(t.iter().count(), model.len());
    }

    #[test]
    fn prop_permutations_collide(key in "[a-z]{1,8}") {
        let t: HashTable<()> = HashTable::new();
        let reversed: String = key.chars().rev().collect();
        prop_assert_eq!(HashTable::<()>::hash(&key), HashTable::<()>::hash(&reversed));
        prop_assert_eq!(t.bucket_index(&key), t.bucket_index(&reversed));
    }
}
