//! Property-based coverage of the Merkle tree's quantified invariants
//! (spec.md §8: hash stability, determinism, change-localization, symmetric
//! difference).

use code_index_engine::domain::hashing::hash_hex;
use code_index_engine::domain::merkle::MerkleTree;
use proptest::prelude::*;

fn arb_path_sha_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            "[a-z]{1,6}\\.py",
            prop::collection::vec(any::<u8>(), 1..32),
        ),
        1..12,
    )
    .prop_map(|entries| {
        let mut seen = std::collections::HashSet::new();
        entries
            .into_iter()
            .filter(|(path, _)| seen.insert(path.clone()))
            .map(|(path, bytes)| (path, hash_hex(&bytes)))
            .collect()
    })
}

proptest! {
    #[test]
    fn hash_hex_is_stable_across_calls(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(hash_hex(&bytes), hash_hex(&bytes));
    }

    #[test]
    fn build_is_deterministic_for_any_path_set(pairs in arb_path_sha_pairs()) {
        let mut sorted = pairs.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let t1 = MerkleTree::build(&sorted);
        let t2 = MerkleTree::build(&sorted);
        prop_assert_eq!(t1.root_hash(), t2.root_hash());
    }

    #[test]
    fn single_change_is_localized(pairs in arb_path_sha_pairs()) {
        prop_assume!(pairs.len() >= 2);
        let mut sorted = pairs;
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let old = MerkleTree::build(&sorted);

        let mut changed = sorted.clone();
        changed[0].1 = hash_hex(format!("mutated-{}", changed[0].1).as_bytes());
        let new = MerkleTree::build(&changed);

        let diff = MerkleTree::diff(&old, &new);
        prop_assert_eq!(diff.changed_paths, vec![sorted[0].0.clone()]);
        prop_assert!(diff.new_paths.is_empty());
        prop_assert!(diff.deleted_paths.is_empty());
    }
}
