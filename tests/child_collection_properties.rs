use itemstate_core::{ChildNodeEntries, NodeId, QName};
use proptest::prelude::*;
use uuid::Uuid;

fn build(ids_and_names: &[(u64, String)]) -> ChildNodeEntries {
    let mut c = ChildNodeEntries::new();
    for (id, name) in ids_and_names {
        c.add(QName::unqualified(name.clone()), NodeId::Uuid(Uuid::from_u128(*id as u128)));
    }
    c
}

proptest! {
    /// Same-name-sibling indices are always a contiguous 1..=n run with no
    /// gaps, for every name group, after any sequence of adds.
    #[test]
    fn sns_indices_are_always_contiguous(entries in prop::collection::vec((0u64..50, "a|b|c"), 0..40)) {
        let deduped: Vec<(u64, String)> = {
            let mut seen = std::collections::HashSet::new();
            entries.into_iter().filter(|(id, _)| seen.insert(*id)).collect()
        };
        let collection = build(&deduped);

        let mut by_name: std::collections::HashMap<&str, Vec<u32>> = std::collections::HashMap::new();
        for (id, name) in &deduped {
            let index = collection.index_of(&NodeId::Uuid(Uuid::from_u128(*id as u128))).unwrap();
            by_name.entry(name.as_str()).or_default().push(index);
        }
        for (_, mut indices) in by_name {
            indices.sort_unstable();
            let expected: Vec<u32> = (1..=indices.len() as u32).collect();
            prop_assert_eq!(indices, expected);
        }
    }

    /// Removing any single entry, then re-adding an entry with the same name
    /// and id, always yields a collection with that id present and a valid
    /// (1-based, in-range) index for it.
    #[test]
    fn remove_then_readd_restores_a_valid_index(
        entries in prop::collection::vec((0u64..20, "a|b|c"), 1..20),
        target_idx in 0usize..20,
    ) {
        let deduped: Vec<(u64, String)> = {
            let mut seen = std::collections::HashSet::new();
            entries.into_iter().filter(|(id, _)| seen.insert(*id)).collect()
        };
        prop_assume!(!deduped.is_empty());
        let mut collection = build(&deduped);
        let (id, name) = deduped[target_idx % deduped.len()].clone();
        let node_id = NodeId::Uuid(Uuid::from_u128(id as u128));

        collection.remove_by_id(&node_id);
        collection.add(QName::unqualified(name), node_id.clone());

        let index = collection.index_of(&node_id).unwrap();
        prop_assert!(index >= 1);
    }

    /// `reordered_vs` is empty exactly when the relative order of the common
    /// (name, id) entries is identical between the two collections.
    #[test]
    fn reorder_is_empty_iff_common_order_matches(
        base in prop::collection::vec((0u64..10, "a|b|c"), 0..10),
        shuffle_seed in 0u64..1000,
    ) {
        let deduped: Vec<(u64, String)> = {
            let mut seen = std::collections::HashSet::new();
            base.into_iter().filter(|(id, _)| seen.insert(*id)).collect()
        };
        let overlayed = build(&deduped);

        let mut shuffled = deduped.clone();
        // deterministic pseudo-shuffle from the seed, no external randomness.
        for i in (1..shuffled.len()).rev() {
            let j = (shuffle_seed as usize).wrapping_mul(2654435761).wrapping_add(i) % (i + 1);
            shuffled.swap(i, j);
        }
        let current = build(&shuffled);

        let reordered = current.reordered_vs(&overlayed);
        let order_matches = deduped.iter().map(|(id, _)| *id).collect::<Vec<_>>()
            == shuffled.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        prop_assert_eq!(reordered.is_empty(), order_matches);
    }
}
