//! Integration tests for the indexed map.

use std::sync::Arc;

use ark_bn254::Fr;
use ark_ff::{PrimeField, Zero};
use indexed_merkle_map::{EmptyHashes, IndexedMerkleMap, Leaf, MapError, PoseidonMap};
use rand::{rngs::StdRng, Rng, SeedableRng};
use zk_gadgets::{FieldHasher, PoseidonHasher};

/// Cheap non-cryptographic hasher so large trees stay fast.
#[derive(Clone, Default)]
struct SumHasher;

impl FieldHasher<Fr> for SumHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        inputs
            .iter()
            .enumerate()
            .fold(Fr::from(1u64), |acc, (i, x)| acc * Fr::from(7u64) + *x * Fr::from(i as u64 + 3))
    }
}

fn sum_map(height: usize) -> IndexedMerkleMap<Fr, SumHasher> {
    IndexedMerkleMap::with_empty_hashes(height, Arc::new(EmptyHashes::new(SumHasher))).unwrap()
}

/// Rebuild the root from the live leaves alone.
fn recompute_root<H: FieldHasher<Fr>>(map: &IndexedMerkleMap<Fr, H>, hasher: &H) -> Fr {
    let width = map.capacity() as usize;
    let mut level: Vec<Fr> = (0..width as u64)
        .map(|i| map.leaf(i).map_or(Fr::zero(), |leaf| leaf.hash(hasher)))
        .collect();
    while level.len() > 1 {
        level = level.chunks(2).map(|pair| hasher.hash(&[pair[0], pair[1]])).collect();
    }
    level[0]
}

/// Walk the list from its head and check it visits every key in order.
fn assert_sorted_list<H: FieldHasher<Fr>>(map: &IndexedMerkleMap<Fr, H>) {
    let entries: Vec<(u64, Leaf<Fr>)> = map.iter().map(|(i, l)| (i, *l)).collect();
    for pair in entries.windows(2) {
        let (_, a) = pair[0];
        let (b_index, b) = pair[1];
        assert!(a.key.into_bigint() < b.key.into_bigint());
        assert_eq!(a.next_key, b.key);
        assert_eq!(a.next_index, b_index);
    }
    if let Some((_, last)) = entries.last() {
        assert!(last.is_tail());
    }
}

#[test]
fn test_height_4_two_leaves() {
    let mut map = PoseidonMap::new(4).unwrap();
    let hasher = PoseidonHasher::<Fr>::default();

    map.insert(Fr::from(1u64), Fr::from(10u64)).unwrap();
    map.insert(Fr::from(2u64), Fr::from(20u64)).unwrap();

    let h0 = map.leaf(0).unwrap().hash(&hasher);
    let h1 = map.leaf(1).unwrap().hash(&hasher);
    let expected = hasher.hash(&[
        hasher.hash(&[hasher.hash(&[h0, h1]), map.empty(1)]),
        map.empty(2),
    ]);

    assert_eq!(map.root(), expected);
    assert_eq!(map.root(), recompute_root(&map, &hasher));
}

#[test]
fn test_root_matches_recomputation_after_mixed_operations() {
    let mut map = sum_map(7);
    let mut rng = StdRng::seed_from_u64(42);
    let mut keys: Vec<u64> = Vec::new();

    for step in 0..60u64 {
        match rng.gen_range(0..4) {
            0 | 1 => {
                let key = rng.gen_range(1..500u64);
                match map.insert(Fr::from(key), Fr::from(step)) {
                    Ok(_) => keys.push(key),
                    Err(MapError::KeyExists) => assert!(keys.contains(&key)),
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            2 if !keys.is_empty() => {
                let key = keys[rng.gen_range(0..keys.len())];
                map.update(Fr::from(key), Fr::from(step * 3)).unwrap();
            }
            3 if !keys.is_empty() => {
                let key = keys.swap_remove(rng.gen_range(0..keys.len()));
                map.remove(&Fr::from(key)).unwrap();
            }
            _ => {}
        }

        assert_eq!(map.root(), recompute_root(&map, &SumHasher));
        assert_sorted_list(&map);
        assert_eq!(map.len(), keys.len());
    }
}

#[test]
fn test_every_ancestor_matches_recomputation() {
    let mut map = sum_map(5);
    for key in [9u64, 2, 30, 14, 7] {
        map.insert(Fr::from(key), Fr::from(key + 100)).unwrap();
    }

    let mut level: Vec<Fr> = (0..map.capacity())
        .map(|i| map.get_node(0, i, false).unwrap())
        .collect();
    for depth in 1..map.height() {
        level = level.chunks(2).map(|p| SumHasher.hash(&[p[0], p[1]])).collect();
        for (i, expected) in level.iter().enumerate() {
            assert_eq!(map.get_node(depth, i as u64, false).unwrap(), *expected);
        }
    }
}

#[test]
fn test_fill_to_capacity() {
    let mut map = sum_map(4);
    for key in (1..=8u64).rev() {
        map.insert(Fr::from(key * 10), Fr::from(key)).unwrap();
    }
    assert_eq!(
        map.insert(Fr::from(5u64), Fr::from(0u64)),
        Err(MapError::Full { capacity: 8 })
    );
    assert_sorted_list(&map);

    // removed slots are not handed out again
    map.remove(&Fr::from(10u64)).unwrap();
    assert_eq!(
        map.insert(Fr::from(5u64), Fr::from(0u64)),
        Err(MapError::Full { capacity: 8 })
    );
}

#[test]
fn test_large_keys_order_by_integer() {
    let mut map = sum_map(5);
    let big = -Fr::from(1u64);
    map.insert(big, Fr::from(1u64)).unwrap();
    map.insert(Fr::from(3u64), Fr::from(2u64)).unwrap();

    let first = map.iter().next().unwrap().1;
    assert_eq!(first.key, Fr::from(3u64));
    assert_eq!(first.next_key, big);
    assert_sorted_list(&map);
}

#[test]
fn test_default_height_map() {
    let mut map = PoseidonMap::new(indexed_merkle_map::DEFAULT_HEIGHT).unwrap();
    map.set(Fr::from(5u64), Fr::from(6u64)).unwrap();

    let hasher = PoseidonHasher::<Fr>::default();
    let witness = map.membership_witness(&Fr::from(5u64)).unwrap();
    assert_eq!(witness.path.depth(), indexed_merkle_map::DEFAULT_HEIGHT - 1);
    assert!(witness
        .path
        .verify(&hasher, map.root(), witness.leaf.hash(&hasher)));
}
