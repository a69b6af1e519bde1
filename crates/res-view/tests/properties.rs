//! Property tests for loading and ordering containers.

mod common;

use std::io::{Cursor, Read};

use proptest::prelude::*;
use res_reader::ResourceValue;
use res_view::{NoResolver, ResourceSet, SaveFormat, export};

use common::container;

fn value_strategy() -> impl Strategy<Value = ResourceValue> {
    prop_oneof![
        ".{0,20}".prop_map(ResourceValue::String),
        any::<i32>().prop_map(ResourceValue::Int32),
        any::<bool>().prop_map(ResourceValue::Boolean),
        any::<u64>().prop_map(ResourceValue::UInt64),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(ResourceValue::ByteArray),
        Just(ResourceValue::Null),
    ]
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, ResourceValue)>> {
    prop::collection::vec(("[a-zA-Z0-9_.é]{0,12}", value_strategy()), 0..40)
}

/// Unique keys, so claimed and declined entries can be told apart by key.
fn unique_entries_strategy() -> impl Strategy<Value = Vec<(String, ResourceValue)>> {
    prop::collection::btree_map("[a-zA-Z0-9_.é]{1,12}", value_strategy(), 0..40)
        .prop_map(|m| m.into_iter().collect())
}

/// Claims byte arrays of even length.
fn even_blobs(key: &str, data: &mut Cursor<&[u8]>) -> Option<(String, usize)> {
    let mut buf = Vec::new();
    data.read_to_end(&mut buf).ok()?;
    (buf.len() % 2 == 0).then(|| (key.to_string(), buf.len()))
}

fn is_even_blob(value: &ResourceValue) -> bool {
    matches!(value, ResourceValue::ByteArray(b) if b.len() % 2 == 0)
}

fn build(entries: &[(String, ResourceValue)]) -> Vec<u8> {
    let borrowed: Vec<(&str, ResourceValue)> =
        entries.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    container(&borrowed)
}

fn keys<N>(set: &ResourceSet<N>) -> (Vec<&str>, Vec<&str>) {
    (
        set.text_entries.iter().map(|t| t.key.as_str()).collect(),
        set.complex_entries.iter().map(|c| c.key.as_str()).collect(),
    )
}

proptest! {
    /// Every record lands in exactly one group
    #[test]
    fn group_sizes_sum_to_record_count(entries in entries_strategy()) {
        let set = ResourceSet::load(Cursor::new(build(&entries)), &NoResolver);
        prop_assert_eq!(set.len(), entries.len());
        let strings = entries.iter().filter(|(_, v)| matches!(v, ResourceValue::String(_))).count();
        prop_assert_eq!(set.text_entries.len(), strings);
    }

    /// Each group is ordered by the bytes of its keys
    #[test]
    fn groups_are_sorted(entries in entries_strategy()) {
        let set = ResourceSet::load(Cursor::new(build(&entries)), &NoResolver);
        let (text, complex) = keys(&set);
        prop_assert!(text.windows(2).all(|w| w[0].as_bytes() <= w[1].as_bytes()));
        prop_assert!(complex.windows(2).all(|w| w[0].as_bytes() <= w[1].as_bytes()));
    }

    /// Loading the same bytes twice gives the same set
    #[test]
    fn load_is_deterministic(entries in entries_strategy()) {
        let bytes = build(&entries);
        let a = ResourceSet::load(Cursor::new(bytes.clone()), &NoResolver);
        let b = ResourceSet::load(Cursor::new(bytes), &NoResolver);
        prop_assert_eq!(a, b);
    }

    /// Claimed blobs become children and leave both tables
    #[test]
    fn claimed_blobs_become_children(entries in unique_entries_strategy()) {
        let bytes = build(&entries);
        let set = ResourceSet::load(Cursor::new(bytes.clone()), &even_blobs);
        prop_assert_eq!(
            set.text_entries.len() + set.complex_entries.len() + set.children.len(),
            entries.len()
        );

        let claimed: Vec<&str> = entries
            .iter()
            .filter(|(_, v)| is_even_blob(v))
            .map(|(k, _)| k.as_str())
            .collect();
        let children: Vec<&str> = set.children.iter().map(|(k, _)| k.as_str()).collect();
        prop_assert_eq!(&children, &claimed);

        let (text, complex) = keys(&set);
        for key in &claimed {
            prop_assert!(!text.contains(key));
            prop_assert!(!complex.contains(key));
        }
        let declined_blobs = set.complex_entries.iter().filter(|c| c.type_name == "System.Byte[]").count();
        let odd_blobs = entries
            .iter()
            .filter(|(_, v)| matches!(v, ResourceValue::ByteArray(_)) && !is_even_blob(v))
            .count();
        prop_assert_eq!(declined_blobs, odd_blobs);

        let again = ResourceSet::load(Cursor::new(bytes), &even_blobs);
        prop_assert_eq!(set, again);
    }

    /// Raw copy reproduces the input exactly
    #[test]
    fn raw_copy_is_identity(entries in entries_strategy()) {
        let bytes = build(&entries);
        let out = export(SaveFormat::RawCopy, Cursor::new(bytes.clone()), Vec::new()).unwrap();
        prop_assert_eq!(out, bytes);
    }

    /// Arbitrary input never panics and either loads or yields nothing
    #[test]
    fn arbitrary_bytes_do_not_panic(noise in prop::collection::vec(any::<u8>(), 0..256)) {
        let set = ResourceSet::load(Cursor::new(noise), &NoResolver);
        prop_assert!(set.len() < 256);
    }
}
