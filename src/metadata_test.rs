use super::*;
use crate::{node::IndexEntry, roots::RootsTree, types::MvSeparator};

fn sample_roots() -> RootsTree<u64> {
    let mut roots = RootsTree::new();
    roots
        .install_new_root(
            1,
            IndexEntry {
                child_id: 7,
                mv_separator: MvSeparator { lifespan: Lifespan::from(1), key: 100 },
                weight_alive: 3,
                weight_total: 3,
            },
        )
        .unwrap();
    roots
}

fn temp_path(name: &str) -> String {
    format!("{}/mvbt_meta_test_{}_{}.json", std::env::temp_dir().display(), std::process::id(), name)
}

#[test]
fn test_save_then_load_round_trips() {
    let path = temp_path("roundtrip");
    let roots = sample_roots();
    let meta = Metadata::new("t1".to_string(), 4096, 5, Some(KeyRange::new(1u64, 100u64)), &roots);
    save(&path, &meta).unwrap();

    let loaded: Metadata<u64> = load(&path).unwrap();
    assert_eq!(loaded.v_current, 5);
    assert_eq!(loaded.key_range(), Some(KeyRange::new(1u64, 100u64)));
    assert_eq!(loaded.roots_tree().current_root().unwrap().child_id, 7);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_missing_field_is_corrupt_metadata() {
    let path = temp_path("corrupt");
    std::fs::write(&path, r#"{"index_type": "MVBT"}"#).unwrap();

    let err = load::<u64>(&path).unwrap_err();
    assert!(matches!(err, Error::CorruptMetadata(..)));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = load::<u64>("/nonexistent/path/for/mvbt/meta.json").unwrap_err();
    assert!(matches!(err, Error::IoError(..)));
}
