use super::*;

fn scratch_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "wavyte_reel_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn in_memory_store_resolves_and_reports_missing() {
    let store = InMemoryAssetStore::new();
    store.insert("v1", "clip.mp4", vec![1, 2, 3]);

    let a = store.resolve_asset("v1").unwrap();
    assert_eq!(a.bytes, vec![1, 2, 3]);
    assert_eq!(a.display_name, "clip.mp4");

    let err = store.resolve_asset("nope").unwrap_err();
    assert!(matches!(err, EngineError::AssetNotFound { ref asset_id } if asset_id == "nope"));
}

#[test]
fn in_memory_publish_is_content_addressed_and_resolvable() {
    let store = InMemoryAssetStore::new();
    let a = store.publish_result(vec![9, 9, 9], "a.mp4", "video/mp4").unwrap();
    let b = store.publish_result(vec![9, 9, 9], "b.mp4", "video/mp4").unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("out-"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.mime_type(&a).as_deref(), Some("video/mp4"));
    assert_eq!(store.resolve_asset(&a).unwrap().bytes, vec![9, 9, 9]);
}

#[test]
fn dir_store_reads_and_publishes() {
    let root = scratch_dir("dir_store");
    std::fs::create_dir_all(root.join("media")).unwrap();
    std::fs::write(root.join("media/clip.bin"), [7u8; 4]).unwrap();

    let store = DirAssetStore::new(&root, root.join("out"));
    let a = store.resolve_asset("media/clip.bin").unwrap();
    assert_eq!(a.bytes, vec![7u8; 4]);
    assert_eq!(a.display_name, "clip.bin");

    assert!(matches!(
        store.resolve_asset("media/missing.bin"),
        Err(EngineError::AssetNotFound { .. })
    ));
    assert!(matches!(
        store.resolve_asset("../escape.bin"),
        Err(EngineError::AssetNotFound { .. })
    ));

    let id = store.publish_result(vec![1, 2], "final.mp4", "video/mp4").unwrap();
    assert_eq!(id, "final.mp4");
    assert_eq!(std::fs::read(root.join("out/final.mp4")).unwrap(), vec![1, 2]);
    assert!(store.publish_result(vec![1], "../x.mp4", "video/mp4").is_err());

    let _ = std::fs::remove_dir_all(&root);
}
