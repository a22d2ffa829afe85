use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;

use crate::foundation::error::{EngineError, EngineResult};

/// Raw bytes and display name of a resolved asset.
#[derive(Debug)]
pub struct ResolvedAsset {
    /// Encoded file bytes (container, audio file or image).
    pub bytes: Vec<u8>,
    /// Human-readable name.
    pub display_name: String,
}

/// Maps asset identifiers to bytes.
///
/// Implementations return [`EngineError::AssetNotFound`] for unknown ids.
pub trait AssetResolver {
    /// Fetch the bytes of `id`.
    fn resolve_asset(&self, id: &str) -> EngineResult<ResolvedAsset>;
}

/// Persists finished artifacts.
pub trait ResultPublisher {
    /// Store `bytes` under `name` and return a new identifier usable by the sibling resolver.
    fn publish_result(&self, bytes: Vec<u8>, name: &str, mime_type: &str) -> EngineResult<String>;
}

#[derive(Debug)]
struct StoredAsset {
    bytes: Vec<u8>,
    display_name: String,
    mime_type: Option<String>,
}

/// In-memory resolver and publisher.
///
/// Published outputs are keyed by `out-<xxh3 of the bytes>` and resolve like any other asset.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: Mutex<HashMap<String, StoredAsset>>,
}

impl InMemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an asset.
    pub fn insert(&self, id: impl Into<String>, display_name: impl Into<String>, bytes: Vec<u8>) {
        let mut assets = self.lock();
        assets.insert(
            id.into(),
            StoredAsset {
                bytes,
                display_name: display_name.into(),
                mime_type: None,
            },
        );
    }

    /// Number of stored assets, published outputs included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// MIME type recorded for a published output.
    pub fn mime_type(&self, id: &str) -> Option<String> {
        self.lock().get(id).and_then(|a| a.mime_type.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredAsset>> {
        // A poisoned map is still structurally valid.
        self.assets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AssetResolver for InMemoryAssetStore {
    fn resolve_asset(&self, id: &str) -> EngineResult<ResolvedAsset> {
        let assets = self.lock();
        let a = assets
            .get(id)
            .ok_or_else(|| EngineError::asset_not_found(id))?;
        Ok(ResolvedAsset {
            bytes: a.bytes.clone(),
            display_name: a.display_name.clone(),
        })
    }
}

impl ResultPublisher for InMemoryAssetStore {
    fn publish_result(&self, bytes: Vec<u8>, name: &str, mime_type: &str) -> EngineResult<String> {
        let id = format!("out-{:016x}", xxhash_rust::xxh3::xxh3_64(&bytes));
        let mut assets = self.lock();
        assets.insert(
            id.clone(),
            StoredAsset {
                bytes,
                display_name: name.to_string(),
                mime_type: Some(mime_type.to_string()),
            },
        );
        Ok(id)
    }
}

/// Filesystem-backed resolver: asset ids are paths relative to `root`.
///
/// Published outputs are written into `out_dir` and their id is the file name.
#[derive(Clone, Debug)]
pub struct DirAssetStore {
    root: PathBuf,
    out_dir: PathBuf,
}

impl DirAssetStore {
    /// Resolve from `root`, publish into `out_dir`.
    pub fn new(root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Absolute path for an asset id.
    pub fn path_for(&self, id: &str) -> EngineResult<PathBuf> {
        let rel = normalize_rel_path(id)?;
        Ok(self.root.join(Path::new(&rel)))
    }
}

impl AssetResolver for DirAssetStore {
    fn resolve_asset(&self, id: &str) -> EngineResult<ResolvedAsset> {
        let path = self.path_for(id).map_err(|_| EngineError::asset_not_found(id))?;
        if !path.is_file() {
            return Err(EngineError::asset_not_found(id));
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read asset '{}'", path.display()))?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string());
        Ok(ResolvedAsset {
            bytes,
            display_name,
        })
    }
}

impl ResultPublisher for DirAssetStore {
    fn publish_result(&self, bytes: Vec<u8>, name: &str, _mime_type: &str) -> EngineResult<String> {
        let file_name = normalize_rel_path(name)
            .map_err(|e| EngineError::publish(format!("invalid output name '{name}': {e}")))?;
        let path = self.out_dir.join(&file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
        }
        std::fs::write(&path, bytes)
            .map_err(|e| EngineError::publish(format!("failed to write '{}': {e}", path.display())))?;
        Ok(file_name)
    }
}

/// Normalize and validate store-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> EngineResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(EngineError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(EngineError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(EngineError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(EngineError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
