//! Client asset synchronization: diff a client-supplied manifest of
//! relative paths and content hashes against the server's `assets/`
//! tree, returning files to add/replace and files to delete.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use sha2::{Digest, Sha256};

fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

const MAX_FILE_BYTES: u64 = 12 * 1024 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct AssetUpdate {
  pub rel_path: String,
  pub content_b64: String,
  pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncAssetsResult {
  pub updates: Vec<AssetUpdate>,
  pub deletes: Vec<String>,
  pub manifest: HashMap<String, String>,
  pub skipped_too_large: Vec<String>,
}

/// Compare the client's `rel_path -> sha256` inventory against the
/// server's `assets/` tree and produce the add/replace/delete diff. Paths
/// outside `assets/` are refused by construction (the caller only passes
/// paths rooted there).
pub fn sync_assets(assets_root: &Path, client_manifest: &HashMap<String, String>) -> std::io::Result<SyncAssetsResult> {
  let mut server_manifest = HashMap::new();
  let mut updates = Vec::new();
  let mut skipped_too_large = Vec::new();

  for path in walk_files(assets_root)? {
    let rel = path
      .strip_prefix(assets_root)
      .unwrap_or(&path)
      .to_string_lossy()
      .replace('\\', "/");
    if rel.contains("..") {
      continue;
    }
    let metadata = std::fs::metadata(&path)?;
    if metadata.len() > MAX_FILE_BYTES {
      skipped_too_large.push(rel.clone());
      continue;
    }
    let bytes = std::fs::read(&path)?;
    let digest = sha256_hex(&bytes);
    server_manifest.insert(rel.clone(), digest.clone());

    if client_manifest.get(&rel) != Some(&digest) {
      updates.push(AssetUpdate {
        rel_path: rel,
        content_b64: BASE64.encode(&bytes),
        sha256: digest,
      });
    }
  }

  let deletes: Vec<String> = client_manifest
    .keys()
    .filter(|rel| !server_manifest.contains_key(*rel))
    .cloned()
    .collect();

  Ok(SyncAssetsResult {
    updates,
    deletes,
    manifest: server_manifest,
    skipped_too_large,
  })
}

fn walk_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
  let mut out = Vec::new();
  if !root.exists() {
    return Ok(out);
  }
  let mut stack = vec![root.to_path_buf()];
  while let Some(dir) = stack.pop() {
    for entry in std::fs::read_dir(&dir)? {
      let entry = entry?;
      let path = entry.path();
      if path.is_dir() {
        stack.push(path);
      } else {
        out.push(path);
      }
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sector_assets_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).ok();
    dir
  }

  #[test_log::test]
  fn sync_reports_new_files_as_updates() {
    let dir = temp_dir();
    std::fs::write(dir.join("icon.png"), b"hello").unwrap();

    let result = sync_assets(&dir, &HashMap::new()).unwrap();
    assert_eq!(result.updates.len(), 1);
    assert_eq!(result.updates[0].rel_path, "icon.png");
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test_log::test]
  fn sync_skips_files_matching_client_hash() {
    let dir = temp_dir();
    std::fs::write(dir.join("icon.png"), b"hello").unwrap();
    let digest = sha256_hex(b"hello");

    let mut client = HashMap::new();
    client.insert("icon.png".to_string(), digest);
    let result = sync_assets(&dir, &client).unwrap();
    assert!(result.updates.is_empty());
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test_log::test]
  fn sync_reports_deletes_for_files_client_has_but_server_lacks() {
    let dir = temp_dir();
    let mut client = HashMap::new();
    client.insert("ghost.png".to_string(), "deadbeef".to_string());
    let result = sync_assets(&dir, &client).unwrap();
    assert_eq!(result.deletes, vec!["ghost.png".to_string()]);
    std::fs::remove_dir_all(&dir).ok();
  }
}
