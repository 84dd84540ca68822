//! Append-only galactic news feed: load, guard behind a mutex, atomic
//! write.
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::account::atomic_write_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
  Global,
  Player,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEntry {
  pub id: String,
  pub timestamp: i64,
  pub event_type: String,
  pub title: String,
  pub body: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub planet: Option<String>,
  pub audience: Audience,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub player: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct NewsFile {
  items: Vec<NewsEntry>,
}

pub struct NewsStore {
  path: PathBuf,
  inner: Mutex<NewsFile>,
}

impl NewsStore {
  pub fn load(path: PathBuf) -> std::io::Result<Self> {
    let file = if path.exists() {
      let raw = std::fs::read_to_string(&path)?;
      serde_json::from_str(&raw).unwrap_or_default()
    } else {
      NewsFile::default()
    };
    Ok(NewsStore {
      path,
      inner: Mutex::new(file),
    })
  }

  pub fn append(&self, entry: NewsEntry) -> std::io::Result<()> {
    let mut guard = self.inner.lock().unwrap();
    guard.items.push(entry);
    atomic_write_json(&self.path, &*guard)
  }

  /// Drop entries older than `retention_days`; written back atomically.
  pub fn prune(&self, now: i64, retention_days: i64) -> std::io::Result<()> {
    let cutoff = now - retention_days * 86400;
    let mut guard = self.inner.lock().unwrap();
    guard.items.retain(|e| e.timestamp >= cutoff);
    atomic_write_json(&self.path, &*guard)
  }

  /// Entries within `[now - lookback_days, now]`, newer than `watermark`,
  /// and matching either global audience or this player's name.
  #[must_use]
  pub fn unseen_for(&self, player_name: &str, watermark: i64, now: i64, lookback_days: i64) -> Vec<NewsEntry> {
    let window_start = now - lookback_days * 86400;
    let guard = self.inner.lock().unwrap();
    guard
      .items
      .iter()
      .filter(|e| e.timestamp >= window_start && e.timestamp <= now && e.timestamp > watermark)
      .filter(|e| match e.audience {
        Audience::Global => true,
        Audience::Player => e.player.as_deref() == Some(player_name),
      })
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!(
      "sector_news_test_{}_{}.json",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ))
  }

  fn entry(ts: i64, audience: Audience, player: Option<&str>) -> NewsEntry {
    NewsEntry {
      id: format!("news_{ts}"),
      timestamp: ts,
      event_type: "test".into(),
      title: "t".into(),
      body: "b".into(),
      planet: None,
      audience,
      player: player.map(std::string::ToString::to_string),
    }
  }

  #[test_log::test]
  fn unseen_filters_by_watermark_and_audience() {
    let path = temp_path();
    let store = NewsStore::load(path.clone()).unwrap();
    store.append(entry(100, Audience::Global, None)).unwrap();
    store.append(entry(200, Audience::Player, Some("jane"))).unwrap();
    store.append(entry(200, Audience::Player, Some("bob"))).unwrap();

    let unseen = store.unseen_for("jane", 50, 1000, 30);
    assert_eq!(unseen.len(), 2);
    let unseen_after_watermark = store.unseen_for("jane", 150, 1000, 30);
    assert_eq!(unseen_after_watermark.len(), 1);
    std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn prune_drops_old_entries() {
    let path = temp_path();
    let store = NewsStore::load(path.clone()).unwrap();
    store.append(entry(0, Audience::Global, None)).unwrap();
    store.append(entry(100_000_000, Audience::Global, None)).unwrap();
    store.prune(100_000_000, 14).unwrap();
    let unseen = store.unseen_for("anyone", -1, 100_000_000, 36500);
    assert_eq!(unseen.len(), 1);
    std::fs::remove_file(&path).ok();
  }
}
