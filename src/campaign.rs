//! Winner board and campaign reset lifecycle: a file-backed store
//! alongside `news.rs`/`universe.rs`, guarding victory detection and
//! the subsequent universe-wide reset.
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::account::atomic_write_json;
use crate::config::GameConfig;
use crate::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WinnerBoard {
  pub current_winner: Option<String>,
  pub scheduled_reset_ts: Option<i64>,
  pub last_reset_ts: Option<i64>,
  #[serde(default)]
  pub history: Vec<String>,
}

pub struct CampaignStore {
  path: PathBuf,
  inner: Mutex<WinnerBoard>,
}

/// One commander's standing, computed by the caller from the shared
/// universe store plus that commander's save.
#[derive(Debug, Clone)]
pub struct CommanderStanding {
  pub name: String,
  pub owned_planet_count: usize,
  pub total_planet_count: usize,
  pub authority_standing: i64,
  pub frontier_standing: i64,
}

impl CampaignStore {
  pub fn load(path: PathBuf) -> std::io::Result<Self> {
    let board = if path.exists() {
      let raw = std::fs::read_to_string(&path)?;
      serde_json::from_str(&raw).unwrap_or_default()
    } else {
      WinnerBoard::default()
    };
    Ok(CampaignStore {
      path,
      inner: Mutex::new(board),
    })
  }

  #[must_use]
  pub fn snapshot(&self) -> WinnerBoard {
    self.inner.lock().unwrap().clone()
  }

  /// Does `standing` meet every victory threshold in `cfg`?
  #[must_use]
  pub fn qualifies(standing: &CommanderStanding, cfg: &GameConfig) -> bool {
    if standing.total_planet_count == 0 {
      return false;
    }
    let pct = standing.owned_planet_count as f64 / standing.total_planet_count as f64;
    pct >= cfg.get_f64("victory_planet_ownership_pct")
      && standing.authority_standing >= cfg.get_i64("victory_authority_min")
      && standing.authority_standing <= cfg.get_i64("victory_authority_max")
      && standing.frontier_standing >= cfg.get_i64("victory_frontier_min")
      && standing.frontier_standing <= cfg.get_i64("victory_frontier_max")
  }

  /// Evaluate every commander's standing; if any qualifies and no winner
  /// is already recorded, crown the first qualifier and schedule a
  /// reset at local 00:01, `victory_reset_days` from now. Returns the
  /// newly crowned winner's name, if any.
  pub fn evaluate_victory(&self, standings: &[CommanderStanding], cfg: &GameConfig, now: i64) -> std::io::Result<Option<String>> {
    let mut guard = self.inner.lock().unwrap();
    if guard.current_winner.is_some() {
      return Ok(None);
    }
    let Some(winner) = standings.iter().find(|s| Self::qualifies(s, cfg)) else {
      return Ok(None);
    };

    let reset_days = cfg.get_i64("victory_reset_days");
    let reset_ts = next_local_0001(now, reset_days);

    guard.current_winner = Some(winner.name.clone());
    guard.scheduled_reset_ts = Some(reset_ts);
    guard.history.push(winner.name.clone());
    if guard.history.len() > 50 {
      let excess = guard.history.len() - 50;
      guard.history.drain(0..excess);
    }
    atomic_write_json(&self.path, &*guard)?;
    info!("Commander {} qualified for victory; reset scheduled at {}", winner.name, reset_ts);
    Ok(Some(winner.name.clone()))
  }

  /// If a reset is scheduled and due, clear it and return `true` (the
  /// caller is responsible for performing the actual universe/save
  /// purge). Idempotent: calling again with nothing scheduled is a no-op.
  pub fn take_due_reset(&self, now: i64) -> std::io::Result<bool> {
    let mut guard = self.inner.lock().unwrap();
    let Some(scheduled) = guard.scheduled_reset_ts else {
      return Ok(false);
    };
    if scheduled > now {
      return Ok(false);
    }
    guard.current_winner = None;
    guard.scheduled_reset_ts = None;
    guard.last_reset_ts = Some(now);
    atomic_write_json(&self.path, &*guard)?;
    Ok(true)
  }
}

/// The next local-time 00:01 that is at least `days_from_now` days out.
fn next_local_0001(now_utc: i64, days_from_now: i64) -> i64 {
  let now = Local
    .timestamp_opt(now_utc, 0)
    .single()
    .unwrap_or_else(|| Local.timestamp_opt(now_utc, 0).earliest().unwrap());
  let target_date = now.date_naive() + chrono::Duration::days(days_from_now);
  let target = target_date.and_hms_opt(0, 1, 0).unwrap();
  Local
    .from_local_datetime(&target)
    .single()
    .map_or(now_utc + days_from_now * 86400, |dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!(
      "sector_campaign_test_{}_{}.json",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ))
  }

  #[test_log::test]
  fn qualifies_requires_all_three_thresholds() {
    let cfg = GameConfig::default();
    let standing = CommanderStanding {
      name: "jane".into(),
      owned_planet_count: 5,
      total_planet_count: 10,
      authority_standing: 0,
      frontier_standing: 0,
    };
    assert!(CampaignStore::qualifies(&standing, &cfg));

    let low_ownership = CommanderStanding {
      owned_planet_count: 1,
      ..standing.clone()
    };
    assert!(!CampaignStore::qualifies(&low_ownership, &cfg));
  }

  #[test_log::test]
  fn evaluate_victory_only_crowns_once() {
    let path = temp_path();
    let store = CampaignStore::load(path.clone()).unwrap();
    let cfg = GameConfig::default();
    let standing = CommanderStanding {
      name: "jane".into(),
      owned_planet_count: 5,
      total_planet_count: 10,
      authority_standing: 0,
      frontier_standing: 0,
    };
    let winner = store.evaluate_victory(&[standing.clone()], &cfg, 0).unwrap();
    assert_eq!(winner.as_deref(), Some("jane"));

    let again = store.evaluate_victory(&[standing], &cfg, 100).unwrap();
    assert!(again.is_none());
    std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn take_due_reset_is_idempotent() {
    let path = temp_path();
    let store = CampaignStore::load(path.clone()).unwrap();
    let cfg = GameConfig::default();
    let standing = CommanderStanding {
      name: "jane".into(),
      owned_planet_count: 5,
      total_planet_count: 10,
      authority_standing: 0,
      frontier_standing: 0,
    };
    store.evaluate_victory(&[standing], &cfg, 0).unwrap();
    let scheduled = store.snapshot().scheduled_reset_ts.unwrap();

    assert!(!store.take_due_reset(scheduled - 1).unwrap());
    assert!(store.take_due_reset(scheduled + 1).unwrap());
    assert!(!store.take_due_reset(scheduled + 1).unwrap());
    std::fs::remove_file(&path).ok();
  }
}
