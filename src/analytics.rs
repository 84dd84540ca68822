//! Structured event telemetry: a bounded ring of events, running
//! counters, a periodic flush, retention pruning, and a heuristic
//! recommendation pass.
use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::atomic_write_json;
use crate::config::GameConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
  pub ts: i64,
  pub category: String,
  pub name: String,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub player: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub planet: Option<String>,
  #[serde(default)]
  pub meta: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Counters {
  pub total_events: u64,
  pub events_by_category: HashMap<String, u64>,
  pub events_by_name: HashMap<String, u64>,
  pub success_count: u64,
  pub failure_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AnalyticsFile {
  updated_at: i64,
  events: Vec<AnalyticsEvent>,
  counters: Counters,
}

pub struct AnalyticsStore {
  path: PathBuf,
  max_events: usize,
  events: Vec<AnalyticsEvent>,
  counters: Counters,
  dirty: bool,
  last_flush: i64,
}

impl AnalyticsStore {
  pub fn load(path: PathBuf, cfg: &GameConfig) -> std::io::Result<Self> {
    let max_events = usize::try_from(cfg.get_u64("analytics_max_events")).unwrap_or(5000);
    let file: AnalyticsFile = if path.exists() {
      let raw = std::fs::read_to_string(&path)?;
      serde_json::from_str(&raw).unwrap_or_default()
    } else {
      AnalyticsFile::default()
    };
    Ok(AnalyticsStore {
      path,
      max_events,
      events: file.events,
      counters: file.counters,
      dirty: false,
      last_flush: 0,
    })
  }

  pub fn record(&mut self, event: AnalyticsEvent) {
    self.counters.total_events += 1;
    *self.counters.events_by_category.entry(event.category.clone()).or_insert(0) += 1;
    *self.counters.events_by_name.entry(event.name.clone()).or_insert(0) += 1;
    if event.success {
      self.counters.success_count += 1;
    } else {
      self.counters.failure_count += 1;
    }
    self.events.push(event);
    if self.events.len() > self.max_events {
      let excess = self.events.len() - self.max_events;
      self.events.drain(0..excess);
    }
    self.dirty = true;
  }

  pub fn prune(&mut self, now: i64, retention_days: i64) {
    let cutoff = now - retention_days * 86400;
    let before = self.events.len();
    self.events.retain(|e| e.ts >= cutoff);
    if self.events.len() != before {
      self.dirty = true;
    }
  }

  /// Write the snapshot if dirty and either `force` or the flush
  /// interval has elapsed since the last write.
  pub fn flush(&mut self, now: i64, flush_interval_seconds: i64, force: bool) -> std::io::Result<bool> {
    if !self.dirty {
      return Ok(false);
    }
    if !force && now - self.last_flush < flush_interval_seconds {
      return Ok(false);
    }
    let file = AnalyticsFile {
      updated_at: now,
      events: self.events.clone(),
      counters: self.counters.clone(),
    };
    atomic_write_json(&self.path, &file)?;
    self.dirty = false;
    self.last_flush = now;
    Ok(true)
  }

  pub fn reset(&mut self) {
    self.events.clear();
    self.counters = Counters::default();
    self.dirty = true;
  }

  #[must_use]
  pub fn events_in_window(&self, now: i64, hours: i64) -> Vec<&AnalyticsEvent> {
    let cutoff = now - hours * 3600;
    self.events.iter().filter(|e| e.ts >= cutoff).collect()
  }

  #[must_use]
  pub fn counters(&self) -> &Counters {
    &self.counters
  }

  /// Windowed aggregation: counts, success rate, top-10 by name, counts
  /// by category.
  #[must_use]
  pub fn summary(&self, now: i64, hours: i64) -> AnalyticsSummary {
    let window = self.events_in_window(now, hours);
    let total = window.len();
    let successes = window.iter().filter(|e| e.success).count();
    let mut by_name: HashMap<String, u64> = HashMap::new();
    let mut by_category: HashMap<String, u64> = HashMap::new();
    for e in &window {
      *by_name.entry(e.name.clone()).or_insert(0) += 1;
      *by_category.entry(e.category.clone()).or_insert(0) += 1;
    }
    let mut top: Vec<(String, u64)> = by_name.into_iter().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top.truncate(10);

    AnalyticsSummary {
      window_hours: hours,
      total_events: total as u64,
      success_rate: if total == 0 { 0.0 } else { successes as f64 / total as f64 },
      top_by_name: top,
      by_category,
    }
  }

  /// Short heuristic strings, e.g. flagging special-weapon disuse despite
  /// frequent combats.
  #[must_use]
  pub fn recommendations(&self, now: i64, hours: i64) -> Vec<String> {
    let window = self.events_in_window(now, hours);
    let combats = window.iter().filter(|e| e.category == "combat").count();
    let special = window
      .iter()
      .filter(|e| e.category == "combat" && e.name == "fire_special_weapon")
      .count();
    let mut out = Vec::new();
    if combats >= 5 && special == 0 {
      out.push(format!("no special weapon use in {combats} combats despite availability"));
    }
    let failures = window.iter().filter(|e| !e.success).count();
    if !window.is_empty() && failures as f64 / window.len() as f64 > 0.5 {
      out.push(format!("high failure rate ({failures}/{}) in the last {hours}h", window.len()));
    }
    out
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
  pub window_hours: i64,
  pub total_events: u64,
  pub success_rate: f64,
  pub top_by_name: Vec<(String, u64)>,
  pub by_category: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!(
      "sector_analytics_test_{}_{}.json",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ))
  }

  fn ev(ts: i64, category: &str, name: &str, success: bool) -> AnalyticsEvent {
    AnalyticsEvent {
      ts,
      category: category.into(),
      name: name.into(),
      success,
      value: None,
      player: None,
      planet: None,
      meta: Value::Null,
    }
  }

  #[test_log::test]
  fn record_updates_counters_and_caps_ring() {
    let path = temp_path();
    let cfg = GameConfig::default();
    let mut store = AnalyticsStore::load(path.clone(), &cfg).unwrap();
    for i in 0..3 {
      store.record(ev(i, "trade", "buy_item", true));
    }
    assert_eq!(store.counters().total_events, 3);
    assert_eq!(store.counters().success_count, 3);
        std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn recommendations_flag_special_weapon_disuse() {
    let path = temp_path();
    let cfg = GameConfig::default();
    let mut store = AnalyticsStore::load(path.clone(), &cfg).unwrap();
    for i in 0..6 {
      store.record(ev(i, "combat", "resolve_combat_round", true));
    }
    let recs = store.recommendations(10, 24);
    assert!(recs.iter().any(|r| r.contains("special weapon")));
    std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn flush_only_writes_when_dirty_or_forced() {
    let path = temp_path();
    let cfg = GameConfig::default();
    let mut store = AnalyticsStore::load(path.clone(), &cfg).unwrap();
    assert!(!store.flush(0, 15, false).unwrap());
    store.record(ev(0, "trade", "buy_item", true));
    assert!(store.flush(0, 15, true).unwrap());
    std::fs::remove_file(&path).ok();
  }
}
