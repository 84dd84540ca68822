//! The shared universe file: the single source of truth for planet
//! ownership, garrisons, shields, and treasuries across every character.
//! Loaded once, guarded behind a mutex, and written back via temp-file
//! plus atomic rename so concurrent sessions never observe a torn write.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::account::atomic_write_json;
use crate::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetState {
  pub owner: Option<String>,
  pub defenders: i64,
  pub shields: i64,
  pub max_shields: i64,
  pub credit_balance: i64,
  pub credits_initialized: bool,
  pub last_credit_interest_time: i64,
  pub last_defense_regen_time: i64,
  #[serde(default)]
  pub population_delta: i64,
}

impl PlanetState {
  #[must_use]
  pub fn base(base_defenders: i64, base_shields: i64, max_shields: i64) -> Self {
    PlanetState {
      owner: None,
      defenders: base_defenders,
      shields: base_shields,
      max_shields,
      credit_balance: 0,
      credits_initialized: false,
      last_credit_interest_time: 0,
      last_defense_regen_time: 0,
      population_delta: 0,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UniverseFile {
  pub updated_at: i64,
  pub planet_states: HashMap<String, PlanetState>,
}

pub struct UniverseStore {
  path: PathBuf,
  inner: Mutex<UniverseFile>,
}

impl UniverseStore {
  /// Load `path` if present, otherwise start empty; the mutex serializes
  /// every subsequent load-mutate-save sequence for the process.
  pub fn load(path: PathBuf) -> std::io::Result<Self> {
    let file = if path.exists() {
      let raw = std::fs::read_to_string(&path)?;
      serde_json::from_str(&raw).unwrap_or_default()
    } else {
      UniverseFile::default()
    };
    Ok(UniverseStore {
      path,
      inner: Mutex::new(file),
    })
  }

  /// Read a planet's overlay state, inserting a fresh base record keyed
  /// by the given defaults if one doesn't exist yet.
  pub fn get_or_init(&self, name: &str, base_defenders: i64, base_shields: i64, max_shields: i64) -> PlanetState {
    let mut guard = self.inner.lock().unwrap();
    guard
      .planet_states
      .entry(name.to_string())
      .or_insert_with(|| PlanetState::base(base_defenders, base_shields, max_shields))
      .clone()
  }

  pub fn with_mutate<F, R>(&self, name: &str, base_defenders: i64, base_shields: i64, max_shields: i64, f: F) -> std::io::Result<R>
  where
    F: FnOnce(&mut PlanetState) -> R,
  {
    let mut guard = self.inner.lock().unwrap();
    let state = guard
      .planet_states
      .entry(name.to_string())
      .or_insert_with(|| PlanetState::base(base_defenders, base_shields, max_shields));
    let result = f(state);
    guard.updated_at = chrono::Utc::now().timestamp();
    atomic_write_json(&self.path, &*guard)?;
    Ok(result)
  }

  #[must_use]
  pub fn snapshot(&self) -> UniverseFile {
    self.inner.lock().unwrap().clone()
  }

  /// Campaign reset: restore every planet's owner to `None` and garrison
  /// back to the supplied base values. Idempotent: callers pass the same
  /// base table every time, so re-running has no further effect.
  pub fn reset_all(&self, bases: &HashMap<String, (i64, i64, i64)>) -> std::io::Result<()> {
    let mut guard = self.inner.lock().unwrap();
    for (name, (base_defenders, base_shields, max_shields)) in bases {
      let entry = guard
        .planet_states
        .entry(name.clone())
        .or_insert_with(|| PlanetState::base(*base_defenders, *base_shields, *max_shields));
      entry.owner = None;
      entry.defenders = *base_defenders;
      entry.shields = *base_shields;
      entry.max_shields = *max_shields;
      entry.credit_balance = 0;
      entry.credits_initialized = false;
      entry.population_delta = 0;
    }
    guard.updated_at = chrono::Utc::now().timestamp();
    atomic_write_json(&self.path, &*guard)?;
    info!("Universe reset: {} planets restored to base state", bases.len());
    Ok(())
  }

  #[must_use]
  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!(
      "sector_universe_test_{}_{}.json",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ))
  }

  #[test_log::test]
  fn get_or_init_persists_base_state() {
    let path = temp_path();
    let store = UniverseStore::load(path.clone()).unwrap();
    let state = store.get_or_init("Alderon", 10, 20, 50);
    assert_eq!(state.defenders, 10);
    assert_eq!(state.shields, 20);
    std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn mutate_persists_across_reload() {
    let path = temp_path();
    {
      let store = UniverseStore::load(path.clone()).unwrap();
      store
        .with_mutate("Alderon", 10, 20, 50, |s| {
          s.owner = Some("jane".to_string());
        })
        .unwrap();
    }
    let reloaded = UniverseStore::load(path.clone()).unwrap();
    let state = reloaded.get_or_init("Alderon", 10, 20, 50);
    assert_eq!(state.owner.as_deref(), Some("jane"));
    std::fs::remove_file(&path).ok();
  }

  #[test_log::test]
  fn reset_all_clears_ownership() {
    let path = temp_path();
    let store = UniverseStore::load(path.clone()).unwrap();
    store
      .with_mutate("Alderon", 10, 20, 50, |s| s.owner = Some("jane".to_string()))
      .unwrap();
    let mut bases = HashMap::new();
    bases.insert("Alderon".to_string(), (10, 20, 50));
    store.reset_all(&bases).unwrap();
    let state = store.get_or_init("Alderon", 10, 20, 50);
    assert!(state.owner.is_none());
    std::fs::remove_file(&path).ok();
  }
}
