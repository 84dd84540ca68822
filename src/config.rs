//! Loads `server/game_config.json#settings` and fills in a default for
//! every tunable the engine references, so a handler can always read a
//! value without an `Option` dance.
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{info, warn};

/// All server tunables, stored as loosely-typed JSON values rather than
/// compiled-in consts, because this set is operator-tunable.
#[derive(Debug, Clone)]
pub struct GameConfig {
  values: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ConfigFile {
  #[serde(default)]
  settings: HashMap<String, Value>,
}

impl GameConfig {
  /// Load `path`, falling back to pure defaults if the file is absent.
  ///
  /// # Errors
  /// Returns an error only if the file exists but is not valid JSON.
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let mut values = default_settings();

    if path.exists() {
      let raw = std::fs::read_to_string(path)?;
      let parsed: ConfigFile = serde_json::from_str(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
      for (k, v) in parsed.settings {
        values.insert(k, v);
      }
      info!("Loaded game config from {}", path.display());
    } else {
      warn!(
        "Config file {} not found; running with built-in defaults.",
        path.display()
      );
    }

    Ok(GameConfig { values })
  }

  #[must_use]
  pub fn default() -> Self {
    GameConfig {
      values: default_settings(),
    }
  }

  #[must_use]
  pub fn get_f64(&self, key: &str) -> f64 {
    self.values.get(key).and_then(Value::as_f64).unwrap_or(0.0)
  }

  #[must_use]
  pub fn get_i64(&self, key: &str) -> i64 {
    self.values.get(key).and_then(Value::as_i64).unwrap_or(0)
  }

  #[must_use]
  pub fn get_u64(&self, key: &str) -> u64 {
    self.values.get(key).and_then(Value::as_u64).unwrap_or(0)
  }

  #[must_use]
  pub fn get_bool(&self, key: &str) -> bool {
    self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
  }

  #[must_use]
  pub fn get_str(&self, key: &str) -> String {
    self
      .values
      .get(key)
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_string()
  }

  #[must_use]
  pub fn server_port(&self) -> u16 {
    u16::try_from(self.get_u64("server_port")).unwrap_or(8765)
  }

  pub fn set_server_port(&mut self, port: u16) {
    self.values.insert("server_port".to_string(), serde_json::json!(port));
  }
}

fn default_settings() -> HashMap<String, Value> {
  let mut m = HashMap::new();
  macro_rules! set {
    ($key:expr, $val:expr) => {
      m.insert($key.to_string(), serde_json::json!($val));
    };
  }

  set!("server_port", 8765);
  set!("allow_multiple_games", false);

  // Economy / navigation
  set!("fuel_usage_multiplier", 1.15);
  set!("travel_time_reference_distance", 300.0);
  set!("travel_time_min_seconds", 0.8);
  set!("travel_time_max_seconds", 12.0);
  set!("frontier_bribe_bonus", 6);
  set!("frontier_contraband_trade_bonus", 1);
  set!("frontier_smuggling_detection_reduction_step", 0.01);
  set!("frontier_smuggling_discount_step", 0.005);
  set!("authority_bounty_bonus_step", 0.01);
  set!("law_heat_gain_trade", 2);
  set!("law_heat_gain_detected", 8);
  set!("law_heat_decay_per_hour", 3);
  set!("law_heat_scan_chance_step", 0.015);
  set!("law_heat_penalty_step", 0.20);
  set!("law_heat_detected_ship_level_step", 0.18);
  set!("contraband_detection_ship_level_step", 0.08);
  set!("contraband_detection_tier_step", 0.12);
  set!("contraband_price_tier_step", 0.35);
  set!("bribe_price_ship_level_step", 0.10);
  set!("bribe_sell_bonus_per_level", 0.05);
  set!("planet_event_chance", 0.24);
  set!("economy_momentum_trade_step", 0.018);
  set!("economy_momentum_decay_per_hour", 0.10);
  set!("economy_dampening_volume_step", 0.012);
  set!("economy_dampening_floor", 0.70);
  set!("salvage_sell_multiplier", 0.35);
  set!("sector_report_interval_hours", 24);
  set!("enable_bank", true);
  set!("planet_price_penalty_multiplier", 1.25);
  set!("planet_price_penalty_window_hours", 24);
  set!("spotlight_min_discount_pct", 10);
  set!("spotlight_max_discount_pct", 40);

  // Contracts
  set!("trade_contract_reward_multiplier", 1.4);
  set!("contract_chain_bonus_per_completion", 0.05);
  set!("contract_chain_bonus_cap", 0.30);
  set!("contract_expiry_hours", 6);
  set!("contract_milestone_bonus_pct", 20);

  // Refuel timer
  set!("refuel_timer_enabled", true);
  set!("refuel_timer_max_refuels", 3);
  set!("refuel_timer_window_hours", 1.0);
  set!("refuel_timer_cost_multiplier_pct", 150.0);

  // Crew
  set!("crew_pay_interval_hours", 24);
  set!("crew_unpaid_cycle_limit", 7);

  // Combat
  set!("combat_win_streak_bonus_per_win", 0.05);
  set!("combat_win_streak_bonus_cap", 0.50);
  set!("enable_special_weapons", true);
  set!("combat_special_weapon_cooldown_hours", 12.0);
  set!("combat_special_weapon_damage_multiplier", 3.0);
  set!("combat_special_weapon_pop_reduction_min", 0.05);
  set!("combat_special_weapon_pop_reduction_max", 0.15);
  set!("planet_price_penalty_hostile_window_hours", 1.0);
  set!("planet_bar_duration_hours", 24);

  // Planet defense regen
  set!("planet_defense_regen_interval_seconds", 14400);
  set!("planet_defense_regen_fighters", 1);
  set!("planet_defense_regen_shields", 10);
  set!("planet_credit_interest_interval_seconds", 86400);
  set!("planet_credit_interest_rate", 0.02);

  // Campaign / victory
  set!("victory_planet_ownership_pct", 0.40);
  set!("victory_authority_min", -20);
  set!("victory_authority_max", 100);
  set!("victory_frontier_min", -100);
  set!("victory_frontier_max", 20);
  set!("victory_reset_days", 3);

  // Mail / news
  set!("mailbox_inbox_cap", 20);
  set!("mailbox_archive_cap", 20);
  set!("galactic_news_retention_days", 14);

  // Analytics
  set!("enable_analytics", true);
  set!("analytics_retention_days", 14);
  set!("analytics_max_events", 5000);
  set!("analytics_flush_interval_seconds", 15);

  // Commander stipend
  set!("commander_stipend_interval_hours", 24);
  set!("commander_stipend_per_planet", 50);

  // Asset sync
  set!("asset_sync_max_file_bytes", 12 * 1024 * 1024);

  // Ship loss recovery
  set!("abandoned_ship_salvage_fee", 500);

  m
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn default_config_has_every_referenced_key() {
    let cfg = GameConfig::default();
    assert_eq!(cfg.server_port(), 8765);
    assert!(cfg.get_f64("planet_price_penalty_multiplier") > 1.0);
    assert!(cfg.get_bool("enable_analytics"));
  }

  #[test_log::test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = GameConfig::load(Path::new("/nonexistent/game_config.json")).unwrap();
    assert_eq!(cfg.server_port(), 8765);
  }

  #[test_log::test]
  fn file_overrides_merge_over_defaults() {
    let dir = std::env::temp_dir().join(format!("sector_cfg_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("game_config.json");
    std::fs::write(&path, r#"{"settings": {"server_port": 9999}}"#).unwrap();

    let cfg = GameConfig::load(&path).unwrap();
    assert_eq!(cfg.server_port(), 9999);
    // Un-overridden keys keep their default.
    assert!(cfg.get_bool("enable_bank"));

    std::fs::remove_dir_all(&dir).ok();
  }
}
