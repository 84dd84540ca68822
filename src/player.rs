//! The `Player` aggregate: the per-character mutable state that survives
//! across saves, wrapping its economy, faction, and crew fields behind
//! mutation methods rather than exposing them for direct edits.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crew::{CrewMember, Specialty};
use crate::mail::Message;

const ITEM_ALIASES: &[(&str, &str)] = &[
  ("Standard Fuel", "Fuel Cells"),
  ("fuel", "Fuel Cells"),
  ("Nanobots", "Nanobot Kit"),
];

/// Canonicalize an inventory key through the fixed alias table. Called
/// before reads and after loads.
#[must_use]
pub fn canonicalize_item(name: &str) -> String {
  for (alias, canonical) in ITEM_ALIASES {
    if name.eq_ignore_ascii_case(alias) {
      return (*canonical).to_string();
    }
  }
  name.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Player {
  pub name: String,
  pub credits: i64,
  pub bank_balance: i64,
  pub inventory: HashMap<String, i64>,
  pub owned_planets: HashMap<String, i64>,
  pub barred_planets: HashMap<String, i64>,
  pub attacked_planets: HashMap<String, i64>,
  pub crew: HashMap<Specialty, CrewMember>,
  pub messages: Vec<Message>,
  pub authority_standing: i64,
  pub frontier_standing: i64,
  pub combat_win_streak: u32,
  pub contract_chain_streak: u32,
  pub last_special_weapon_time: i64,
  pub last_commander_stipend_time: i64,
  pub last_seen_news_timestamp: i64,
  pub refuel_uses_in_window: u32,
  pub refuel_window_started_at: i64,
  pub port_visits: u32,
  pub current_planet: String,
  pub last_crew_pay_time: i64,
}

impl Player {
  #[must_use]
  pub fn new(name: String, starting_credits: i64, home_planet: String) -> Self {
    Player {
      name,
      credits: starting_credits,
      current_planet: home_planet,
      authority_standing: 0,
      frontier_standing: 0,
      ..Default::default()
    }
  }

  /// Add `qty` of `item` (canonicalized) to inventory; drop the key if
  /// the resulting quantity is <= 0.
  pub fn add_item(&mut self, item: &str, qty: i64) {
    let key = canonicalize_item(item);
    let entry = self.inventory.entry(key.clone()).or_insert(0);
    *entry += qty;
    if *entry <= 0 {
      self.inventory.remove(&key);
    }
  }

  #[must_use]
  pub fn item_qty(&self, item: &str) -> i64 {
    self.inventory.get(&canonicalize_item(item)).copied().unwrap_or(0)
  }

  #[must_use]
  pub fn cargo_used(&self) -> i64 {
    self.inventory.values().sum()
  }

  #[must_use]
  pub fn authority_label(&self) -> &'static str {
    standing_label(self.authority_standing)
  }

  #[must_use]
  pub fn frontier_label(&self) -> &'static str {
    standing_label(self.frontier_standing)
  }

  pub fn adjust_authority(&mut self, delta: i64) {
    self.authority_standing = (self.authority_standing + delta).clamp(-100, 100);
  }

  pub fn adjust_frontier(&mut self, delta: i64) {
    self.frontier_standing = (self.frontier_standing + delta).clamp(-100, 100);
  }

  #[must_use]
  pub fn is_barred(&self, planet: &str, now: i64) -> bool {
    self.barred_planets.get(planet).is_some_and(|exp| *exp > now)
  }

  pub fn bar_from(&mut self, planet: &str, until: i64) {
    self.barred_planets.insert(planet.to_string(), until);
  }
}

/// Shared by the authority/frontier standing label queries.
#[must_use]
pub fn standing_label(value: i64) -> &'static str {
  match value {
    v if v >= 70 => "Exalted",
    v if v >= 30 => "Respected",
    v if v >= -10 => "Neutral",
    v if v >= -50 => "Distrusted",
    _ => "Reviled",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn canonicalize_maps_known_aliases() {
    assert_eq!(canonicalize_item("Standard Fuel"), "Fuel Cells");
    assert_eq!(canonicalize_item("Ore"), "Ore");
  }

  #[test_log::test]
  fn add_item_drops_key_at_zero() {
    let mut p = Player::new("Jane".into(), 1000, "Alderon".into());
    p.add_item("Ore", 5);
    assert_eq!(p.item_qty("Ore"), 5);
    p.add_item("Ore", -5);
    assert_eq!(p.item_qty("Ore"), 0);
    assert!(!p.inventory.contains_key("Ore"));
  }

  #[test_log::test]
  fn authority_clamped_to_range() {
    let mut p = Player::new("Jane".into(), 1000, "Alderon".into());
    p.adjust_authority(500);
    assert_eq!(p.authority_standing, 100);
    p.adjust_authority(-1000);
    assert_eq!(p.authority_standing, -100);
  }
}
