//! The planet record shared by every player: no orbital mechanics, just
//! the economics, market, and defense fields the game actually uses.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmugglingEntry {
  pub modifier: i64,
  pub quantity: i64,
  pub tier: u32,
  pub base_price: i64,
  pub required_bribe_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planet {
  pub name: String,
  pub x: f64,
  pub y: f64,
  pub population: i64,
  pub description: String,
  pub vendor: bool,
  pub bank: bool,
  pub crew_services: bool,
  pub is_smuggler_hub: bool,
  pub npc_name: String,
  pub npc_personality: String,
  pub docking_fee: i64,
  pub bribe_cost: i64,
  pub security_level: u8,

  pub owner: Option<String>,
  pub defenders: i64,
  pub shields: i64,
  pub max_defenders: i64,
  pub max_shields: i64,
  pub base_defenders: i64,
  pub base_shields: i64,
  pub credit_balance: i64,
  pub credits_initialized: bool,
  pub last_credit_interest_time: i64,
  pub last_defense_regen_time: i64,
  pub repair_multiplier: Option<f64>,

  pub item_modifiers: HashMap<String, i64>,
  pub smuggling_inventory: HashMap<String, SmugglingEntry>,
}

/// Deterministic pseudo-coordinates from a planet's name, so every
/// process derives the same map layout without storing it.
#[must_use]
pub fn coords_from_name(name: &str) -> (f64, f64) {
  let mut hash: u64 = 1469598103934665603; // FNV offset basis
  for b in name.as_bytes() {
    hash ^= u64::from(*b);
    hash = hash.wrapping_mul(1099511628211); // FNV prime
  }
  let x = f64::from((hash & 0xFFFF) as u32) / f64::from(0xFFFFu32) * 2000.0 - 1000.0;
  let y = f64::from(((hash >> 16) & 0xFFFF) as u32) / f64::from(0xFFFFu32) * 2000.0 - 1000.0;
  (x, y)
}

impl Planet {
  #[must_use]
  pub fn distance_to(&self, other: &Planet) -> f64 {
    ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
  }

  /// Listed price for an item before any runtime modifiers (hostile
  /// surcharge, spotlight, events, momentum) are applied.
  #[must_use]
  pub fn base_listed_price(&self, item: &str, base_price: i64) -> i64 {
    let modifier = self.item_modifiers.get(item).copied().unwrap_or(100);
    ((base_price as f64) * (modifier as f64) / 100.0).round() as i64
  }

  /// Drift every item modifier 85%-115% and smuggling modifiers 50%-150%,
  /// with a 5% chance per jump to add 1-2 stock units to a random
  /// contraband line.
  pub fn drift_modifiers(&mut self, rng: &mut impl rand::RngCore) {
    use crate::rng::{chance, uniform_int};
    for v in self.item_modifiers.values_mut() {
      *v = uniform_int(rng, 85, 115);
    }
    let keys: Vec<String> = self.smuggling_inventory.keys().cloned().collect();
    for k in keys {
      if let Some(entry) = self.smuggling_inventory.get_mut(&k) {
        entry.modifier = uniform_int(rng, 50, 150);
        if chance(rng, 0.05) {
          entry.quantity += uniform_int(rng, 1, 2);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn coords_are_deterministic() {
    let (x1, y1) = coords_from_name("Alderon");
    let (x2, y2) = coords_from_name("Alderon");
    assert!((x1 - x2).abs() < f64::EPSILON);
    assert!((y1 - y2).abs() < f64::EPSILON);
  }

  #[test_log::test]
  fn different_names_usually_differ() {
    let a = coords_from_name("Alderon");
    let b = coords_from_name("Brightwater");
    assert!(a != b);
  }
}
