//! Ships and ship templates: a static-template catalog covering this
//! game's cargo/combat/role model.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::crew::Specialty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum RoleTag {
  Hauler,
  Interceptor,
  Siege,
  Runner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Module {
  Scanner,
  Jammer,
  CargoOptimizer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipTemplate {
  pub model: String,
  pub cost: i64,
  pub base_cargo_pods: i64,
  pub max_cargo_pods: i64,
  pub base_shields: i64,
  pub max_shields: i64,
  pub base_defenders: i64,
  pub max_defenders: i64,
  pub max_integrity: i64,
  pub max_fuel: f64,
  pub fuel_burn_rate: f64,
  pub special_weapon: Option<String>,
  pub role_tags: Vec<RoleTag>,
  pub module_slots: u32,
  pub crew_slots: HashMap<Specialty, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spaceship {
  pub model: String,
  pub cost: i64,
  pub cargo_pods: i64,
  pub max_cargo_pods: i64,
  pub shields: i64,
  pub max_shields: i64,
  pub defenders: i64,
  pub max_defenders: i64,
  pub integrity: i64,
  pub max_integrity: i64,
  pub fuel: f64,
  pub max_fuel: f64,
  pub fuel_burn_rate: f64,
  pub special_weapon: Option<String>,
  pub role_tags: Vec<RoleTag>,
  pub module_slots: u32,
  pub installed_modules: Vec<Module>,
  pub crew_slots: HashMap<Specialty, u32>,
  pub last_refuel_time: i64,
}

impl Spaceship {
  #[must_use]
  pub fn from_template(t: &ShipTemplate) -> Self {
    Spaceship {
      model: t.model.clone(),
      cost: t.cost,
      cargo_pods: t.base_cargo_pods,
      max_cargo_pods: t.max_cargo_pods,
      shields: t.base_shields,
      max_shields: t.max_shields,
      defenders: t.base_defenders,
      max_defenders: t.max_defenders,
      integrity: t.max_integrity,
      max_integrity: t.max_integrity,
      fuel: t.max_fuel,
      max_fuel: t.max_fuel,
      fuel_burn_rate: t.fuel_burn_rate,
      special_weapon: t.special_weapon.clone(),
      role_tags: t.role_tags.clone(),
      module_slots: t.module_slots,
      installed_modules: Vec::new(),
      crew_slots: t.crew_slots.clone(),
      last_refuel_time: 0,
    }
  }

  /// Effective cargo capacity: base pods plus +2/pod with `cargo_optimizer`
  /// installed, plus a hauler role bonus.
  #[must_use]
  pub fn effective_max_cargo(&self) -> i64 {
    let mut cap = self.cargo_pods * 10;
    if self.installed_modules.contains(&Module::CargoOptimizer) {
      cap += self.cargo_pods * 2;
    }
    if self.role_tags.contains(&RoleTag::Hauler) {
      cap += cap / 5;
    }
    cap
  }

  /// Effective fuel burn rate, reduced 10% for runners.
  #[must_use]
  pub fn effective_fuel_burn(&self) -> f64 {
    if self.role_tags.contains(&RoleTag::Runner) {
      self.fuel_burn_rate * 0.9
    } else {
      self.fuel_burn_rate
    }
  }

  /// Combat power multiplier: base 1.0, +15% for interceptor/siege roles,
  /// +5% per weapons crew slot filled, +10% with a jammer installed
  /// (jammer boosts evasion not power, so excluded here).
  #[must_use]
  pub fn combat_power_multiplier(&self, weapons_crew_count: u32) -> f64 {
    let mut mult = 1.0;
    if self.role_tags.contains(&RoleTag::Interceptor) || self.role_tags.contains(&RoleTag::Siege) {
      mult += 0.15;
    }
    mult += 0.05 * f64::from(weapons_crew_count);
    mult
  }

  /// Scan-evasion multiplier in `(0, 1]`: lower means less likely to be
  /// detected carrying contraband.
  #[must_use]
  pub fn scan_evasion_multiplier(&self) -> f64 {
    let mut evasion = 1.0;
    if self.installed_modules.contains(&Module::Jammer) {
      evasion *= 0.7;
    }
    if self.role_tags.contains(&RoleTag::Runner) {
      evasion *= 0.85;
    }
    evasion
  }

  /// Strength score for a given role, used by contract/route heuristics.
  #[must_use]
  pub fn role_strength(&self, role: RoleTag) -> f64 {
    let base = if self.role_tags.contains(&role) { 1.5 } else { 1.0 };
    base * (f64::from(u32::try_from(self.defenders + self.shields).unwrap_or(0)) / 100.0 + 1.0)
  }
}

#[must_use]
pub fn default_templates() -> Vec<ShipTemplate> {
  vec![
    ShipTemplate {
      model: "Rustbucket Hauler".into(),
      cost: 5_000,
      base_cargo_pods: 8,
      max_cargo_pods: 16,
      base_shields: 20,
      max_shields: 60,
      base_defenders: 10,
      max_defenders: 40,
      max_integrity: 100,
      max_fuel: 100.0,
      fuel_burn_rate: 1.0,
      special_weapon: None,
      role_tags: vec![RoleTag::Hauler],
      module_slots: 2,
      crew_slots: HashMap::from([(Specialty::Engineer, 2), (Specialty::Weapons, 1)]),
    },
    ShipTemplate {
      model: "Wasp Interceptor".into(),
      cost: 12_000,
      base_cargo_pods: 3,
      max_cargo_pods: 8,
      base_shields: 40,
      max_shields: 90,
      base_defenders: 30,
      max_defenders: 70,
      max_integrity: 120,
      max_fuel: 80.0,
      fuel_burn_rate: 1.3,
      special_weapon: None,
      role_tags: vec![RoleTag::Interceptor, RoleTag::Runner],
      module_slots: 3,
      crew_slots: HashMap::from([(Specialty::Weapons, 2), (Specialty::Engineer, 1)]),
    },
    ShipTemplate {
      model: "Dreadnought Siege".into(),
      cost: 45_000,
      base_cargo_pods: 6,
      max_cargo_pods: 12,
      base_shields: 100,
      max_shields: 220,
      base_defenders: 80,
      max_defenders: 160,
      max_integrity: 260,
      max_fuel: 140.0,
      fuel_burn_rate: 1.8,
      special_weapon: Some("orbital_lance".into()),
      role_tags: vec![RoleTag::Siege],
      module_slots: 4,
      crew_slots: HashMap::from([(Specialty::Weapons, 3), (Specialty::Engineer, 2)]),
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn effective_cargo_grows_with_optimizer_module() {
    let t = &default_templates()[0];
    let mut ship = Spaceship::from_template(t);
    let base = ship.effective_max_cargo();
    ship.installed_modules.push(Module::CargoOptimizer);
    assert!(ship.effective_max_cargo() > base);
  }

  #[test_log::test]
  fn from_template_starts_at_base_not_max() {
    let t = &default_templates()[0];
    let ship = Spaceship::from_template(t);
    assert_eq!(ship.cargo_pods, t.base_cargo_pods);
    assert_eq!(ship.integrity, t.max_integrity);
  }
}
