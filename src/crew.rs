//! Crew records: named members with a specialty, hired from a planet's
//! roster and paid on a recurring cycle.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Specialty {
  Weapons,
  Engineer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
  pub name: String,
  pub specialty: Specialty,
  pub level: u32,
  pub morale: u32,
  pub fatigue: u32,
  pub xp: u32,
  pub perks: BTreeSet<String>,
  pub unpaid_cycles: u32,
  pub daily_pay: i64,
}

/// XP threshold to advance from `level` to `level + 1`.
#[must_use]
pub fn level_up_threshold(level: u32) -> u32 {
  70 + 35 * level
}

const MILESTONE_LEVELS: [u32; 3] = [3, 5, 7];

impl CrewMember {
  #[must_use]
  pub fn new_hire(name: String, specialty: Specialty, level: u32, daily_pay: i64) -> Self {
    CrewMember {
      name,
      specialty,
      level: level.clamp(1, 8),
      morale: 80,
      fatigue: 0,
      xp: 0,
      perks: BTreeSet::new(),
      unpaid_cycles: 0,
      daily_pay,
    }
  }

  /// Add XP, leveling up (and unlocking a milestone perk) as many times
  /// as the gained XP allows. Caps at level 8.
  pub fn add_xp(&mut self, amount: u32) {
    self.xp += amount;
    while self.level < 8 {
      let threshold = level_up_threshold(self.level);
      if self.xp < threshold {
        break;
      }
      self.xp -= threshold;
      self.level += 1;
      if MILESTONE_LEVELS.contains(&self.level) {
        self.perks.insert(format!("L{}:veteran_{}", self.level, self.specialty));
      }
    }
  }

  pub fn rest(&mut self) {
    self.fatigue = 0;
    self.morale = (self.morale + 5).min(100);
  }

  #[must_use]
  pub fn should_depart(&self) -> bool {
    self.unpaid_cycles >= 7
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn add_xp_levels_up_and_grants_milestone_perk() {
    let mut c = CrewMember::new_hire("Alex".into(), Specialty::Engineer, 2, 10);
    // threshold at level 2 is 70+70=140
    c.add_xp(140);
    assert_eq!(c.level, 3);
    assert!(c.perks.iter().any(|p| p.starts_with("L3:")));
  }

  #[test_log::test]
  fn departs_after_seven_unpaid_cycles() {
    let mut c = CrewMember::new_hire("Sam".into(), Specialty::Weapons, 1, 10);
    c.unpaid_cycles = 6;
    assert!(!c.should_depart());
    c.unpaid_cycles = 7;
    assert!(c.should_depart());
  }
}
