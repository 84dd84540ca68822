//! Round-based combat: roll to hit, apply damage in a fixed order,
//! across ship-vs-ship and ship-vs-planet engagements.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::combat_tables as tables;
use crate::config::GameConfig;
use crate::error::GameRuleError;
use crate::rng::{chance, uniform, uniform_int};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
  Npc,
  Player,
  Planet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStatus {
  Active,
  Won,
  Lost,
  Fled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideStats {
  pub shields: i64,
  pub defenders: i64,
  pub integrity: i64,
  pub max_integrity: i64,
  pub credits: i64,
}

impl SideStats {
  #[must_use]
  pub fn is_defeated(&self) -> bool {
    self.shields <= 0 && self.defenders <= 0
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
  pub target_type: TargetType,
  pub target_name: String,
  pub player_start: SideStats,
  pub target_start: SideStats,
  pub player_current: SideStats,
  pub target_current: SideStats,
  pub log: Vec<String>,
  pub enemy_scale: f64,
  pub pre_fight_streak: u32,
  pub status: CombatStatus,
  /// Current population, snapshotted at session start; only set when
  /// `target_type` is `Planet`.
  pub target_population: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
  pub player_damage_dealt: i64,
  pub target_damage_dealt: i64,
  pub log_lines: Vec<String>,
  pub status: CombatStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct VictoryPayout {
  pub loot_credits: i64,
  pub looted_items: Vec<(String, i64)>,
  pub rare_drop: bool,
  pub bounty: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefeatPenalty {
  pub credits_lost: i64,
  pub items_lost: Vec<(String, i64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleePenalty {
  pub credits_lost: i64,
  pub barred: bool,
}

#[must_use]
pub fn start_combat_session(
  target_type: TargetType,
  target_name: String,
  player_stats: SideStats,
  target_stats: SideStats,
  enemy_scale: f64,
  pre_fight_streak: u32,
  target_population: Option<i64>,
) -> CombatSession {
  CombatSession {
    target_type,
    target_name,
    player_start: player_stats.clone(),
    target_start: target_stats.clone(),
    player_current: player_stats,
    target_current: target_stats,
    log: Vec::new(),
    enemy_scale,
    pre_fight_streak,
    status: CombatStatus::Active,
    target_population,
  }
}

struct AttackRoll {
  hit: bool,
  critical: bool,
  damage: f64,
}

fn roll_attack(rng: &mut impl rand::RngCore, committed: i64, hit_bonus: f64) -> AttackRoll {
  let hit_chance = (tables::BASE_HIT_CHANCE + hit_bonus).clamp(tables::MIN_HIT_CHANCE, tables::MAX_HIT_CHANCE);
  let hit = chance(rng, hit_chance);
  if hit {
    let base = uniform(
      rng,
      committed as f64 * tables::HIT_DAMAGE_MIN_PER_FIGHTER,
      committed as f64 * tables::HIT_DAMAGE_MAX_PER_FIGHTER,
    );
    let critical = chance(rng, tables::CRITICAL_CHANCE);
    let damage = if critical { base * tables::CRITICAL_MULTIPLIER } else { base };
    AttackRoll { hit, critical, damage }
  } else {
    let damage = uniform(rng, 0.0, committed as f64 * tables::GRAZE_DAMAGE_MAX_PER_FIGHTER);
    AttackRoll { hit, critical: false, damage }
  }
}

/// Resolve one round: both sides commit, attack, and damage applies
/// simultaneously. `player_committed` is clamped to current defenders
/// (at least 1 if any remain).
pub fn resolve_combat_round(
  session: &mut CombatSession,
  player_committed: i64,
  rng: &mut impl rand::RngCore,
  player_hit_bonus: f64,
  target_hit_bonus: f64,
) -> Result<RoundOutcome, GameRuleError> {
  if session.status != CombatStatus::Active {
    return Err(GameRuleError::new("COMBAT_NOT_ACTIVE"));
  }

  let player_committed = if session.player_current.defenders > 0 {
    player_committed.clamp(1, session.player_current.defenders)
  } else {
    0
  };
  let target_committed = if session.target_current.defenders > 0 {
    let raw = uniform_int(rng, 1, session.target_current.defenders.max(1));
    ((raw as f64) * session.enemy_scale).round() as i64
  } else {
    0
  };

  let player_roll = roll_attack(rng, player_committed, player_hit_bonus);
  let target_roll = roll_attack(rng, target_committed, target_hit_bonus);

  // Simultaneous: snapshot deltas before mutating either side.
  let player_dealt = player_roll.damage;
  let target_dealt = target_roll.damage;

  let player_defender_loss_roll = uniform(rng, 0.0, tables::DEFENDER_LOSS_RANDOM_MAX);
  let target_defender_loss_roll = uniform(rng, 0.0, tables::DEFENDER_LOSS_RANDOM_MAX);

  apply_damage_with_jitter(&mut session.target_current, player_dealt, player_defender_loss_roll);
  apply_damage_with_jitter(&mut session.player_current, target_dealt, target_defender_loss_roll);

  let mut log_lines = Vec::new();
  log_lines.push(format!(
    "You commit {player_committed} fighters: {} for {:.0} damage{}.",
    if player_roll.hit { "hit" } else { "miss" },
    player_dealt,
    if player_roll.critical { " (critical)" } else { "" }
  ));
  log_lines.push(format!(
    "{} commits {target_committed} fighters: {} for {:.0} damage{}.",
    session.target_name,
    if target_roll.hit { "hit" } else { "miss" },
    target_dealt,
    if target_roll.critical { " (critical)" } else { "" }
  ));

  let player_defeated = session.player_current.is_defeated();
  let target_defeated = session.target_current.is_defeated();

  session.status = if target_defeated {
    CombatStatus::Won
  } else if player_defeated {
    CombatStatus::Lost
  } else {
    CombatStatus::Active
  };

  session.log.extend(log_lines.clone());

  Ok(RoundOutcome {
    player_damage_dealt: player_dealt.round() as i64,
    target_damage_dealt: target_dealt.round() as i64,
    log_lines,
    status: session.status,
  })
}

fn apply_damage_with_jitter(side: &mut SideStats, damage: f64, jitter: f64) {
  let mut remaining = damage;
  if side.shields > 0 {
    let absorbed = remaining.min(side.shields as f64);
    side.shields -= absorbed.round() as i64;
    remaining -= absorbed;
  }
  if remaining <= 0.0 {
    return;
  }
  if side.defenders <= 0 {
    side.integrity = (side.integrity - remaining.round() as i64).max(0);
    return;
  }
  let fighter_loss = ((remaining / tables::DEFENDER_LOSS_DAMAGE_DIVISOR + jitter).max(1.0) as i64).min(side.defenders);
  side.defenders -= fighter_loss;
  if side.defenders == 0 {
    let residual = remaining * tables::INTEGRITY_BLEED_RATE;
    side.integrity = (side.integrity - residual.round() as i64).max(0);
  }
}

/// Take a proportional slice of `inventory`'s item types, scaled down to
/// fit within `cargo_cap_remaining` if the proportional take would
/// overflow it.
fn loot_items_proportionally(inventory: &HashMap<String, i64>, cargo_cap_remaining: i64, rng: &mut impl rand::RngCore) -> Vec<(String, i64)> {
  if cargo_cap_remaining <= 0 || inventory.is_empty() {
    return Vec::new();
  }
  let pct = uniform(rng, tables::VICTORY_ITEM_LOOT_MIN_PCT, tables::VICTORY_ITEM_LOOT_MAX_PCT);
  let mut names: Vec<&String> = inventory.keys().collect();
  names.sort();
  let mut looted: Vec<(String, i64)> = names
    .into_iter()
    .filter_map(|name| {
      let qty = inventory[name];
      let take = ((qty as f64) * pct).round() as i64;
      if take > 0 {
        Some((name.clone(), take))
      } else {
        None
      }
    })
    .collect();

  let total: i64 = looted.iter().map(|(_, q)| *q).sum();
  if total > cargo_cap_remaining {
    let scale = cargo_cap_remaining as f64 / total as f64;
    for (_, q) in &mut looted {
      *q = ((*q as f64) * scale).floor() as i64;
    }
    looted.retain(|(_, q)| *q > 0);
  }
  looted
}

#[must_use]
pub fn resolve_victory(
  session: &CombatSession,
  rng: &mut impl rand::RngCore,
  cargo_cap_remaining: i64,
  is_hostile_npc: bool,
  authority_standing: i64,
  target_inventory: &HashMap<String, i64>,
) -> VictoryPayout {
  let base_loot = (session.target_start.credits as f64 * uniform(rng, tables::VICTORY_LOOT_MIN_PCT, tables::VICTORY_LOOT_MAX_PCT)).round();
  let streak_bonus = (f64::from(session.pre_fight_streak) * 0.05).min(0.50) * base_loot;
  let challenge_bonus = (session.enemy_scale - 1.0).max(0.0) * tables::CHALLENGE_BONUS_SCALE * base_loot;
  let mut loot = (base_loot + streak_bonus + challenge_bonus).round() as i64;

  let bounty = if is_hostile_npc {
    (loot as f64 * (authority_standing.max(0) as f64 / 200.0)).round() as i64
  } else {
    0
  };
  loot += bounty;

  let mut looted_items = loot_items_proportionally(target_inventory, cargo_cap_remaining, rng);

  let rare_drop = chance(rng, tables::RARE_DROP_CHANCE);
  if rare_drop {
    let looted_qty: i64 = looted_items.iter().map(|(_, q)| *q).sum();
    if cargo_cap_remaining - looted_qty > 0 {
      looted_items.push((tables::RARE_DROP_ITEM_NAME.to_string(), 1));
    }
  }

  VictoryPayout {
    loot_credits: loot,
    looted_items,
    rare_drop,
    bounty,
  }
}

#[must_use]
pub fn resolve_defeat(player_credits: i64, player_inventory: &HashMap<String, i64>, rng: &mut impl rand::RngCore) -> DefeatPenalty {
  let lost = (player_credits as f64 * uniform(rng, tables::DEFEAT_CREDIT_LOSS_MIN_PCT, tables::DEFEAT_CREDIT_LOSS_MAX_PCT)).round() as i64;

  let mut names: Vec<&String> = player_inventory.keys().collect();
  for i in (1..names.len()).rev() {
    let j = uniform_int(rng, 0, i as i64) as usize;
    names.swap(i, j);
  }
  let n_types = uniform_int(rng, 0, tables::DEFEAT_MAX_ITEM_TYPES_LOST as i64) as usize;
  let mut items_lost = Vec::new();
  for name in names.into_iter().take(n_types) {
    let qty = player_inventory[name];
    let pct = uniform(rng, tables::DEFEAT_ITEM_LOSS_MIN_PCT, tables::DEFEAT_ITEM_LOSS_MAX_PCT);
    let lost_qty = ((qty as f64) * pct).round() as i64;
    if lost_qty > 0 {
      items_lost.push((name.clone(), lost_qty));
    }
  }

  DefeatPenalty {
    credits_lost: lost,
    items_lost,
  }
}

#[must_use]
pub fn resolve_flee(player_credits: i64, rng: &mut impl rand::RngCore, target_is_hostile_owned_planet: bool) -> FleePenalty {
  let lost = (player_credits as f64 * uniform(rng, tables::FLEE_PENALTY_MIN_PCT, tables::FLEE_PENALTY_MAX_PCT)).round() as i64;
  FleePenalty {
    credits_lost: lost,
    barred: target_is_hostile_owned_planet,
  }
}

/// Fire the special planet-combat weapon: reduces population/treasury and
/// deals amplified damage from a synthetic attack. Never valid outside an
/// active planet-combat session (enforced by the caller via `session.status`
/// and `session.target_type`).
pub fn fire_special_weapon(
  session: &mut CombatSession,
  rng: &mut impl rand::RngCore,
  cfg: &GameConfig,
) -> Result<(i64, i64), GameRuleError> {
  if session.status != CombatStatus::Active || session.target_type != TargetType::Planet {
    return Err(GameRuleError::new("SPECIAL_WEAPON_INVALID_TARGET"));
  }
  if !cfg.get_bool("enable_special_weapons") {
    return Err(GameRuleError::new("SPECIAL_WEAPONS_DISABLED"));
  }

  let committed = (session.target_current.defenders / 3).max(1);
  let base = uniform(rng, committed as f64 * tables::HIT_DAMAGE_MIN_PER_FIGHTER, committed as f64 * tables::HIT_DAMAGE_MAX_PER_FIGHTER);
  let damage = base * cfg.get_f64("combat_special_weapon_damage_multiplier");
  apply_damage_with_jitter(&mut session.target_current, damage, uniform(rng, 0.0, tables::DEFENDER_LOSS_RANDOM_MAX));

  let pop_pct = uniform(rng, cfg.get_f64("combat_special_weapon_pop_reduction_min"), cfg.get_f64("combat_special_weapon_pop_reduction_max"));
  let current_pop = session.target_population.unwrap_or(0);
  let pop_loss = (current_pop as f64 * pop_pct).round() as i64;
  session.target_population = Some((current_pop - pop_loss).max(0));
  let treasury_loss = (session.target_current.credits as f64 * pop_pct).round() as i64;
  session.target_current.credits = (session.target_current.credits - treasury_loss).max(0);

  if session.target_current.is_defeated() {
    session.status = CombatStatus::Won;
  }

  Ok((damage.round() as i64, pop_loss))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn stats(shields: i64, defenders: i64, integrity: i64, credits: i64) -> SideStats {
    SideStats {
      shields,
      defenders,
      integrity,
      max_integrity: integrity,
      credits,
    }
  }

  #[test_log::test]
  fn damage_order_drains_shields_before_defenders() {
    let mut side = stats(20, 10, 100, 0);
    apply_damage_with_jitter(&mut side, 15.0, 1.0);
    assert_eq!(side.shields, 5);
    assert_eq!(side.defenders, 10);
  }

  #[test_log::test]
  fn defenders_reduced_and_integrity_bleeds_when_zeroed() {
    let mut side = stats(0, 2, 100, 0);
    apply_damage_with_jitter(&mut side, 100.0, 0.0);
    assert_eq!(side.defenders, 0);
    assert!(side.integrity < 100);
  }

  #[test_log::test]
  fn resolve_round_declares_winner_when_target_defeated() {
    let mut session = start_combat_session(
      TargetType::Npc,
      "Raider".into(),
      stats(100, 50, 100, 0),
      stats(0, 1, 10, 5000),
      1.0,
      0,
      None,
    );
    let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
    let mut outcome = resolve_combat_round(&mut session, 10, &mut rng, 1.0, -1.0).unwrap();
    let mut guard = 0;
    while outcome.status == CombatStatus::Active && guard < 20 {
      outcome = resolve_combat_round(&mut session, 10, &mut rng, 1.0, -1.0).unwrap();
      guard += 1;
    }
    assert_ne!(session.status, CombatStatus::Active);
  }

  #[test_log::test]
  fn victory_loots_inventory_within_cargo_cap() {
    let session = start_combat_session(
      TargetType::Player,
      "Rival".into(),
      stats(100, 50, 100, 0),
      stats(0, 0, 10, 5000),
      1.0,
      0,
      None,
    );
    let mut inventory = HashMap::new();
    inventory.insert("Ore".to_string(), 100);
    inventory.insert("Spice".to_string(), 40);
    let mut rng = rand::rngs::SmallRng::seed_from_u64(3);
    let payout = resolve_victory(&session, &mut rng, 20, false, 0, &inventory);
    let total: i64 = payout.looted_items.iter().map(|(_, q)| *q).sum();
    assert!(total <= 20);
  }

  #[test_log::test]
  fn defeat_never_loses_more_item_types_than_owned() {
    let mut inventory = HashMap::new();
    inventory.insert("Ore".to_string(), 10);
    let mut rng = rand::rngs::SmallRng::seed_from_u64(9);
    let penalty = resolve_defeat(1000, &inventory, &mut rng);
    assert!(penalty.items_lost.len() <= inventory.len());
    for (name, qty) in &penalty.items_lost {
      assert!(*qty <= inventory[name]);
    }
  }

  #[test_log::test]
  fn special_weapon_reduces_planet_population_and_treasury() {
    let mut session = start_combat_session(
      TargetType::Planet,
      "Alderon".into(),
      stats(100, 50, 100, 0),
      stats(30, 40, 200, 10_000),
      1.0,
      0,
      Some(2_000_000),
    );
    let cfg = GameConfig::default();
    let mut rng = rand::rngs::SmallRng::seed_from_u64(4);
    let (_, pop_loss) = fire_special_weapon(&mut session, &mut rng, &cfg).unwrap();
    assert!(pop_loss > 0);
    assert_eq!(session.target_population, Some(2_000_000 - pop_loss));
    assert!(session.target_current.credits < 10_000);
  }

  #[test_log::test]
  fn special_weapon_rejected_outside_planet_combat() {
    let mut session = start_combat_session(
      TargetType::Npc,
      "Raider".into(),
      stats(100, 50, 100, 0),
      stats(100, 50, 100, 5000),
      1.0,
      0,
      None,
    );
    let cfg = GameConfig::default();
    let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
    assert!(fire_special_weapon(&mut session, &mut rng, &cfg).is_err());
  }
}
