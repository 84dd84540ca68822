//! The economy engine: pricing, momentum/dampening, contraband gating and
//! detection, contracts, port spotlight, planet events, crew pay, the
//! refuel timer, and ship upgrade installs. Organized as pure functions
//! over an injected-params struct, keeping game math out of the
//! aggregate object.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::crew::Specialty;
use crate::error::GameRuleError;
use crate::planet::Planet;
use crate::player::Player;
use crate::rng::{chance, uniform, uniform_int};
use crate::ship::Spaceship;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Momentum {
  pub value: f64,
  pub volume: f64,
  pub last_update: i64,
}

impl Default for Momentum {
  fn default() -> Self {
    Momentum {
      value: 0.0,
      volume: 0.0,
      last_update: 0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
  Buy,
  Sell,
}

impl Momentum {
  /// Decay momentum and volume towards zero by `exp(-decay*dt_hours)`
  /// (linear approximation acceptable per spec), then apply this trade.
  pub fn advance(&mut self, now: i64, decay_per_hour: f64, side: TradeSide, qty: i64, step: f64) {
    let dt_hours = ((now - self.last_update).max(0) as f64) / 3600.0;
    let decay = (-decay_per_hour * dt_hours).exp();
    self.value *= decay;
    self.volume *= decay;
    self.last_update = now;

    let magnitude = step * (qty as f64).sqrt();
    self.value = match side {
      TradeSide::Buy => (self.value + magnitude).clamp(-0.45, 0.45),
      TradeSide::Sell => (self.value - magnitude).clamp(-0.45, 0.45),
    };
    self.volume += (qty as f64).sqrt();
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BribeEntry {
  pub level: u32,
  pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteType {
  Legal,
  Smuggling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
  pub item: String,
  pub source_planet: String,
  pub destination_planet: String,
  pub quantity: i64,
  pub delivered: i64,
  pub reward: i64,
  pub chain_bonus_pct: f64,
  pub created_at: i64,
  pub expires_at: i64,
  pub route_type: RouteType,
  pub arc_id: String,
  pub arc_step: u32,
  pub arc_total_steps: u32,
}

impl Contract {
  #[must_use]
  pub fn is_expired(&self, now: i64) -> bool {
    now >= self.expires_at || self.delivered >= self.quantity
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanetEventKind {
  Festival,
  Embargo,
  Shortage,
  Strike,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetEvent {
  pub kind: PlanetEventKind,
  pub buy_mult: f64,
  pub docking_mult: f64,
  pub contract_mult: f64,
  pub expires_at: i64,
}

impl PlanetEventKind {
  #[must_use]
  pub fn multipliers(self) -> (f64, f64, f64) {
    match self {
      PlanetEventKind::Festival => (0.85, 0.80, 1.20),
      PlanetEventKind::Embargo => (1.30, 1.50, 0.60),
      PlanetEventKind::Shortage => (1.25, 1.10, 1.10),
      PlanetEventKind::Strike => (1.10, 1.00, 0.75),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightDeal {
  pub item: String,
  pub discount_pct: i64,
  pub quantity: i64,
  pub expires_at: i64,
}

/// Per-character economy runtime state: momentum, bribes, heat, active
/// contract, spotlight, and per-planet events. Keyed maps use
/// `"<planet>|<item>"` composite strings to stay JSON-friendly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EconomyState {
  pub momentum: HashMap<String, Momentum>,
  pub bribes: HashMap<String, BribeEntry>,
  pub heat: HashMap<String, i64>,
  pub active_contract: Option<Contract>,
  pub spotlight: HashMap<String, SpotlightDeal>,
  pub planet_events: HashMap<String, PlanetEvent>,
}

fn momentum_key(planet: &str, item: &str) -> String {
  format!("{planet}|{item}")
}

impl EconomyState {
  pub fn touch_momentum(&mut self, planet: &str, item: &str, now: i64, side: TradeSide, qty: i64, cfg: &GameConfig) {
    let entry = self.momentum.entry(momentum_key(planet, item)).or_default();
    entry.advance(now, cfg.get_f64("economy_momentum_decay_per_hour"), side, qty, cfg.get_f64("economy_momentum_trade_step"));
  }

  #[must_use]
  pub fn momentum_multiplier(&self, planet: &str, item: &str, cfg: &GameConfig) -> f64 {
    let Some(m) = self.momentum.get(&momentum_key(planet, item)) else {
      return 1.0;
    };
    let floor = cfg.get_f64("economy_dampening_floor");
    let dampening = (1.0 - cfg.get_f64("economy_dampening_volume_step") * m.volume).max(floor);
    (1.0 + m.value) * dampening
  }

  #[must_use]
  pub fn bribe_level(&self, planet: &str, now: i64) -> u32 {
    self
      .bribes
      .get(planet)
      .filter(|b| b.expires_at == 0 || b.expires_at >= now)
      .map_or(0, |b| b.level)
  }

  pub fn set_bribe(&mut self, planet: &str, level: u32, expires_at: i64) {
    self.bribes.insert(planet.to_string(), BribeEntry { level, expires_at });
  }

  #[must_use]
  pub fn heat_at(&self, planet: &str) -> i64 {
    self.heat.get(planet).copied().unwrap_or(0)
  }

  pub fn add_heat(&mut self, planet: &str, amount: i64) {
    let entry = self.heat.entry(planet.to_string()).or_insert(0);
    *entry = (*entry + amount).clamp(0, 100);
  }

  pub fn decay_heat(&mut self, planet: &str, hours: i64, decay_per_hour: i64) {
    let entry = self.heat.entry(planet.to_string()).or_insert(0);
    *entry = (*entry - decay_per_hour * hours).max(0);
  }
}

/// Derived ship-level tier in `[1,5]` from cost percentile among
/// templates.
#[must_use]
pub fn ship_level(ship_cost: i64, all_template_costs: &[i64]) -> u32 {
  if all_template_costs.is_empty() {
    return 1;
  }
  let mut sorted = all_template_costs.to_vec();
  sorted.sort_unstable();
  let rank = sorted.iter().filter(|&&c| c <= ship_cost).count();
  let pct = rank as f64 / sorted.len() as f64;
  (1 + (pct * 4.999) as u32).clamp(1, 5)
}

#[must_use]
pub fn is_hostile_market(player: &Player, planet: &Planet, now: i64, window_hours: i64) -> bool {
  if planet.owner.as_deref() == Some(player.name.as_str()) {
    return false;
  }
  player
    .attacked_planets
    .get(&planet.name)
    .is_some_and(|&t| now - t <= window_hours * 3600)
}

/// Buy price after hostile surcharge -> spotlight -> planet event ->
/// momentum, applied in that fixed order (Open Question #2).
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn buy_price(
  base_listed: i64,
  planet_name: &str,
  item: &str,
  hostile: bool,
  economy: &EconomyState,
  cfg: &GameConfig,
) -> i64 {
  let mut price = base_listed as f64;

  if hostile {
    price *= cfg.get_f64("planet_price_penalty_multiplier");
  }

  if let Some(deal) = economy.spotlight.get(planet_name) {
    if deal.item == item && deal.quantity > 0 {
      price *= 1.0 - (deal.discount_pct as f64 / 100.0);
    }
  }

  if let Some(event) = economy.planet_events.get(planet_name) {
    price *= event.buy_mult;
  }

  price *= economy.momentum_multiplier(planet_name, item, cfg);

  (price.round() as i64).max(1)
}

/// Sell price starting from the mirrored buy price, with the opposite
/// momentum direction already baked in by the caller's `buy_price` call
/// using inverse momentum, then contraband bonuses.
#[must_use]
pub fn sell_price(
  mirrored_buy_price: i64,
  tier: Option<u32>,
  value_ratio_bonus: f64,
  bribe_level: u32,
  cfg: &GameConfig,
) -> i64 {
  let mut price = mirrored_buy_price as f64;
  if let Some(tier) = tier {
    let tier_step = cfg.get_f64("contraband_price_tier_step");
    price *= 1.0 + (f64::from(tier) - 1.0) * tier_step * 0.55;
    price *= 1.0 + value_ratio_bonus;
    price *= 1.0 + f64::from(bribe_level) * cfg.get_f64("bribe_sell_bonus_per_level");
  }
  (price.round() as i64).max(1)
}

#[must_use]
pub fn salvage_price(base_price: i64, cfg: &GameConfig) -> i64 {
  let mult = cfg.get_f64("salvage_sell_multiplier").clamp(0.05, 1.0);
  ((base_price as f64) * mult).round().max(1.0) as i64
}

/// Detection probability in `[0.01, 0.95]` for a contraband trade.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn detection_probability(
  security_level: u8,
  tier: u32,
  qty: i64,
  heat: i64,
  frontier_standing: i64,
  bribe_level: u32,
  ship_level: u32,
  scan_evasion: f64,
  cfg: &GameConfig,
) -> f64 {
  let base_by_security = 0.10 + f64::from(security_level) * 0.12;
  let tier_mult = 1.0 + (f64::from(tier) - 1.0) * cfg.get_f64("contraband_detection_tier_step");
  let qty_mult = 1.0 + (qty as f64).sqrt() * 0.03;
  let heat_scalar = 1.0 + (heat as f64 / 100.0) * 0.5;
  let frontier_discount = 1.0 - (frontier_standing.max(0) as f64 / 100.0) * cfg.get_f64("frontier_smuggling_detection_reduction_step") * 10.0;
  let bribe_discount = 1.0 - f64::from(bribe_level) * cfg.get_f64("contraband_detection_ship_level_step");
  let ship_discount = 1.0 - (f64::from(ship_level) - 1.0) * cfg.get_f64("contraband_detection_ship_level_step");

  let p = base_by_security * tier_mult * qty_mult * heat_scalar * frontier_discount.max(0.2) * bribe_discount.max(0.2) * ship_discount.max(0.2) * scan_evasion;
  p.clamp(0.01, 0.95)
}

/// Roll detection; on hit, add heat scaled by ship level and return
/// `true`.
pub fn roll_detection(rng: &mut impl rand::RngCore, p: f64, planet_name: &str, economy: &mut EconomyState, ship_level: u32, cfg: &GameConfig) -> bool {
  if !chance(rng, p) {
    return false;
  }
  let step = cfg.get_f64("law_heat_detected_ship_level_step");
  let gain = (cfg.get_f64("law_heat_gain_detected") * (1.0 + (f64::from(ship_level) - 1.0) * step)).round() as i64;
  economy.add_heat(planet_name, gain);
  true
}

/// Generate the next contract, continuing an arc if one is given, else
/// starting a new one.
pub fn generate_contract(
  rng: &mut impl rand::RngCore,
  player: &Player,
  planet: &Planet,
  destination: &str,
  item: &str,
  item_buy_price: i64,
  ship: &Spaceship,
  cfg: &GameConfig,
  now: i64,
  continuing_arc: Option<(&str, u32, u32)>,
) -> Contract {
  let route_type = if player.frontier_standing > player.authority_standing + 8 {
    RouteType::Smuggling
  } else {
    RouteType::Legal
  };

  let cargo_cap = ship.effective_max_cargo().max(1);
  let qty = uniform_int(rng, (cargo_cap / 10).max(1), (cargo_cap / 3).max(2));

  let profit_per_unit = (item_buy_price as f64 * 0.35).max(1.0);
  let chain_bonus = (f64::from(player.contract_chain_streak) * cfg.get_f64("contract_chain_bonus_per_completion"))
    .min(cfg.get_f64("contract_chain_bonus_cap"));
  let event_mult = 1.0;
  let reward = ((profit_per_unit * qty as f64) * cfg.get_f64("trade_contract_reward_multiplier") * (1.0 + chain_bonus) * event_mult)
    .round()
    .max(200.0) as i64;

  let (arc_id, arc_step, arc_total_steps) = match continuing_arc {
    Some((id, step, total)) => (id.to_string(), step + 1, total),
    None => (format!("arc_{now}_{}", uniform_int(rng, 0, 999_999)), 1, uniform_int(rng, 2, 4) as u32),
  };

  Contract {
    item: item.to_string(),
    source_planet: planet.name.clone(),
    destination_planet: destination.to_string(),
    quantity: qty,
    delivered: 0,
    reward,
    chain_bonus_pct: chain_bonus,
    created_at: now,
    expires_at: now + cfg.get_i64("contract_expiry_hours") * 3600,
    route_type,
    arc_id,
    arc_step,
    arc_total_steps,
  }
}

/// Completing a contract step: credits awarded plus the faction-standing
/// shift appropriate to the route type.
pub fn complete_contract_step(player: &mut Player, contract: &Contract) -> i64 {
  let mut payout = contract.reward;
  match contract.route_type {
    RouteType::Legal => {
      player.adjust_authority(3);
      player.adjust_frontier(1);
      payout += (payout as f64 * 0.20).round() as i64;
    }
    RouteType::Smuggling => {
      player.adjust_frontier(4);
      player.adjust_authority(-2);
    }
  }
  player.contract_chain_streak += 1;
  player.credits += payout;
  payout
}

/// Roll a port spotlight deal on travel arrival.
pub fn roll_port_spotlight(rng: &mut impl rand::RngCore, planet: &Planet, items: &[String], now: i64, cfg: &GameConfig) -> Option<SpotlightDeal> {
  if items.is_empty() {
    return None;
  }
  let item = &items[uniform_int(rng, 0, items.len() as i64 - 1) as usize];
  let discount = uniform_int(rng, cfg.get_i64("spotlight_min_discount_pct"), cfg.get_i64("spotlight_max_discount_pct"));
  Some(SpotlightDeal {
    item: item.clone(),
    discount_pct: discount,
    quantity: uniform_int(rng, 3, 12),
    expires_at: now + 6 * 3600,
  })
}

/// Roll a planet event on travel arrival.
pub fn roll_planet_event(rng: &mut impl rand::RngCore, now: i64, cfg: &GameConfig) -> Option<PlanetEvent> {
  if !chance(rng, cfg.get_f64("planet_event_chance")) {
    return None;
  }
  let kind = match uniform_int(rng, 0, 3) {
    0 => PlanetEventKind::Festival,
    1 => PlanetEventKind::Embargo,
    2 => PlanetEventKind::Shortage,
    _ => PlanetEventKind::Strike,
  };
  let (buy_mult, docking_mult, contract_mult) = kind.multipliers();
  let duration_hours = uniform(rng, 2.0, 6.0);
  Some(PlanetEvent {
    kind,
    buy_mult,
    docking_mult,
    contract_mult,
    expires_at: now + (duration_hours * 3600.0) as i64,
  })
}

/// Charge accumulated crew pay if 24h have elapsed; on shortfall,
/// increment unpaid cycles and drop anyone who hits the limit.
pub fn process_crew_pay(player: &mut Player, now: i64, cfg: &GameConfig) -> Result<i64, GameRuleError> {
  let interval = cfg.get_i64("crew_pay_interval_hours") * 3600;
  if now - player.last_crew_pay_time < interval {
    return Ok(0);
  }
  let total_due: i64 = player.crew.values().map(|c| c.daily_pay).sum();
  player.last_crew_pay_time = now;

  if player.credits >= total_due {
    player.credits -= total_due;
    for member in player.crew.values_mut() {
      member.unpaid_cycles = 0;
      member.rest();
    }
    Ok(total_due)
  } else {
    let mut departed: Vec<Specialty> = Vec::new();
    for (specialty, member) in &mut player.crew {
      member.unpaid_cycles += 1;
      if member.should_depart() {
        departed.push(*specialty);
      }
    }
    for specialty in departed {
      player.crew.remove(&specialty);
    }
    Ok(0)
  }
}

/// Refuel-timer gate: `true` if a refuel is currently allowed, resetting
/// the rolling window when it has elapsed.
pub fn check_refuel_allowed(player: &mut Player, now: i64, cfg: &GameConfig) -> bool {
  if !cfg.get_bool("refuel_timer_enabled") {
    return true;
  }
  let window_seconds = (cfg.get_f64("refuel_timer_window_hours") * 3600.0) as i64;
  if player.refuel_window_started_at == 0 || now - player.refuel_window_started_at >= window_seconds {
    player.refuel_window_started_at = now;
    player.refuel_uses_in_window = 0;
  }
  player.refuel_uses_in_window < u32::try_from(cfg.get_i64("refuel_timer_max_refuels")).unwrap_or(3)
}

pub fn record_refuel(player: &mut Player) {
  player.refuel_uses_in_window += 1;
}

#[must_use]
pub fn refuel_cost_multiplier(cfg: &GameConfig) -> f64 {
  if cfg.get_bool("refuel_timer_enabled") {
    cfg.get_f64("refuel_timer_cost_multiplier_pct") / 100.0
  } else {
    1.0
  }
}

/// Apply ship upgrade kits from inventory, consuming the number actually
/// applied (clamped against caps).
pub fn install_upgrade(player: &mut Player, ship: &mut Spaceship, item: &str, requested: i64) -> Result<i64, GameRuleError> {
  let available = player.item_qty(item).min(requested);
  if available <= 0 {
    return Err(GameRuleError::new("NO_UPGRADE_ITEMS"));
  }
  let applied = match item {
    "Cargo Pod" => {
      let room = ship.max_cargo_pods - ship.cargo_pods;
      let n = available.min(room);
      ship.cargo_pods += n;
      n
    }
    "Shield Capacitor" => {
      let room = (ship.max_shields - ship.shields) / 10;
      let n = available.min(room.max(0));
      ship.shields += n * 10;
      n
    }
    "Defender Bay" => {
      let room = ship.max_defenders - ship.defenders;
      let n = available.min(room);
      ship.defenders += n;
      n
    }
    "Nanobot Kit" => {
      let missing = ship.max_integrity - ship.integrity;
      let n = available.min((missing + 49) / 50);
      ship.integrity = (ship.integrity + n * 50).min(ship.max_integrity);
      n
    }
    other => return Err(GameRuleError::new(format!("UNKNOWN_UPGRADE_ITEM: {other}"))),
  };
  if applied > 0 {
    player.add_item(item, -applied);
  }
  Ok(applied)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  #[test_log::test]
  fn momentum_advance_clamps_to_bounds() {
    let mut m = Momentum::default();
    for _ in 0..50 {
      m.advance(0, 0.1, TradeSide::Buy, 100, 0.05);
    }
    assert!(m.value <= 0.45);
  }

  #[test_log::test]
  fn buy_price_applies_hostile_surcharge() {
    let cfg = GameConfig::default();
    let economy = EconomyState::default();
    let base = buy_price(100, "Alderon", "Ore", false, &economy, &cfg);
    let hostile = buy_price(100, "Alderon", "Ore", true, &economy, &cfg);
    assert!(hostile > base);
  }

  #[test_log::test]
  fn detection_probability_is_bounded() {
    let cfg = GameConfig::default();
    let p = detection_probability(2, 5, 100, 100, -100, 0, 1, 0.5, &cfg);
    assert!((0.01..=0.95).contains(&p));
  }

  #[test_log::test]
  fn crew_pay_drops_member_after_seven_unpaid_cycles() {
    let mut player = Player::new("Jane".into(), 0, "Alderon".into());
    let cfg = GameConfig::default();
    player.crew.insert(
      Specialty::Engineer,
      crate::crew::CrewMember::new_hire("Bob".into(), Specialty::Engineer, 1, 50),
    );
    let mut now = 0;
    for _ in 0..8 {
      now += cfg.get_i64("crew_pay_interval_hours") * 3600;
      let _ = process_crew_pay(&mut player, now, &cfg);
    }
    assert!(!player.crew.contains_key(&Specialty::Engineer));
  }

  #[test_log::test]
  fn refuel_timer_blocks_after_max_uses() {
    let mut player = Player::new("Jane".into(), 0, "Alderon".into());
    let cfg = GameConfig::default();
    let max = cfg.get_i64("refuel_timer_max_refuels");
    for _ in 0..max {
      assert!(check_refuel_allowed(&mut player, 0, &cfg));
      record_refuel(&mut player);
    }
    assert!(!check_refuel_allowed(&mut player, 0, &cfg));
  }

  #[test_log::test]
  fn install_upgrade_is_capped_at_max() {
    let mut player = Player::new("Jane".into(), 0, "Alderon".into());
    let t = &crate::ship::default_templates()[0];
    let mut ship = Spaceship::from_template(t);
    player.add_item("Cargo Pod", 100);
    let room = ship.max_cargo_pods - ship.cargo_pods;
    let applied = install_upgrade(&mut player, &mut ship, "Cargo Pod", 100).unwrap();
    assert_eq!(applied, room);
    assert_eq!(ship.cargo_pods, ship.max_cargo_pods);
  }

  #[test_log::test]
  fn arc_continues_with_same_id() {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
    let player = Player::new("Jane".into(), 0, "Alderon".into());
    let planet = test_planet("Alderon");
    let t = &crate::ship::default_templates()[0];
    let ship = Spaceship::from_template(t);
    let cfg = GameConfig::default();
    let first = generate_contract(&mut rng, &player, &planet, "Brightwater", "Ore", 100, &ship, &cfg, 0, None);
    let second = generate_contract(&mut rng, &player, &planet, "Brightwater", "Ore", 100, &ship, &cfg, 100, Some((&first.arc_id, first.arc_step, first.arc_total_steps)));
    assert_eq!(first.arc_id, second.arc_id);
    assert_eq!(second.arc_step, 2);
  }

  fn test_planet(name: &str) -> Planet {
    Planet {
      name: name.to_string(),
      x: 0.0,
      y: 0.0,
      population: 1000,
      description: String::new(),
      vendor: true,
      bank: true,
      crew_services: true,
      is_smuggler_hub: false,
      npc_name: "Bren".into(),
      npc_personality: "gruff".into(),
      docking_fee: 10,
      bribe_cost: 100,
      security_level: 1,
      owner: None,
      defenders: 10,
      shields: 10,
      max_defenders: 40,
      max_shields: 40,
      base_defenders: 10,
      base_shields: 10,
      credit_balance: 0,
      credits_initialized: false,
      last_credit_interest_time: 0,
      last_defense_regen_time: 0,
      repair_multiplier: None,
      item_modifiers: HashMap::new(),
      smuggling_inventory: HashMap::new(),
    }
  }
}
