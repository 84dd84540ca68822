//! The per-character `Game` aggregate and the process-wide `AppState` it
//! is built from. `Game` is a thin object that wraps the mutable game
//! state and exposes `new_game`/`load_game`/`save_game`, while shared
//! stores (universe, news, campaign, analytics, accounts) live once per
//! process behind `Arc`.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::account::AccountStore;
use crate::analytics::{AnalyticsEvent, AnalyticsStore};
use crate::campaign::{CampaignStore, CommanderStanding};
use crate::combat::CombatSession;
use crate::config::GameConfig;
use crate::economy::EconomyState;
use crate::error::AccountError;
use crate::mail::Message;
use crate::news::NewsStore;
use crate::planet::{coords_from_name, Planet};
use crate::player::Player;
use crate::ship::{default_templates, ShipTemplate, Spaceship};
use crate::universe::UniverseStore;
use crate::{info, warn};

/// Shared, process-wide state every session's `Game` reads through. Built
/// once in `main.rs` and handed to every connection as an `Arc`.
pub struct AppState {
  pub config: GameConfig,
  pub accounts: AccountStore,
  pub universe: UniverseStore,
  pub news: NewsStore,
  pub campaign: CampaignStore,
  pub analytics: Mutex<AnalyticsStore>,
  pub templates: Vec<ShipTemplate>,
  pub planet_catalog: Vec<PlanetSeed>,
  pub test_mode: bool,
}

/// Static generation data for a planet, loaded once at startup; the
/// runtime `Planet` is built from this plus the shared universe overlay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanetSeed {
  pub name: String,
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
  pub base_defenders: i64,
  pub base_shields: i64,
  pub max_defenders: i64,
  pub max_shields: i64,
}

#[must_use]
pub fn default_planet_seeds() -> Vec<PlanetSeed> {
  let raw = [
    ("Alderon", 2_000_000, false, true, true, false, 1u8),
    ("Brightwater", 800_000, true, true, false, false, 0),
    ("Coriolis Drift", 15_000, false, false, true, true, 0),
    ("Duskhaven", 4_500_000, true, true, false, false, 2),
    ("Emberfall", 120_000, true, false, true, false, 1),
  ];
  raw
    .into_iter()
    .map(|(name, population, vendor, bank, crew_services, smuggler, security)| PlanetSeed {
      name: name.to_string(),
      population,
      description: format!("The sector world of {name}."),
      vendor,
      bank,
      crew_services,
      is_smuggler_hub: smuggler,
      npc_name: format!("Station Chief {name}"),
      npc_personality: "businesslike".to_string(),
      docking_fee: 25,
      bribe_cost: 500,
      security_level: security,
      base_defenders: 20,
      base_shields: 30,
      max_defenders: 200,
      max_shields: 300,
    })
    .collect()
}

impl AppState {
  /// Build the shared state from disk at `data_root`.
  pub fn load(data_root: PathBuf, config: GameConfig, test_mode: bool) -> std::io::Result<Self> {
    let saves = data_root.join("saves");
    std::fs::create_dir_all(&saves)?;
    let accounts = AccountStore::new(saves.join("accounts"), config.get_bool("allow_multiple_games"));
    let universe = UniverseStore::load(saves.join("universe_planets.json"))?;
    let news = NewsStore::load(saves.join("galactic_news.json"))?;
    let campaign = CampaignStore::load(saves.join("winner_board.json"))?;
    let analytics = AnalyticsStore::load(saves.join("analytics_metrics.json"), &config)?;

    Ok(AppState {
      config,
      accounts,
      universe,
      news,
      campaign,
      analytics: Mutex::new(analytics),
      templates: default_templates(),
      planet_catalog: default_planet_seeds(),
      test_mode,
    })
  }

  /// Build a full `Planet` for `name` by combining static seed data with
  /// the shared universe overlay, which exclusively owns
  /// ownership/garrison/treasury fields.
  #[must_use]
  pub fn build_planet(&self, name: &str) -> Option<Planet> {
    let seed = self.planet_catalog.iter().find(|p| p.name == name)?;
    let state = self
      .universe
      .get_or_init(&seed.name, seed.base_defenders, seed.base_shields, seed.max_shields);
    let (x, y) = coords_from_name(&seed.name);
    Some(Planet {
      name: seed.name.clone(),
      x,
      y,
      population: (seed.population + state.population_delta).max(0),
      description: seed.description.clone(),
      vendor: seed.vendor,
      bank: seed.bank,
      crew_services: seed.crew_services,
      is_smuggler_hub: seed.is_smuggler_hub,
      npc_name: seed.npc_name.clone(),
      npc_personality: seed.npc_personality.clone(),
      docking_fee: seed.docking_fee,
      bribe_cost: seed.bribe_cost,
      security_level: seed.security_level,
      owner: state.owner,
      defenders: state.defenders,
      shields: state.shields,
      max_defenders: seed.max_defenders,
      max_shields: state.max_shields,
      base_defenders: seed.base_defenders,
      base_shields: seed.base_shields,
      credit_balance: state.credit_balance,
      credits_initialized: state.credits_initialized,
      last_credit_interest_time: state.last_credit_interest_time,
      last_defense_regen_time: state.last_defense_regen_time,
      repair_multiplier: None,
      item_modifiers: HashMap::new(),
      smuggling_inventory: HashMap::new(),
    })
  }

  pub fn record_analytics(&self, event: AnalyticsEvent) {
    let mut guard = self.analytics.lock().unwrap();
    guard.record(event);
  }

  /// Evaluate campaign victory and (idempotently) execute any due reset,
  /// purging commander saves while preserving account files.
  pub fn run_campaign_tick(&self, now: i64) -> std::io::Result<()> {
    let standings = self.collect_standings()?;
    if let Ok(Some(winner)) = self.campaign.evaluate_victory(&standings, &self.config, now) {
      let body = format!("Commander {winner} has met the conditions for galactic dominance. Reset is scheduled.");
      self.news.append(crate::news::NewsEntry {
        id: format!("news_{now}"),
        timestamp: now,
        event_type: "victory".to_string(),
        title: "A New Ruler Rises".to_string(),
        body,
        planet: None,
        audience: crate::news::Audience::Global,
        player: None,
      })?;
    }

    if self.campaign.take_due_reset(now)? {
      self.execute_reset()?;
    }
    Ok(())
  }

  fn collect_standings(&self) -> std::io::Result<Vec<CommanderStanding>> {
    let snapshot = self.universe.snapshot();
    let total_planet_count = self.planet_catalog.len();
    let mut by_owner: HashMap<String, usize> = HashMap::new();
    for state in snapshot.planet_states.values() {
      if let Some(owner) = &state.owner {
        *by_owner.entry(owner.clone()).or_insert(0) += 1;
      }
    }

    let mut standings = Vec::new();
    for (owner, owned_planet_count) in by_owner {
      if let Some((authority, frontier)) = self.read_character_standings(&owner) {
        standings.push(CommanderStanding {
          name: owner,
          owned_planet_count,
          total_planet_count,
          authority_standing: authority,
          frontier_standing: frontier,
        });
      }
    }
    Ok(standings)
  }

  fn read_character_standings(&self, display_name: &str) -> Option<(i64, i64)> {
    for account_dir in std::fs::read_dir(self.accounts.root()).ok()?.filter_map(Result::ok) {
      let path = account_dir.path();
      if !path.is_dir() {
        continue;
      }
      for entry in std::fs::read_dir(&path).ok()?.filter_map(Result::ok) {
        let file = entry.path();
        if file.file_name().and_then(|n| n.to_str()) == Some("ACCOUNT.json") {
          continue;
        }
        let Ok(raw) = std::fs::read_to_string(&file) else { continue };
        let Ok(snapshot) = serde_json::from_str::<CharacterSnapshot>(&raw) else { continue };
        if snapshot.player.name == display_name {
          return Some((snapshot.player.authority_standing, snapshot.player.frontier_standing));
        }
      }
    }
    None
  }

  /// Restore every planet to base state and delete commander saves,
  /// preserving `ACCOUNT.json` files.
  fn execute_reset(&self) -> std::io::Result<()> {
    let mut bases = HashMap::new();
    for seed in &self.planet_catalog {
      bases.insert(seed.name.clone(), (seed.base_defenders, seed.base_shields, seed.max_shields));
    }
    self.universe.reset_all(&bases)?;

    for account_dir in std::fs::read_dir(self.accounts.root())?.filter_map(Result::ok) {
      let path = account_dir.path();
      if !path.is_dir() {
        continue;
      }
      for entry in std::fs::read_dir(&path)?.filter_map(Result::ok) {
        let file = entry.path();
        if file.file_name().and_then(|n| n.to_str()) == Some("ACCOUNT.json") {
          continue;
        }
        std::fs::remove_file(&file).ok();
      }
    }
    info!("Campaign reset executed");
    Ok(())
  }
}

#[derive(Debug, Deserialize)]
struct CharacterSnapshot {
  player: Player,
}

/// The full per-character snapshot persisted to
/// `<account>/<character>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSave {
  pub account_name: String,
  pub character_name: String,
  pub last_save_timestamp: i64,
  pub player: Player,
  pub ship: Spaceship,
  pub economy: EconomyState,
}

/// The live, mutable per-character game instance a session holds for the
/// duration it has a character loaded.
pub struct Game {
  pub account_safe: String,
  pub character_safe: String,
  pub player: Player,
  pub ship: Spaceship,
  pub economy: EconomyState,
  pub combat_session: Option<CombatSession>,
}

impl Game {
  /// Start a brand-new character save.
  pub fn new_game(state: &Arc<AppState>, account_safe: &str, character_safe: &str, display_name: &str) -> Self {
    let home_planet = state
      .planet_catalog
      .first()
      .map_or_else(|| "Alderon".to_string(), |p| p.name.clone());
    let template = state.templates.first().expect("at least one ship template");

    Game {
      account_safe: account_safe.to_string(),
      character_safe: character_safe.to_string(),
      player: Player::new(display_name.to_string(), 2_000, home_planet),
      ship: Spaceship::from_template(template),
      economy: EconomyState::default(),
      combat_session: None,
    }
  }

  /// Load an existing character save from `<account>/<character>.json`.
  pub fn load_game(state: &Arc<AppState>, account_safe: &str, character_safe: &str) -> Result<Self, AccountError> {
    state.run_campaign_tick(chrono::Utc::now().timestamp()).ok();
    let path = state.accounts.character_path(account_safe, character_safe);
    let raw = std::fs::read_to_string(&path).map_err(|_| AccountError::NoAccount)?;
    let save: CharacterSave = serde_json::from_str(&raw).map_err(|_| AccountError::CorruptSave)?;
    Ok(Game {
      account_safe: account_safe.to_string(),
      character_safe: character_safe.to_string(),
      player: save.player,
      ship: save.ship,
      economy: save.economy,
      combat_session: None,
    })
  }

  /// Persist this character, then evaluate campaign victory.
  pub fn save_game(&self, state: &Arc<AppState>) -> Result<(), AccountError> {
    let now = chrono::Utc::now().timestamp();
    let path = state.accounts.character_path(&self.account_safe, &self.character_safe);
    let save = CharacterSave {
      account_name: self.account_safe.clone(),
      character_name: self.player.name.clone(),
      last_save_timestamp: now,
      player: self.player.clone(),
      ship: self.ship.clone(),
      economy: self.economy.clone(),
    };
    crate::account::atomic_write_json(&path, &save)?;

    if let Err(e) = state.run_campaign_tick(now) {
      warn!("campaign tick failed after save: {e}");
    }
    Ok(())
  }

  pub fn mailbox_deliver(&mut self, msg: Message) {
    crate::mail::deliver(&mut self.player, msg);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!(
      "sector_game_test_{}_{}",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ))
  }

  fn build_state() -> (Arc<AppState>, PathBuf) {
    let root = temp_root();
    let state = AppState::load(root.clone(), GameConfig::default(), true).unwrap();
    (Arc::new(state), root)
  }

  #[test_log::test]
  fn new_game_starts_with_first_template_and_planet() {
    let (state, root) = build_state();
    let game = Game::new_game(&state, "jane", "jane", "Jane");
    assert_eq!(game.player.credits, 2_000);
    assert_eq!(game.ship.model, state.templates[0].model);
    std::fs::remove_dir_all(&root).ok();
  }

  #[test_log::test]
  fn save_then_load_round_trips_player_state() {
    let (state, root) = build_state();
    state.accounts.create_account("jane", "pw", "jane").unwrap();
    let mut game = Game::new_game(&state, "jane", "jane", "Jane");
    game.player.credits = 9_999;
    game.save_game(&state).unwrap();

    let loaded = Game::load_game(&state, "jane", "jane").unwrap();
    assert_eq!(loaded.player.credits, 9_999);
    std::fs::remove_dir_all(&root).ok();
  }

  #[test_log::test]
  fn build_planet_overlays_universe_state() {
    let (state, root) = build_state();
    let name = state.planet_catalog[0].name.clone();
    state
      .universe
      .with_mutate(&name, 20, 30, 300, |s| s.owner = Some("jane".to_string()))
      .unwrap();
    let planet = state.build_planet(&name).unwrap();
    assert_eq!(planet.owner.as_deref(), Some("jane"));
    std::fs::remove_dir_all(&root).ok();
  }
}
