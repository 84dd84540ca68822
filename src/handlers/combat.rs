//! Combat: orbit targets, round resolution, fleeing, and the special
//! weapon.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::account::atomic_write_json;
use crate::combat::{self, CombatStatus, SideStats, TargetType};
use crate::crew::Specialty;
use crate::economy;
use crate::game::{AppState, CharacterSave};
use crate::mail;
use crate::news::{Audience, NewsEntry};
use crate::payloads::ActionResponse;
use crate::rng::{new_rng, uniform_int};
use crate::session::Session;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

fn num(params: &Value, key: &str) -> Option<i64> {
  params.get(key).and_then(Value::as_i64)
}

fn player_side_stats(game: &crate::game::Game) -> SideStats {
  SideStats {
    shields: game.ship.shields,
    defenders: game.ship.defenders,
    integrity: game.ship.integrity,
    max_integrity: game.ship.max_integrity,
    credits: game.player.credits,
  }
}

fn find_player_target(state: &Arc<AppState>, display_name: &str) -> Option<(PathBuf, CharacterSave)> {
  for account_dir in std::fs::read_dir(state.accounts.root()).ok()?.filter_map(Result::ok) {
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
      let Ok(save) = serde_json::from_str::<CharacterSave>(&raw) else { continue };
      if save.player.name == display_name {
        return Some((file, save));
      }
    }
  }
  None
}

/// Transfer ownership of `target_name` to the winning player through the
/// shared universe store, regenerate its garrison to base, broadcast the
/// conquest, and notify whoever held it before.
fn conquer_planet(state: &Arc<AppState>, game: &mut crate::game::Game, target_name: &str, population_after: Option<i64>, treasury_after: i64) {
  let Some(seed) = state.planet_catalog.iter().find(|p| p.name == target_name) else {
    return;
  };
  let n = now();
  let winner = game.player.name.clone();
  let previous_owner = state
    .universe
    .with_mutate(target_name, seed.base_defenders, seed.base_shields, seed.max_shields, |s| {
      let previous = s.owner.clone();
      s.owner = Some(winner.clone());
      s.defenders = seed.base_defenders;
      s.shields = seed.base_shields;
      s.last_defense_regen_time = n;
      if let Some(pop) = population_after {
        s.population_delta = pop - seed.population;
      }
      s.credit_balance = treasury_after;
      s.credits_initialized = true;
      previous
    })
    .ok()
    .flatten();

  game.player.owned_planets.insert(target_name.to_string(), n);

  let _ = state.news.append(NewsEntry {
    id: format!("news_{n}_{target_name}"),
    timestamp: n,
    event_type: "conquest".to_string(),
    title: format!("{target_name} Falls"),
    body: format!("Commander {winner} has seized {target_name}."),
    planet: Some(target_name.to_string()),
    audience: Audience::Global,
    player: Some(winner.clone()),
  });

  if let Some(prev_owner) = previous_owner {
    if prev_owner != winner {
      if let Some((path, mut prev_save)) = find_player_target(state, &prev_owner) {
        prev_save.player.owned_planets.remove(target_name);
        let mut rng = new_rng(state.test_mode);
        let msg = mail::Message::new(
          "Galactic Command".to_string(),
          prev_owner.clone(),
          format!("{target_name} has fallen"),
          format!("Commander {winner} has conquered {target_name}, stripping you of ownership."),
          n,
          &mut rng,
        );
        mail::deliver(&mut prev_save.player, msg);
        let _ = atomic_write_json(&path, &prev_save);
      }
    }
  }
}

pub fn get_orbit_targets(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let mut targets = vec![json!({"type": "npc", "name": "Raider Wing"})];
  if planet.owner.as_deref().is_some_and(|o| o != game.player.name) {
    targets.push(json!({"type": "planet", "name": planet.name}));
  }
  ActionResponse::ok(json!({"targets": targets}))
}

pub fn should_initialize_planet_auto_combat(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let auto = planet.owner.as_deref().is_some_and(|o| o != game.player.name) && planet.defenders > 0;
  ActionResponse::ok(json!({"auto_combat": auto}))
}

pub fn start_combat_session(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(target_type_str) = text(&params, "target_type") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(target_name) = text(&params, "target_name") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.combat_session.is_some() {
    return ActionResponse::err("COMBAT_ALREADY_ACTIVE");
  }

  let player_stats = player_side_stats(game);
  let ship_level = economy::ship_level(game.ship.cost, &state.templates.iter().map(|t| t.cost).collect::<Vec<_>>());

  let (target_type, target_stats, enemy_scale, target_population) = match target_type_str.as_str() {
    "npc" => {
      let mut rng = new_rng(state.test_mode);
      let scale = f64::from(ship_level) * 0.2 + 0.8;
      let defenders = uniform_int(&mut rng, 5, 15 + i64::from(ship_level) * 5);
      let shields = uniform_int(&mut rng, 0, 10 + i64::from(ship_level) * 5);
      let credits = uniform_int(&mut rng, 200, 1000 + i64::from(ship_level) * 400);
      (
        TargetType::Npc,
        SideStats {
          shields,
          defenders,
          integrity: 100,
          max_integrity: 100,
          credits,
        },
        scale,
        None,
      )
    }
    "planet" => {
      let Some(planet) = state.build_planet(&target_name) else {
        return ActionResponse::err("PLANET_NOT_FOUND");
      };
      (
        TargetType::Planet,
        SideStats {
          shields: planet.shields,
          defenders: planet.defenders,
          integrity: 200,
          max_integrity: 200,
          credits: planet.credit_balance,
        },
        1.0,
        Some(planet.population),
      )
    }
    "player" => {
      let Some((_, save)) = find_player_target(state, &target_name) else {
        return ActionResponse::err("TARGET_NOT_FOUND");
      };
      (
        TargetType::Player,
        SideStats {
          shields: save.ship.shields,
          defenders: save.ship.defenders,
          integrity: save.ship.integrity,
          max_integrity: save.ship.max_integrity,
          credits: save.player.credits,
        },
        1.0,
        None,
      )
    }
    _ => return ActionResponse::err("INVALID_TARGET_TYPE"),
  };

  let session_state = combat::start_combat_session(
    target_type,
    target_name,
    player_stats,
    target_stats,
    enemy_scale,
    game.player.combat_win_streak,
    target_population,
  );
  game.combat_session = Some(session_state.clone());
  ActionResponse::ok(json!({"session": session_state}))
}

pub fn resolve_combat_round(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let committed = num(&params, "committed_fighters").unwrap_or(1);
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(combat_session) = &mut game.combat_session else {
    return ActionResponse::err("NO_ACTIVE_COMBAT");
  };

  let weapons_crew = u32::from(game.player.crew.contains_key(&Specialty::Weapons));
  let hit_bonus = 0.05 * f64::from(weapons_crew);
  let mut rng = new_rng(state.test_mode);
  let outcome = match combat::resolve_combat_round(combat_session, committed, &mut rng, hit_bonus, 0.0) {
    Ok(o) => o,
    Err(e) => return ActionResponse::err_with_message("GAME_RULE", e.to_string()),
  };

  game.ship.shields = combat_session.player_current.shields;
  game.ship.defenders = combat_session.player_current.defenders;
  game.ship.integrity = combat_session.player_current.integrity;

  let response = match outcome.status {
    CombatStatus::Won => {
      let is_hostile_npc = combat_session.target_type == crate::combat::TargetType::Npc;
      let target_type = combat_session.target_type;
      let target_name = combat_session.target_name.clone();

      let (target_path, target_save) = if target_type == TargetType::Player {
        find_player_target(state, &target_name).map_or((None, None), |(p, s)| (Some(p), Some(s)))
      } else {
        (None, None)
      };
      let empty_inventory = HashMap::new();
      let target_inventory = target_save.as_ref().map_or(&empty_inventory, |s| &s.player.inventory);

      let cargo_remaining = game.ship.effective_max_cargo() - game.player.cargo_used();
      let payout = combat::resolve_victory(combat_session, &mut rng, cargo_remaining, is_hostile_npc, game.player.authority_standing, target_inventory);
      let target_current = combat_session.target_current.clone();
      let target_population_after = combat_session.target_population;

      game.player.credits += payout.loot_credits;
      game.player.combat_win_streak += 1;
      for (name, qty) in &payout.looted_items {
        game.player.add_item(name, *qty);
      }
      game.combat_session = None;

      match target_type {
        TargetType::Player => {
          if let (Some(path), Some(mut save)) = (target_path, target_save) {
            for (name, qty) in &payout.looted_items {
              save.player.add_item(name, -qty);
            }
            save.player.credits = target_current.credits;
            save.ship.shields = target_current.shields;
            save.ship.defenders = target_current.defenders;
            save.ship.integrity = target_current.integrity;
            let _ = atomic_write_json(&path, &save);
          }
        }
        TargetType::Planet => {
          conquer_planet(state, game, &target_name, target_population_after, target_current.credits);
        }
        TargetType::Npc => {}
      }

      ActionResponse::ok(json!({"outcome": outcome, "victory": payout}))
    }
    CombatStatus::Lost => {
      let penalty = combat::resolve_defeat(game.player.credits, &game.player.inventory, &mut rng);
      game.player.credits = (game.player.credits - penalty.credits_lost).max(0);
      for (name, qty) in &penalty.items_lost {
        game.player.add_item(name, -qty);
      }
      game.player.combat_win_streak = 0;
      game.combat_session = None;
      ActionResponse::ok(json!({"outcome": outcome, "defeat": penalty}))
    }
    _ => ActionResponse::ok(json!({"outcome": outcome})),
  };

  state.record_analytics(crate::analytics::AnalyticsEvent {
    ts: now(),
    category: "combat".into(),
    name: "resolve_combat_round".into(),
    success: true,
    value: None,
    player: Some(game.player.name.clone()),
    planet: None,
    meta: json!({}),
  });

  response
}

pub fn flee_combat_session(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(combat_session) = game.combat_session.take() else {
    return ActionResponse::err("NO_ACTIVE_COMBAT");
  };
  let mut rng = new_rng(state.test_mode);
  let hostile_planet = combat_session.target_type == TargetType::Planet;
  let penalty = combat::resolve_flee(game.player.credits, &mut rng, hostile_planet);
  game.player.credits = (game.player.credits - penalty.credits_lost).max(0);
  if penalty.barred {
    let bar_hours = state.config.get_i64("planet_bar_duration_hours");
    let n = now();
    game.player.bar_from(&combat_session.target_name, n + bar_hours * 3600);
    game.player.attacked_planets.insert(combat_session.target_name.clone(), n);
  }
  ActionResponse::ok(json!({"flee": penalty}))
}

pub fn fire_special_weapon(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let cooldown = (state.config.get_f64("combat_special_weapon_cooldown_hours") * 3600.0) as i64;
  if now() - game.player.last_special_weapon_time < cooldown {
    return ActionResponse::err("SPECIAL_WEAPON_ON_COOLDOWN");
  }
  let Some(combat_session) = &mut game.combat_session else {
    return ActionResponse::err("NO_ACTIVE_COMBAT");
  };
  let mut rng = new_rng(state.test_mode);
  match combat::fire_special_weapon(combat_session, &mut rng, &state.config) {
    Ok((damage, pop_loss)) => {
      game.player.last_special_weapon_time = now();
      let target_name = combat_session.target_name.clone();

      if let Some(seed) = state.planet_catalog.iter().find(|p| p.name == target_name) {
        let target_credits = combat_session.target_current.credits;
        let _ = state.universe.with_mutate(&target_name, seed.base_defenders, seed.base_shields, seed.max_shields, |s| {
          s.population_delta -= pop_loss;
          s.credit_balance = target_credits;
          s.credits_initialized = true;
        });
      }

      if combat_session.status == CombatStatus::Won {
        let is_hostile_npc = false;
        let cargo_remaining = game.ship.effective_max_cargo() - game.player.cargo_used();
        let empty_inventory = HashMap::new();
        let payout = combat::resolve_victory(combat_session, &mut rng, cargo_remaining, is_hostile_npc, game.player.authority_standing, &empty_inventory);
        let target_current = combat_session.target_current.clone();
        let target_population_after = combat_session.target_population;
        game.player.credits += payout.loot_credits;
        game.combat_session = None;
        conquer_planet(state, game, &target_name, target_population_after, target_current.credits);
        ActionResponse::ok(json!({"damage": damage, "victory": payout}))
      } else {
        ActionResponse::ok(json!({"damage": damage}))
      }
    }
    Err(e) => ActionResponse::err_with_message("GAME_RULE", e.to_string()),
  }
}

pub fn get_special_weapon_status(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let cooldown = (state.config.get_f64("combat_special_weapon_cooldown_hours") * 3600.0) as i64;
  let remaining = (cooldown - (now() - game.player.last_special_weapon_time)).max(0);
  ActionResponse::ok(json!({"ready": remaining == 0, "cooldown_seconds_remaining": remaining}))
}

pub fn get_target_stats(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(target_name) = text(&params, "target_name") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(_game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  match state.build_planet(&target_name) {
    Some(planet) => ActionResponse::ok(json!({"shields": planet.shields, "defenders": planet.defenders, "credits": planet.credit_balance})),
    None => ActionResponse::err("TARGET_NOT_FOUND"),
  }
}
