//! Faction standing, planet-bar state, planet events/spotlight reads,
//! conquered-planet upkeep, commander stipend, and galactic news.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::economy;
use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::player::standing_label;
use crate::session::Session;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

pub fn get_authority_standing_label(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"label": game.player.authority_label(), "value": game.player.authority_standing}))
}

pub fn get_frontier_standing_label(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"label": game.player.frontier_label(), "value": game.player.frontier_standing}))
}

pub fn get_authority_standing(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  get_authority_standing_label(state, session, params)
}

pub fn get_frontier_standing(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  get_frontier_standing_label(state, session, params)
}

pub fn adjust_authority_standing(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(delta) = params.get("delta").and_then(Value::as_i64) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  game.player.adjust_authority(delta);
  ActionResponse::ok(json!({"value": game.player.authority_standing, "label": standing_label(game.player.authority_standing)}))
}

pub fn adjust_frontier_standing(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(delta) = params.get("delta").and_then(Value::as_i64) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  game.player.adjust_frontier(delta);
  ActionResponse::ok(json!({"value": game.player.frontier_standing, "label": standing_label(game.player.frontier_standing)}))
}

pub fn check_barred(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(planet) = text(&params, "planet") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"barred": game.player.is_barred(&planet, now())}))
}

pub fn bar_player(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(planet) = text(&params, "planet") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let hours = state.config.get_i64("planet_bar_duration_hours");
  game.player.bar_from(&planet, now() + hours * 3600);
  ActionResponse::ok_empty()
}

pub fn get_planet_event(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let event = game.economy.planet_events.get(&game.player.current_planet);
  ActionResponse::ok(json!({"event": event}))
}

pub fn is_planet_hostile_market(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let hostile = economy::is_hostile_market(&game.player, &planet, now(), state.config.get_i64("planet_price_penalty_window_hours"));
  ActionResponse::ok(json!({"hostile": hostile}))
}

pub fn get_planet_price_penalty_seconds_remaining(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let window = state.config.get_i64("planet_price_penalty_window_hours") * 3600;
  let remaining = game
    .player
    .attacked_planets
    .get(&game.player.current_planet)
    .map(|&t| (window - (now() - t)).max(0))
    .unwrap_or(0);
  ActionResponse::ok(json!({"seconds_remaining": remaining}))
}

pub fn get_current_port_spotlight_deal(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let deal = game.economy.spotlight.get(&game.player.current_planet);
  ActionResponse::ok(json!({"deal": deal}))
}

pub fn process_conquered_planet_defense_regen(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let mut regenerated = Vec::new();
  let interval = state.config.get_i64("planet_defense_regen_interval_seconds");
  for (planet_name, _) in &game.player.owned_planets {
    let Some(seed) = state.planet_catalog.iter().find(|p| &p.name == planet_name) else { continue };
    let n = now();
    let result = state
      .universe
      .with_mutate(planet_name, seed.base_defenders, seed.base_shields, seed.max_shields, |s| {
        if s.owner.as_deref() != Some(game.player.name.as_str()) {
          return false;
        }
        if n - s.last_defense_regen_time < interval {
          return false;
        }
        s.defenders = (s.defenders + state.config.get_i64("planet_defense_regen_fighters")).min(seed.max_defenders);
        s.shields = (s.shields + state.config.get_i64("planet_defense_regen_shields")).min(seed.max_shields);
        s.last_defense_regen_time = n;
        true
      });
    if result.unwrap_or(false) {
      regenerated.push(planet_name.clone());
    }
  }
  ActionResponse::ok(json!({"regenerated": regenerated}))
}

pub fn process_commander_stipend(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let interval = state.config.get_i64("commander_stipend_interval_hours") * 3600;
  if now() - game.player.last_commander_stipend_time < interval {
    return ActionResponse::ok(json!({"stipend": 0}));
  }
  let planet_count = game.player.owned_planets.len() as i64;
  let stipend = planet_count * state.config.get_i64("commander_stipend_per_planet");
  game.player.credits += stipend;
  game.player.last_commander_stipend_time = now();
  ActionResponse::ok(json!({"stipend": stipend, "credits": game.player.credits}))
}

pub fn has_unseen_galactic_news(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let unseen = state.news.unseen_for(&game.player.name, game.player.last_seen_news_timestamp, now(), state.config.get_i64("galactic_news_retention_days"));
  ActionResponse::ok(json!({"has_unseen": !unseen.is_empty()}))
}

pub fn get_unseen_galactic_news(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let unseen = state.news.unseen_for(&game.player.name, game.player.last_seen_news_timestamp, now(), state.config.get_i64("galactic_news_retention_days"));
  ActionResponse::ok(json!({"news": unseen}))
}

pub fn mark_galactic_news_seen(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  game.player.last_seen_news_timestamp = now();
  ActionResponse::ok_empty()
}
