//! Player and planet info queries.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::session::Session;
use crate::travel::docking_fee;

pub fn get_player_info(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({
    "player": game.player,
    "ship": game.ship,
  }))
}

pub fn get_current_planet_info(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  match state.build_planet(&game.player.current_planet) {
    Some(planet) => ActionResponse::ok(json!({"planet": planet})),
    None => ActionResponse::err("PLANET_NOT_FOUND"),
  }
}

pub fn get_docking_fee(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let event_mult = game.economy.planet_events.get(&planet.name).map(|e| e.docking_mult);
  let fee = docking_fee(planet.docking_fee, game.player.port_visits, event_mult);
  ActionResponse::ok(json!({"docking_fee": fee}))
}

pub fn get_config(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  ActionResponse::ok(json!({"server_port": state.config.server_port()}))
}

pub fn get_winner_board(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  ActionResponse::ok(serde_json::to_value(state.campaign.snapshot()).unwrap_or(Value::Null))
}

pub fn get_all_commander_statuses(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let snapshot = state.universe.snapshot();
  let mut by_owner: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
  for s in snapshot.planet_states.values() {
    if let Some(owner) = &s.owner {
      *by_owner.entry(owner.clone()).or_insert(0) += 1;
    }
  }
  ActionResponse::ok(json!({"commanders": by_owner}))
}
