//! Ship-loss recovery and the raw shared-universe snapshot query.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::session::Session;

pub fn claim_abandoned_ship(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.ship.integrity > 0 {
    return ActionResponse::err("SHIP_NOT_STRANDED");
  }
  let Some(seed) = state.planet_catalog.iter().find(|p| p.name == game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  if !seed.crew_services {
    return ActionResponse::err("NO_SALVAGE_YARD_HERE");
  }
  let Some(template) = state.templates.iter().min_by_key(|t| t.cost) else {
    return ActionResponse::err("NO_SHIP_TEMPLATES");
  };
  let salvage_fee = state.config.get_i64("abandoned_ship_salvage_fee");
  if game.player.credits < salvage_fee {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= salvage_fee;
  game.ship = crate::ship::Spaceship::from_template(template);
  ActionResponse::ok(json!({"model": game.ship.model, "credits": game.player.credits}))
}

pub fn load_shared_planet_states(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  ActionResponse::ok(json!({"planets": state.universe.snapshot()}))
}
