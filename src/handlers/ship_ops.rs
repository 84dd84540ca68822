//! Ship maintenance: fuel, repairs, purchases, crew transfers, upgrades.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::economy;
use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::session::Session;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn num(params: &Value, key: &str) -> Option<i64> {
  params.get(key).and_then(Value::as_i64)
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

pub fn get_refuel_quote(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let amount = num(&params, "amount").unwrap_or_else(|| (game.ship.max_fuel - game.ship.fuel) as i64).max(0);
  let unit_cost = state.config.get_f64("fuel_usage_multiplier") * 10.0 * economy::refuel_cost_multiplier(&state.config);
  let total = (unit_cost * amount as f64).round() as i64;
  ActionResponse::ok(json!({"amount": amount, "total_cost": total}))
}

pub fn buy_fuel(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if !economy::check_refuel_allowed(&mut game.player, now(), &state.config) {
    return ActionResponse::err("REFUEL_TIMER_EXCEEDED");
  }
  let room = (game.ship.max_fuel - game.ship.fuel).max(0.0) as i64;
  let requested = num(&params, "amount").unwrap_or(room).clamp(0, room);
  if requested <= 0 {
    return ActionResponse::err("TANK_FULL");
  }
  let unit_cost = state.config.get_f64("fuel_usage_multiplier") * 10.0 * economy::refuel_cost_multiplier(&state.config);
  let total = (unit_cost * requested as f64).round() as i64;
  if game.player.credits < total {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= total;
  game.ship.fuel = (game.ship.fuel + requested as f64).min(game.ship.max_fuel);
  game.ship.last_refuel_time = now();
  economy::record_refuel(&mut game.player);
  ActionResponse::ok(json!({"total_cost": total, "fuel": game.ship.fuel}))
}

pub fn check_auto_refuel(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"fuel": game.ship.fuel, "max_fuel": game.ship.max_fuel}))
}

pub fn repair_hull(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let missing = game.ship.max_integrity - game.ship.integrity;
  if missing <= 0 {
    return ActionResponse::err("HULL_ALREADY_FULL");
  }
  let requested = num(&params, "amount").unwrap_or(missing).clamp(0, missing);
  let cost_per_point = state.config.get_f64("planet_price_penalty_multiplier") * 5.0;
  let total = (cost_per_point * requested as f64).round() as i64;
  if game.player.credits < total {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= total;
  game.ship.integrity += requested;
  ActionResponse::ok(json!({"total_cost": total, "integrity": game.ship.integrity}))
}

pub fn buy_ship(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(model) = text(&params, "model") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(template) = state.templates.iter().find(|t| t.model == model) else {
    return ActionResponse::err("UNKNOWN_SHIP_MODEL");
  };
  if game.player.credits < template.cost {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= template.cost;
  game.ship = crate::ship::Spaceship::from_template(template);
  ActionResponse::ok(json!({"model": game.ship.model, "credits": game.player.credits}))
}

pub fn get_spaceships(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  ActionResponse::ok(json!({"templates": state.templates}))
}

pub fn get_ship_level(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let costs: Vec<i64> = state.templates.iter().map(|t| t.cost).collect();
  ActionResponse::ok(json!({"level": economy::ship_level(game.ship.cost, &costs)}))
}

pub fn transfer_fighters(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  transfer_garrison(game, amount, true)
}

fn transfer_garrison(game: &mut crate::game::Game, amount: i64, is_fighters: bool) -> ActionResponse {
  if is_fighters {
    if amount >= 0 {
      let room = game.ship.max_defenders - game.ship.defenders;
      let n = amount.min(room);
      game.ship.defenders += n;
      ActionResponse::ok(json!({"transferred": n, "defenders": game.ship.defenders}))
    } else {
      let n = (-amount).min(game.ship.defenders);
      game.ship.defenders -= n;
      ActionResponse::ok(json!({"transferred": n, "defenders": game.ship.defenders}))
    }
  } else {
    ActionResponse::err("INVALID_INPUT")
  }
}

pub fn transfer_shields(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if amount >= 0 {
    let room = game.ship.max_shields - game.ship.shields;
    let n = amount.min(room);
    game.ship.shields += n;
    ActionResponse::ok(json!({"transferred": n, "shields": game.ship.shields}))
  } else {
    let n = (-amount).min(game.ship.shields);
    game.ship.shields -= n;
    ActionResponse::ok(json!({"transferred": n, "shields": game.ship.shields}))
  }
}

pub fn install_ship_upgrade(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(requested)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  match economy::install_upgrade(&mut game.player, &mut game.ship, &item, requested) {
    Ok(applied) => ActionResponse::ok(json!({"applied": applied})),
    Err(e) => ActionResponse::err_with_message("GAME_RULE", e.to_string()),
  }
}
