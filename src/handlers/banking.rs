//! Personal banking, planet treasuries, crew pay, and interest payouts.
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

pub fn bank_deposit(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  if !state.config.get_bool("enable_bank") {
    return ActionResponse::err("BANK_DISABLED");
  }
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if amount <= 0 || game.player.credits < amount {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= amount;
  game.player.bank_balance += amount;
  ActionResponse::ok(json!({"credits": game.player.credits, "bank_balance": game.player.bank_balance}))
}

pub fn bank_withdraw(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  if !state.config.get_bool("enable_bank") {
    return ActionResponse::err("BANK_DISABLED");
  }
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if amount <= 0 || game.player.bank_balance < amount {
    return ActionResponse::err("INSUFFICIENT_BANK_BALANCE");
  }
  game.player.bank_balance -= amount;
  game.player.credits += amount;
  ActionResponse::ok(json!({"credits": game.player.credits, "bank_balance": game.player.bank_balance}))
}

pub fn payout_interest(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let rate = state.config.get_f64("planet_credit_interest_rate");
  let payout = (game.player.bank_balance as f64 * rate).round() as i64;
  game.player.bank_balance += payout;
  ActionResponse::ok(json!({"payout": payout, "bank_balance": game.player.bank_balance}))
}

pub fn get_planet_financials(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  if planet.owner.as_deref() != Some(game.player.name.as_str()) {
    return ActionResponse::err("NOT_PLANET_OWNER");
  }
  ActionResponse::ok(json!({"credit_balance": planet.credit_balance}))
}

pub fn planet_deposit(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if amount <= 0 || game.player.credits < amount {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  let planet_name = game.player.current_planet.clone();
  let owner_ok = state.build_planet(&planet_name).is_some_and(|p| p.owner.as_deref() == Some(game.player.name.as_str()));
  if !owner_ok {
    return ActionResponse::err("NOT_PLANET_OWNER");
  }
  let seed = state.planet_catalog.iter().find(|p| p.name == planet_name);
  let Some(seed) = seed else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let result = state
    .universe
    .with_mutate(&planet_name, seed.base_defenders, seed.base_shields, seed.max_shields, |s| {
      s.credit_balance += amount;
      s.credits_initialized = true;
      s.credit_balance
    });
  match result {
    Ok(balance) => {
      game.player.credits -= amount;
      ActionResponse::ok(json!({"credits": game.player.credits, "planet_balance": balance}))
    }
    Err(e) => ActionResponse::err_with_message("ACTION_FAILED", e.to_string()),
  }
}

pub fn planet_withdraw(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(amount) = num(&params, "amount") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let planet_name = game.player.current_planet.clone();
  let Some(planet) = state.build_planet(&planet_name) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  if planet.owner.as_deref() != Some(game.player.name.as_str()) {
    return ActionResponse::err("NOT_PLANET_OWNER");
  }
  if amount <= 0 || planet.credit_balance < amount {
    return ActionResponse::err("INSUFFICIENT_PLANET_BALANCE");
  }
  let seed = state.planet_catalog.iter().find(|p| p.name == planet_name).unwrap();
  let result = state
    .universe
    .with_mutate(&planet_name, seed.base_defenders, seed.base_shields, seed.max_shields, |s| {
      s.credit_balance -= amount;
      s.credit_balance
    });
  match result {
    Ok(balance) => {
      game.player.credits += amount;
      ActionResponse::ok(json!({"credits": game.player.credits, "planet_balance": balance}))
    }
    Err(e) => ActionResponse::err_with_message("ACTION_FAILED", e.to_string()),
  }
}

pub fn get_planet_crew_offers(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  use crate::crew::Specialty;
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let offers: Vec<Value> = [(Specialty::Engineer, "Greta"), (Specialty::Weapons, "Okonkwo")]
    .into_iter()
    .filter(|(spec, _)| !game.player.crew.contains_key(spec))
    .map(|(spec, name)| json!({"specialty": spec.to_string(), "name": name, "daily_pay": 60}))
    .collect();
  ActionResponse::ok(json!({"offers": offers}))
}

pub fn process_crew_pay(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  match economy::process_crew_pay(&mut game.player, now(), &state.config) {
    Ok(paid) => ActionResponse::ok(json!({"paid": paid, "credits": game.player.credits})),
    Err(e) => ActionResponse::err_with_message("GAME_RULE", e.to_string()),
  }
}
