//! Economy domain: trading, market queries, contraband, bribes, and
//! trade contracts.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::economy::{self, TradeSide};
use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::player::canonicalize_item;
use crate::rng::new_rng;
use crate::session::Session;

const ITEM_CATALOG: &[(&str, i64, Option<(u32, u32)>)] = &[
  ("Ore", 40, None),
  ("Fuel Cells", 25, None),
  ("Nanobot Kit", 150, None),
  ("Cargo Pod", 300, None),
  ("Shield Capacitor", 220, None),
  ("Defender Bay", 280, None),
  ("Exotic Spice", 900, Some((2, 1))),
  ("Combat Stims", 1400, Some((3, 2))),
  ("Neural Scramblers", 2600, Some((4, 3))),
];

fn base_price(item: &str) -> Option<i64> {
  ITEM_CATALOG.iter().find(|(n, _, _)| *n == item).map(|(_, p, _)| *p)
}

fn contraband_info(item: &str) -> Option<(u32, u32)> {
  ITEM_CATALOG.iter().find(|(n, _, _)| *n == item).and_then(|(_, _, c)| *c)
}

fn num(params: &Value, key: &str) -> Option<i64> {
  params.get(key).and_then(Value::as_i64)
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

pub fn get_market_sell_price(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  with_item_price(state, session, params, false)
}

pub fn get_effective_buy_price(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  with_item_price(state, session, params, true)
}

fn with_item_price(state: &Arc<AppState>, session: &mut Session, params: Value, is_buy: bool) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(item) = text(&params, "item") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let item = canonicalize_item(&item);
  let Some(base) = base_price(&item) else {
    return ActionResponse::err("UNKNOWN_ITEM");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let hostile = economy::is_hostile_market(&game.player, &planet, now(), 3600);
  let listed = planet.base_listed_price(&item, base);
  let buy = economy::buy_price(listed, &planet.name, &item, hostile, &game.economy, &state.config);
  if is_buy {
    ActionResponse::ok(json!({"price": buy}))
  } else {
    let tier = contraband_info(&item).map(|(t, _)| t);
    let bribe_level = game.economy.bribe_level(&planet.name, now());
    let sell = economy::sell_price(buy, tier, 0.1, bribe_level, &state.config);
    ActionResponse::ok(json!({"price": sell}))
  }
}

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

pub fn trade_item(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  match text(&params, "side").as_deref() {
    Some("sell") => sell_item(state, session, params),
    Some("buy") | None => buy_item(state, session, params),
    _ => ActionResponse::err("INVALID_INPUT"),
  }
}

pub fn buy_item(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(qty)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  if qty <= 0 {
    return ActionResponse::err("INVALID_INPUT");
  }
  let item = canonicalize_item(&item);
  let Some(base) = base_price(&item) else {
    return ActionResponse::err("UNKNOWN_ITEM");
  };

  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };

  if let Some((tier, required_bribe)) = contraband_info(&item) {
    let bribe_level = game.economy.bribe_level(&planet.name, now());
    if !(bribe_level >= required_bribe || (required_bribe == 0 && planet.is_smuggler_hub)) {
      return ActionResponse::err("CONTRABAND_ACCESS_DENIED");
    }
    let _ = tier;
  }

  let hostile = economy::is_hostile_market(&game.player, &planet, now(), 3600);
  let listed = planet.base_listed_price(&item, base);
  let price = economy::buy_price(listed, &planet.name, &item, hostile, &game.economy, &state.config);
  let total = price * qty;
  if game.player.credits < total {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }

  game.player.credits -= total;
  game.player.add_item(&item, qty);
  game.economy.touch_momentum(&planet.name, &item, now(), TradeSide::Buy, qty, &state.config);

  if contraband_info(&item).is_some() {
    if let Err(e) = run_detection_check(state, game, &planet.name, &item, qty) {
      return e;
    }
  }

  state.record_analytics(crate::analytics::AnalyticsEvent {
    ts: now(),
    category: "trade".into(),
    name: "buy_item".into(),
    success: true,
    value: Some(total as f64),
    player: Some(game.player.name.clone()),
    planet: Some(planet.name.clone()),
    meta: json!({"item": item, "quantity": qty}),
  });

  ActionResponse::ok(json!({"total_cost": total, "credits": game.player.credits}))
}

pub fn sell_item(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(qty)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  if qty <= 0 {
    return ActionResponse::err("INVALID_INPUT");
  }
  let item = canonicalize_item(&item);

  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.player.item_qty(&item) < qty {
    return ActionResponse::err("INSUFFICIENT_INVENTORY");
  }
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let Some(base) = base_price(&item) else {
    return ActionResponse::err("UNKNOWN_ITEM");
  };

  let hostile = economy::is_hostile_market(&game.player, &planet, now(), 3600);
  let listed = planet.base_listed_price(&item, base);
  let buy = economy::buy_price(listed, &planet.name, &item, hostile, &game.economy, &state.config);
  let tier = contraband_info(&item).map(|(t, _)| t);
  let bribe_level = game.economy.bribe_level(&planet.name, now());
  let sell = economy::sell_price(buy, tier, 0.1, bribe_level, &state.config);
  let total = sell * qty;

  game.player.add_item(&item, -qty);
  game.player.credits += total;
  game.economy.touch_momentum(&planet.name, &item, now(), TradeSide::Sell, qty, &state.config);

  if let Some((tier, _)) = contraband_info(&item) {
    let heat_gain = state.config.get_i64("law_heat_gain_trade");
    game.economy.add_heat(&planet.name, heat_gain);
    game.player.adjust_authority(-(i64::from(tier)));
    game.player.adjust_frontier(i64::from(tier));
    if let Err(e) = run_detection_check(state, game, &planet.name, &item, qty) {
      return e;
    }
  }

  ActionResponse::ok(json!({"total_proceeds": total, "credits": game.player.credits}))
}

fn run_detection_check(state: &Arc<AppState>, game: &mut crate::game::Game, planet_name: &str, item: &str, qty: i64) -> Result<(), ActionResponse> {
  let Some((tier, _)) = contraband_info(item) else {
    return Ok(());
  };
  let mut rng = new_rng(state.test_mode);
  let planet = state.build_planet(planet_name).ok_or_else(|| ActionResponse::err("PLANET_NOT_FOUND"))?;
  let ship_level = economy::ship_level(game.ship.cost, &state.templates.iter().map(|t| t.cost).collect::<Vec<_>>());
  let p = economy::detection_probability(
    planet.security_level,
    tier,
    qty,
    game.economy.heat_at(planet_name),
    game.player.frontier_standing,
    game.economy.bribe_level(planet_name, now()),
    ship_level,
    game.ship.scan_evasion_multiplier(),
    &state.config,
  );
  if economy::roll_detection(&mut rng, p, planet_name, &mut game.economy, ship_level, &state.config) {
    return Err(ActionResponse::err_with_message(
      "CONTRABAND_DETECTED",
      format!("security level {} patrol intercepted the shipment", planet.security_level),
    ));
  }
  Ok(())
}

pub fn jettison_cargo(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(qty)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.player.item_qty(&item) < qty {
    return ActionResponse::err("INSUFFICIENT_INVENTORY");
  }
  game.player.add_item(&item, -qty);
  ActionResponse::ok_empty()
}

pub fn get_item_market_snapshot(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let hostile = economy::is_hostile_market(&game.player, &planet, now(), 3600);
  let mut snapshot = Vec::new();
  for (item, base, _) in ITEM_CATALOG {
    let listed = planet.base_listed_price(item, *base);
    let price = economy::buy_price(listed, &planet.name, item, hostile, &game.economy, &state.config);
    snapshot.push(json!({"item": item, "buy_price": price}));
  }
  ActionResponse::ok(json!({"items": snapshot}))
}

pub fn get_best_trade_opportunities(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let mut opportunities = Vec::new();
  for seed in &state.planet_catalog {
    let Some(planet) = state.build_planet(&seed.name) else { continue };
    for (item, base, _) in ITEM_CATALOG {
      let listed = planet.base_listed_price(item, *base);
      opportunities.push(json!({"planet": planet.name, "item": item, "buy_price": listed}));
    }
  }
  ActionResponse::ok(json!({"opportunities": opportunities}))
}

pub fn get_bribe_market_snapshot(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"bribes": game.economy.bribes}))
}

pub fn get_contraband_market_context(_state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let items: Vec<Value> = ITEM_CATALOG
    .iter()
    .filter_map(|(name, _, c)| c.map(|(tier, level)| json!({"item": name, "tier": tier, "required_bribe_level": level})))
    .collect();
  ActionResponse::ok(json!({"contraband": items}))
}

pub fn get_smuggling_item_names(_state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let names: Vec<&str> = ITEM_CATALOG.iter().filter(|(_, _, c)| c.is_some()).map(|(n, _, _)| *n).collect();
  ActionResponse::ok(json!({"items": names}))
}

pub fn check_contraband_detection(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(qty)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let item = canonicalize_item(&item);
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some((tier, _)) = contraband_info(&item) else {
    return ActionResponse::ok(json!({"probability": 0.0}));
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let ship_level = economy::ship_level(game.ship.cost, &state.templates.iter().map(|t| t.cost).collect::<Vec<_>>());
  let p = economy::detection_probability(
    planet.security_level,
    tier,
    qty,
    game.economy.heat_at(&planet.name),
    game.player.frontier_standing,
    game.economy.bribe_level(&planet.name, now()),
    ship_level,
    game.ship.scan_evasion_multiplier(),
    &state.config,
  );
  ActionResponse::ok(json!({"probability": p}))
}

pub fn bribe_npc(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(level) = num(&params, "level") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let cost = planet.bribe_cost * level;
  if game.player.credits < cost {
    return ActionResponse::err("INSUFFICIENT_CREDITS");
  }
  game.player.credits -= cost;
  #[allow(clippy::cast_sign_loss)]
  game.economy.set_bribe(&planet.name, level as u32, now() + 6 * 3600);
  ActionResponse::ok(json!({"cost": cost}))
}

pub fn sell_non_market_cargo(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(item), Some(qty)) = (text(&params, "item"), num(&params, "quantity")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let item = canonicalize_item(&item);
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.player.item_qty(&item) < qty {
    return ActionResponse::err("INSUFFICIENT_INVENTORY");
  }
  let Some(base) = base_price(&item) else {
    return ActionResponse::err("UNKNOWN_ITEM");
  };
  let proceeds = economy::salvage_price(base, &state.config) * qty;
  game.player.add_item(&item, -qty);
  game.player.credits += proceeds;
  ActionResponse::ok(json!({"proceeds": proceeds}))
}

pub fn get_active_trade_contract(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  ActionResponse::ok(json!({"contract": game.economy.active_contract}))
}

pub fn reroll_trade_contract(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let Some(planet) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let destination = state
    .planet_catalog
    .iter()
    .find(|p| p.name != planet.name)
    .map_or_else(|| planet.name.clone(), |p| p.name.clone());

  let mut rng = new_rng(state.test_mode);
  let contract = economy::generate_contract(&mut rng, &game.player, &planet, &destination, "Ore", base_price("Ore").unwrap_or(40), &game.ship, &state.config, now(), None);
  game.economy.active_contract = Some(contract.clone());
  ActionResponse::ok(json!({"contract": contract}))
}
