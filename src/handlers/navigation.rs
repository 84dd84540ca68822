//! Travel between planets, two-phase travel events, and planet listings.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::crew::Specialty;
use crate::economy;
use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::rng::new_rng;
use crate::session::Session;
use crate::travel;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

pub fn get_planets(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let planets: Vec<Value> = state
    .planet_catalog
    .iter()
    .filter_map(|seed| state.build_planet(&seed.name))
    .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
    .collect();
  ActionResponse::ok(json!({"planets": planets}))
}

pub fn get_known_planets(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let names: Vec<&str> = state.planet_catalog.iter().map(|p| p.name.as_str()).collect();
  ActionResponse::ok(json!({"planets": names}))
}

pub fn travel_to_planet(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(destination) = text(&params, "destination") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.player.is_barred(&destination, now()) {
    return ActionResponse::err("PLAYER_BARRED");
  }
  let Some(origin) = state.build_planet(&game.player.current_planet) else {
    return ActionResponse::err("PLANET_NOT_FOUND");
  };
  let Some(dest) = state.build_planet(&destination) else {
    return ActionResponse::err("UNKNOWN_DESTINATION");
  };

  let dist = origin.distance_to(&dest);
  let engineer_count = u32::from(game.player.crew.contains_key(&Specialty::Engineer));
  let fuel_needed = travel::fuel_cost(dist, &game.ship, engineer_count, &state.config);

  let mut rng = new_rng(state.test_mode);
  let integrity_loss = travel::integrity_loss_pct(dist, &mut rng);
  if let Err(e) = travel::apply_travel(&mut game.ship, fuel_needed, integrity_loss) {
    return ActionResponse::err_with_message("GAME_RULE", e.to_string());
  }

  game.player.current_planet = destination.clone();
  game.player.port_visits += 1;

  let event = travel::roll_travel_event_payload(&mut rng);

  let items = vec!["Ore".to_string(), "Fuel Cells".to_string(), "Exotic Spice".to_string()];
  if let Some(deal) = economy::roll_port_spotlight(&mut rng, &dest, &items, now(), &state.config) {
    game.economy.spotlight.insert(dest.name.clone(), deal);
  }
  if let Some(planet_event) = economy::roll_planet_event(&mut rng, now(), &state.config) {
    game.economy.planet_events.insert(dest.name.clone(), planet_event);
  }

  state.record_analytics(crate::analytics::AnalyticsEvent {
    ts: now(),
    category: "navigation".into(),
    name: "travel_to_planet".into(),
    success: true,
    value: Some(dist),
    player: Some(game.player.name.clone()),
    planet: Some(destination.clone()),
    meta: json!({}),
  });

  ActionResponse::ok(json!({
    "destination": destination,
    "distance": dist,
    "fuel_used": fuel_needed,
    "fuel_remaining": game.ship.fuel,
    "integrity": game.ship.integrity,
    "event": event,
  }))
}

pub fn roll_travel_event_payload(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let mut rng = new_rng(state.test_mode);
  ActionResponse::ok(json!({"event": travel::roll_travel_event_payload(&mut rng)}))
}

pub fn resolve_travel_event_payload(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(choice) = text(&params, "choice") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(payload_value) = params.get("payload").cloned() else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Ok(payload) = serde_json::from_value::<travel::TravelEventPayload>(payload_value) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let mut rng = new_rng(state.test_mode);
  let result = travel::resolve_travel_event_payload(&payload, &choice, &mut game.player.credits, &mut game.ship, &mut rng);
  ActionResponse::ok(json!({"narrative": result.narrative, "credits": game.player.credits, "integrity": game.ship.integrity}))
}
