//! Telemetry queries: windowed summaries, raw event pages, heuristic
//! recommendations, and an admin reset.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::analytics::AnalyticsEvent;
use crate::game::AppState;
use crate::payloads::ActionResponse;
use crate::session::Session;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn hours(params: &Value) -> i64 {
  params.get("hours").and_then(Value::as_i64).unwrap_or(24)
}

pub fn get_analytics_summary(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let guard = state.analytics.lock().unwrap();
  let summary = guard.summary(now(), hours(&params));
  ActionResponse::ok(json!({"summary": summary}))
}

pub fn get_analytics_events(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let guard = state.analytics.lock().unwrap();
  let events: Vec<&AnalyticsEvent> = guard.events_in_window(now(), hours(&params));
  ActionResponse::ok(json!({"events": events}))
}

pub fn get_analytics_recommendations(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let guard = state.analytics.lock().unwrap();
  let recs = guard.recommendations(now(), hours(&params));
  ActionResponse::ok(json!({"recommendations": recs}))
}

pub fn reset_analytics(state: &Arc<AppState>, _session: &mut Session, _params: Value) -> ActionResponse {
  let mut guard = state.analytics.lock().unwrap();
  guard.reset();
  ActionResponse::ok_empty()
}

pub fn record_analytics_event(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(category), Some(name)) = (
    params.get("category").and_then(Value::as_str).map(str::to_string),
    params.get("name").and_then(Value::as_str).map(str::to_string),
  ) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let success = params.get("success").and_then(Value::as_bool).unwrap_or(true);
  let value = params.get("value").and_then(Value::as_f64);
  let player = session.game.as_ref().map(|g| g.player.name.clone());
  state.record_analytics(AnalyticsEvent {
    ts: now(),
    category,
    name,
    success,
    value,
    player,
    planet: None,
    meta: params.get("meta").cloned().unwrap_or(json!({})),
  });
  ActionResponse::ok_empty()
}
