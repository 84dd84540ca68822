//! Player-to-player mail and cargo gifting, plus the roster of other
//! commanders currently known to the universe.
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::account::atomic_write_json;
use crate::game::{AppState, CharacterSave};
use crate::mail;
use crate::payloads::ActionResponse;
use crate::rng::new_rng;
use crate::session::Session;

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn text(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

fn find_character_file(state: &Arc<AppState>, display_name: &str) -> Option<(PathBuf, CharacterSave)> {
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

pub fn send_message(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(recipient), Some(subject), Some(body)) = (text(&params, "recipient"), text(&params, "subject"), text(&params, "body")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if recipient == game.player.name {
    return ActionResponse::err("CANNOT_MESSAGE_SELF");
  }
  let Some((path, mut target)) = find_character_file(state, &recipient) else {
    return ActionResponse::err("RECIPIENT_NOT_FOUND");
  };
  let mut rng = new_rng(state.test_mode);
  let msg = mail::Message::new(game.player.name.clone(), recipient.clone(), subject, body, now(), &mut rng);
  mail::deliver(&mut target.player, msg);
  match atomic_write_json(&path, &target) {
    Ok(()) => ActionResponse::ok_empty(),
    Err(e) => ActionResponse::err_with_message("ACTION_FAILED", e.to_string()),
  }
}

pub fn mark_message_read(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(message_id) = text(&params, "message_id") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if mail::mark_read(&mut game.player, &message_id) {
    ActionResponse::ok_empty()
  } else {
    ActionResponse::err("MESSAGE_NOT_FOUND")
  }
}

pub fn delete_message(_state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(message_id) = text(&params, "message_id") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if mail::delete_message(&mut game.player, &message_id) {
    ActionResponse::ok_empty()
  } else {
    ActionResponse::err("MESSAGE_NOT_FOUND")
  }
}

pub fn gift_cargo_to_orbit_target(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(recipient), Some(item), Some(qty)) = (text(&params, "recipient"), text(&params, "item"), params.get("quantity").and_then(Value::as_i64)) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  if qty <= 0 {
    return ActionResponse::err("INVALID_INPUT");
  }
  let Some(game) = &mut session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  if game.player.item_qty(&item) < qty {
    return ActionResponse::err("INSUFFICIENT_CARGO");
  }
  let Some((path, mut target)) = find_character_file(state, &recipient) else {
    return ActionResponse::err("RECIPIENT_NOT_FOUND");
  };
  game.player.add_item(&item, -qty);
  target.player.add_item(&item, qty);
  match atomic_write_json(&path, &target) {
    Ok(()) => ActionResponse::ok(json!({"item": item, "quantity": qty})),
    Err(e) => ActionResponse::err_with_message("ACTION_FAILED", e.to_string()),
  }
}

pub fn get_other_players(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  let mut others = Vec::new();
  if let Ok(account_dirs) = std::fs::read_dir(state.accounts.root()) {
    for account_dir in account_dirs.filter_map(Result::ok) {
      let path = account_dir.path();
      if !path.is_dir() {
        continue;
      }
      let Ok(entries) = std::fs::read_dir(&path) else { continue };
      for entry in entries.filter_map(Result::ok) {
        let file = entry.path();
        if file.file_name().and_then(|n| n.to_str()) == Some("ACCOUNT.json") {
          continue;
        }
        let Ok(raw) = std::fs::read_to_string(&file) else { continue };
        let Ok(save) = serde_json::from_str::<CharacterSave>(&raw) else { continue };
        if save.player.name != game.player.name {
          others.push(json!({"name": save.player.name, "current_planet": save.player.current_planet}));
        }
      }
    }
  }
  ActionResponse::ok(json!({"players": others}))
}
