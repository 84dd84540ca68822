//! Auth/session domain: account lifecycle, character selection, save
//! slots, asset sync.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::account::safe_name;
use crate::game::{AppState, Game};
use crate::payloads::ActionResponse;
use crate::session::Session;

fn param_str(params: &Value, key: &str) -> Option<String> {
  params.get(key).and_then(Value::as_str).map(std::string::ToString::to_string)
}

pub fn check_account(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let Some(account) = param_str(&params, "account_name") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  ActionResponse::ok(json!({"exists": state.accounts.exists(&account)}))
}

pub fn create_account(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let (Some(account), Some(password), Some(character)) = (
    param_str(&params, "account_name"),
    param_str(&params, "password"),
    param_str(&params, "character_name"),
  ) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  match state.accounts.create_account(&account, &password, &character) {
    Ok(()) => ActionResponse::ok_empty(),
    Err(e) => ActionResponse::err(e.to_string()),
  }
}

pub fn authenticate(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let (Some(account), Some(password)) = (param_str(&params, "account_name"), param_str(&params, "password")) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  match state.accounts.authenticate(&account, &password) {
    Ok(outcome) => {
      session.authenticated = true;
      session.account_safe = Some(outcome.account_safe.clone());

      if let Some(character_safe) = &outcome.auto_loaded_character {
        if let Ok(game) = Game::load_game(state, &outcome.account_safe, character_safe) {
          session.character_safe = Some(character_safe.clone());
          session.player_display_name = Some(game.player.name.clone());
          session.game = Some(game);
        }
      }

      ActionResponse::ok(json!({
        "account_safe": outcome.account_safe,
        "requires_character_select": outcome.requires_character_select,
        "requires_character_create": outcome.requires_character_create,
        "characters": outcome.characters.iter().map(|c| c.character_name.clone()).collect::<Vec<_>>(),
      }))
    }
    Err(e) => ActionResponse::err(e.to_string()),
  }
}

pub fn list_characters(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(account_safe) = session.account_safe.clone() else {
    return ActionResponse::err("NOT_AUTHENTICATED");
  };
  match state.accounts.list_characters(&account_safe) {
    Ok(chars) => ActionResponse::ok(json!({
      "characters": chars.into_iter().map(|c| json!({"character_safe": c.character_safe, "character_name": c.character_name})).collect::<Vec<_>>()
    })),
    Err(e) => ActionResponse::err(e.to_string()),
  }
}

pub fn select_character(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(account_safe) = session.account_safe.clone() else {
    return ActionResponse::err("NOT_AUTHENTICATED");
  };
  let Some(character_safe) = param_str(&params, "character_safe").map(|s| safe_name(&s)) else {
    return ActionResponse::err("INVALID_INPUT");
  };
  match Game::load_game(state, &account_safe, &character_safe) {
    Ok(game) => {
      session.character_safe = Some(character_safe);
      session.player_display_name = Some(game.player.name.clone());
      session.game = Some(game);
      ActionResponse::ok_empty()
    }
    Err(e) => ActionResponse::err(e.to_string()),
  }
}

pub fn logout_commander(_state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  session.character_safe = None;
  session.player_display_name = None;
  session.game = None;
  ActionResponse::ok_empty()
}

pub fn new_game(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  let Some(account_safe) = session.account_safe.clone() else {
    return ActionResponse::err("NOT_AUTHENTICATED");
  };
  let Some(character_name) = param_str(&params, "character_name") else {
    return ActionResponse::err("INVALID_INPUT");
  };
  let character_safe = safe_name(&character_name);
  if character_safe.is_empty() || character_safe == "account" {
    return ActionResponse::err("INVALID_CHARACTER_NAME");
  }

  let game = Game::new_game(state, &account_safe, &character_safe, &character_name);
  if let Err(e) = game.save_game(state) {
    return ActionResponse::err(e.to_string());
  }
  if let Err(e) = state.accounts.link_character(&account_safe, &character_safe, &character_name) {
    return ActionResponse::err(e.to_string());
  }

  session.character_safe = Some(character_safe);
  session.player_display_name = Some(character_name);
  session.game = Some(game);
  ActionResponse::ok_empty()
}

pub fn load_game(state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  select_character(state, session, params)
}

pub fn save_game(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  let Some(game) = &session.game else {
    return ActionResponse::err("CHARACTER_NOT_SELECTED");
  };
  match game.save_game(state) {
    Ok(()) => ActionResponse::ok_empty(),
    Err(e) => ActionResponse::err(e.to_string()),
  }
}

pub fn list_saves(state: &Arc<AppState>, session: &mut Session, _params: Value) -> ActionResponse {
  list_characters(state, session, Value::Null)
}

pub fn sync_assets(state: &Arc<AppState>, _session: &mut Session, params: Value) -> ActionResponse {
  let client_manifest: std::collections::HashMap<String, String> = params
    .get("manifest")
    .and_then(|v| serde_json::from_value(v.clone()).ok())
    .unwrap_or_default();
  let assets_root = state.accounts.root().join("..").join("assets");
  match crate::assets::sync_assets(&assets_root, &client_manifest) {
    Ok(result) => ActionResponse::ok(serde_json::to_value(result).unwrap_or(Value::Null)),
    Err(e) => ActionResponse::err_with_message("ACTION_FAILED", e.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GameConfig;

  fn temp_state() -> Arc<AppState> {
    let root = std::env::temp_dir().join(format!(
      "sector_auth_handler_test_{}_{}",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ));
    Arc::new(AppState::load(root, GameConfig::default(), true).unwrap())
  }

  #[test_log::test]
  fn check_account_never_fails() {
    let state = temp_state();
    let mut session = Session::new();
    let resp = check_account(&state, &mut session, json!({"account_name": "nobody"}));
    assert!(resp.success);
  }

  #[test_log::test]
  fn create_then_authenticate_flow_selects_character_automatically() {
    let state = temp_state();
    let mut session = Session::new();
    let resp = create_account(&state, &mut session, json!({"account_name": "Jane", "password": "pw", "character_name": "Jane"}));
    assert!(resp.success);

    let resp = authenticate(&state, &mut session, json!({"account_name": "Jane", "password": "pw"}));
    assert!(resp.success);
    assert!(session.game.is_some());
  }
}
