//! The per-connection session and its request loop: read one frame,
//! dispatch, write one frame, repeat until the peer disconnects.
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use crate::dispatch::dispatch;
use crate::game::{AppState, Game};
use crate::payloads::{ActionRequest, ActionResponse};
use crate::{debug, error, info, warn};

/// Actions permitted before an account is authenticated.
pub const PRE_AUTH_ACTIONS: &[&str] = &["check_account", "create_account", "authenticate"];
/// Actions permitted once an account exists but before a character is
/// selected.
pub const PRE_CHARACTER_ACTIONS: &[&str] = &["list_characters", "select_character", "logout_commander"];

pub struct Session {
  pub account_safe: Option<String>,
  pub character_safe: Option<String>,
  pub player_display_name: Option<String>,
  pub authenticated: bool,
  pub game: Option<Game>,
}

impl Session {
  #[must_use]
  pub fn new() -> Self {
    Session {
      account_safe: None,
      character_safe: None,
      player_display_name: None,
      authenticated: false,
      game: None,
    }
  }

  #[must_use]
  pub fn is_action_allowed(&self, action: &str) -> bool {
    if !self.authenticated {
      return PRE_AUTH_ACTIONS.contains(&action);
    }
    if self.game.is_none() {
      return PRE_AUTH_ACTIONS.contains(&action) || PRE_CHARACTER_ACTIONS.contains(&action) || action == "new_game" || action == "load_game" || action == "list_saves";
    }
    true
  }
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

/// Drive one accepted connection until it disconnects. On disconnect,
/// best-effort save the loaded character to its account directory (spec
/// §4.1); errors are logged, never propagated.
pub async fn handle_connection(stream: TcpStream, state: Arc<AppState>) {
  let ws_stream = match tokio_tungstenite::accept_async(stream).await {
    Ok(s) => s,
    Err(e) => {
      warn!("websocket handshake failed: {e}");
      return;
    }
  };

  let mut session = Session::new();
  run_loop(ws_stream, &mut session, &state).await;
  save_on_disconnect(&session, &state);
}

async fn run_loop(mut ws: WebSocketStream<TcpStream>, session: &mut Session, state: &Arc<AppState>) {
  loop {
    let frame = match ws.next().await {
      Some(Ok(WsMessage::Text(text))) => text,
      Some(Ok(WsMessage::Close(_))) | None => break,
      Some(Ok(_)) => continue,
      Some(Err(e)) => {
        debug!("connection read error: {e}");
        break;
      }
    };

    let response = process_frame(&frame, session, state);
    let body = serde_json::to_string(&response).unwrap_or_else(|_| "{\"success\":false,\"error\":\"ACTION_FAILED\"}".to_string());
    if let Err(e) = ws.send(WsMessage::Text(body.into())).await {
      debug!("connection write error: {e}");
      break;
    }
  }
}

fn process_frame(frame: &str, session: &mut Session, state: &Arc<AppState>) -> ActionResponse {
  let request: ActionRequest = match serde_json::from_str(frame) {
    Ok(r) => r,
    Err(_) => return ActionResponse::err("INVALID_JSON"),
  };

  if !session.is_action_allowed(&request.action) {
    return ActionResponse::err("NOT_AUTHENTICATED");
  }

  debug!("dispatching action {}", request.action);
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| dispatch(&request.action, state, session, request.params))) {
    Ok(resp) => resp,
    Err(_) => {
      error!("handler panicked for action {}", request.action);
      ActionResponse::err_with_message("ACTION_FAILED", "internal error")
    }
  }
}

fn save_on_disconnect(session: &Session, state: &Arc<AppState>) {
  if let Some(game) = &session.game {
    if let Err(e) = game.save_game(state) {
      warn!("disconnect save failed for {}: {e}", game.character_safe);
    } else {
      info!("saved {} on disconnect", game.character_safe);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn pre_auth_session_only_allows_auth_actions() {
    let session = Session::new();
    assert!(session.is_action_allowed("check_account"));
    assert!(!session.is_action_allowed("buy_item"));
  }

  #[test_log::test]
  fn post_auth_no_character_allows_character_select() {
    let mut session = Session::new();
    session.authenticated = true;
    assert!(session.is_action_allowed("list_characters"));
    assert!(!session.is_action_allowed("buy_item"));
  }
}
