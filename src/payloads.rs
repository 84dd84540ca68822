//! Wire types. The client sends `{"action": str, "params": object}`; every
//! handler gets the raw `params` value and returns an `ActionResponse`.
//! This file is the single source of truth for what crosses the wire.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope every inbound frame is parsed into before dispatch looks
/// up a handler by `action`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
  pub action: String,
  #[serde(default)]
  pub params: Value,
}

/// The envelope every outbound frame is serialized from. `success` is
/// always present; `error` is a short machine-readable code, `message` is
/// free text, and `data` carries the handler's payload on success.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(flatten, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

impl ActionResponse {
  #[must_use]
  pub fn ok(data: Value) -> Self {
    let data = match data {
      Value::Null => None,
      other => Some(other),
    };
    ActionResponse {
      success: true,
      error: None,
      message: None,
      data,
    }
  }

  #[must_use]
  pub fn ok_empty() -> Self {
    ActionResponse {
      success: true,
      error: None,
      message: None,
      data: None,
    }
  }

  #[must_use]
  pub fn err(code: impl Into<String>) -> Self {
    ActionResponse {
      success: false,
      error: Some(code.into()),
      message: None,
      data: None,
    }
  }

  #[must_use]
  pub fn err_with_message(code: impl Into<String>, message: impl Into<String>) -> Self {
    ActionResponse {
      success: false,
      error: Some(code.into()),
      message: Some(message.into()),
      data: None,
    }
  }
}

impl From<crate::error::ActionError> for ActionResponse {
  fn from(e: crate::error::ActionError) -> Self {
    use crate::error::ActionError;
    match e {
      ActionError::Account(a) => ActionResponse::err(a.to_string()),
      ActionError::Session(s) => ActionResponse::err(s.to_string()),
      ActionError::Rule(r) => ActionResponse::err_with_message("GAME_RULE", r.to_string()),
      ActionError::UnknownAction(name) => ActionResponse::err(format!("Unknown action: {name}")),
      ActionError::InvalidJson => ActionResponse::err("INVALID_JSON"),
      ActionError::Internal(msg) => ActionResponse::err_with_message("ACTION_FAILED", msg),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test_log::test]
  fn request_defaults_missing_params_to_null() {
    let req: ActionRequest = serde_json::from_str(r#"{"action": "check_account"}"#).unwrap();
    assert_eq!(req.action, "check_account");
    assert!(req.params.is_null());
  }

  #[test_log::test]
  fn ok_empty_serializes_without_data_field() {
    let resp = ActionResponse::ok_empty();
    let v = serde_json::to_value(&resp).unwrap();
    assert_eq!(v, serde_json::json!({"success": true}));
  }

  #[test_log::test]
  fn err_with_message_round_trips() {
    let resp = ActionResponse::err_with_message("GAME_RULE", "insufficient credits");
    let v = serde_json::to_value(&resp).unwrap();
    assert_eq!(
      v,
      serde_json::json!({"success": false, "error": "GAME_RULE", "message": "insufficient credits"})
    );
  }

  #[test_log::test]
  fn unknown_action_error_formats_name() {
    let e = crate::error::ActionError::UnknownAction("bogus_action".to_string());
    let resp: ActionResponse = e.into();
    assert_eq!(resp.error.unwrap(), "Unknown action: bogus_action");
  }
}
