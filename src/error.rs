//! The error taxonomy for the server, organized by kind rather than by
//! call site. Dispatch (see `dispatch.rs`) is the only place that turns
//! these into a wire-level `ActionResponse`; everywhere else they flow as
//! ordinary `Result`s.

use thiserror::Error;

/// Errors raised while creating, loading, or authenticating an account or
/// character save.
#[derive(Debug, Error)]
pub enum AccountError {
  #[error("NO_ACCOUNT")]
  NoAccount,
  #[error("ACCOUNT_EXISTS")]
  AccountExists,
  #[error("BLACKLISTED")]
  Blacklisted,
  #[error("ACCOUNT_DISABLED")]
  AccountDisabled,
  #[error("CORRUPT_ACCOUNT")]
  CorruptAccount,
  #[error("WRONG_PASSWORD")]
  WrongPassword,
  #[error("CORRUPT_SAVE")]
  CorruptSave,
  #[error("INVALID_INPUT")]
  InvalidInput,
  #[error("INVALID_CHARACTER_NAME")]
  InvalidCharacterName,
  #[error("SAVE_FAILED: {0}")]
  SaveFailed(String),
  #[error("LOAD_FAILED: {0}")]
  LoadFailed(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

/// Errors raised by session-state checks in dispatch (not yet authenticated,
/// no character selected, etc).
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("NOT_AUTHENTICATED")]
  NotAuthenticated,
  #[error("SESSION_NOT_READY")]
  SessionNotReady,
  #[error("CHARACTER_NOT_SELECTED")]
  CharacterNotSelected,
  #[error("CHARACTER_NOT_LINKED")]
  CharacterNotLinked,
  #[error("SINGLE_SAVE_LIMIT")]
  SingleSaveLimit,
  #[error("NAME_TAKEN")]
  NameTaken,
}

/// Game-rule failures: insufficient funds, locked contraband, cooldowns,
/// and the like. These always carry a human-readable message because the
/// client surfaces it verbatim.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GameRuleError(pub String);

impl GameRuleError {
  pub fn new(msg: impl Into<String>) -> Self {
    GameRuleError(msg.into())
  }
}

impl From<&str> for GameRuleError {
  fn from(s: &str) -> Self {
    GameRuleError(s.to_string())
  }
}

impl From<String> for GameRuleError {
  fn from(s: String) -> Self {
    GameRuleError(s)
  }
}

/// The union of every error a handler can return. Dispatch maps each
/// variant to the wire shape clients expect.
#[derive(Debug, Error)]
pub enum ActionError {
  #[error(transparent)]
  Account(#[from] AccountError),
  #[error(transparent)]
  Session(#[from] SessionError),
  #[error(transparent)]
  Rule(#[from] GameRuleError),
  #[error("Unknown action: {0}")]
  UnknownAction(String),
  #[error("INVALID_JSON")]
  InvalidJson,
  #[error("ACTION_FAILED: {0}")]
  Internal(String),
}

impl From<String> for ActionError {
  fn from(s: String) -> Self {
    ActionError::Rule(GameRuleError(s))
  }
}

impl From<&str> for ActionError {
  fn from(s: &str) -> Self {
    ActionError::Rule(GameRuleError(s.to_string()))
  }
}
