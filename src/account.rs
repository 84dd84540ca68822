//! On-disk account and character store: `<root>/<account_safe>/ACCOUNT.json`
//! plus one `<root>/<account_safe>/<character_safe>.json` per commander
//! save, with legacy flat-file migration and Argon2 password hashing.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AccountError;
use crate::{debug, info, warn};

const INTERNAL_PREFIXES: &[&str] = &["auth_", "combat_", "loop_", "market_", "msg_", "travel_"];

/// Lowercased, space-to-underscore canonical form of an account or
/// character name.
#[must_use]
pub fn safe_name(raw: &str) -> String {
  raw.trim().to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRef {
  pub character_safe: String,
  pub character_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
  pub account_safe: String,
  pub password_hash: String,
  #[serde(default)]
  pub characters: Vec<CharacterRef>,
  pub created_at: i64,
  pub last_login: i64,
  #[serde(default)]
  pub blacklisted: bool,
  #[serde(default)]
  pub account_disabled: bool,
}

/// Result of a successful `authenticate` call.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
  pub account_safe: String,
  pub requires_character_select: bool,
  pub requires_character_create: bool,
  pub auto_loaded_character: Option<String>,
  pub characters: Vec<CharacterRef>,
}

pub struct AccountStore {
  root: PathBuf,
  allow_multiple_games: bool,
}

fn now() -> i64 {
  chrono::Utc::now().timestamp()
}

fn hash_password(password: &str) -> Result<String, AccountError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| AccountError::SaveFailed(format!("hash error: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// A file counts as an account record only if it parses as JSON and
/// carries a `password_hash` field; this is how the store tells account
/// files and character saves apart.
fn file_has_password_hash(path: &Path) -> bool {
  let Ok(raw) = std::fs::read_to_string(path) else {
    return false;
  };
  let Ok(v) = serde_json::from_str::<Value>(&raw) else {
    return false;
  };
  v.get("password_hash").and_then(Value::as_str).is_some()
}

impl AccountStore {
  #[must_use]
  pub fn new(root: PathBuf, allow_multiple_games: bool) -> Self {
    AccountStore {
      root,
      allow_multiple_games,
    }
  }

  fn account_dir(&self, account_safe: &str) -> PathBuf {
    self.root.join(account_safe)
  }

  fn account_json_path(&self, account_safe: &str) -> PathBuf {
    self.account_dir(account_safe).join("ACCOUNT.json")
  }

  fn legacy_account_path(&self, account_safe: &str) -> PathBuf {
    self.root.join(format!("{account_safe}.json"))
  }

  /// Migrate a legacy flat `<account>.json` auth record into the
  /// per-account directory, if present. No-op if already migrated or if
  /// the legacy file is actually a character save.
  fn migrate_if_needed(&self, account_safe: &str) -> Result<(), AccountError> {
    let legacy = self.legacy_account_path(account_safe);
    if !legacy.exists() {
      return Ok(());
    }
    if !file_has_password_hash(&legacy) {
      return Ok(());
    }
    let dir = self.account_dir(account_safe);
    std::fs::create_dir_all(&dir)?;
    let dest = self.account_json_path(account_safe);
    if !dest.exists() {
      std::fs::rename(&legacy, &dest)?;
      info!("Migrated legacy account file for {account_safe} into directory layout");
    }
    Ok(())
  }

  #[must_use]
  pub fn exists(&self, account_name: &str) -> bool {
    let account_safe = safe_name(account_name);
    if self.migrate_if_needed(&account_safe).is_err() {
      warn!("Migration check failed for {account_safe}");
    }
    self.account_json_path(&account_safe).exists() || self.legacy_account_path(&account_safe).exists()
  }

  pub fn create_account(&self, account_name: &str, password: &str, first_character: &str) -> Result<(), AccountError> {
    let account_safe = safe_name(account_name);
    if account_safe.is_empty() {
      return Err(AccountError::InvalidInput);
    }
    let character_safe = safe_name(first_character);
    if character_safe.is_empty() || character_safe == "account" {
      return Err(AccountError::InvalidCharacterName);
    }
    if self.exists(account_name) {
      return Err(AccountError::AccountExists);
    }

    let dir = self.account_dir(&account_safe);
    std::fs::create_dir_all(&dir)?;

    let record = AccountRecord {
      account_safe: account_safe.clone(),
      password_hash: hash_password(password)?,
      characters: vec![CharacterRef {
        character_safe,
        character_name: first_character.to_string(),
      }],
      created_at: now(),
      last_login: now(),
      blacklisted: false,
      account_disabled: false,
    };
    self.write_account(&record)?;
    debug!("Created account {account_safe}");
    Ok(())
  }

  fn write_account(&self, record: &AccountRecord) -> Result<(), AccountError> {
    let dir = self.account_dir(&record.account_safe);
    std::fs::create_dir_all(&dir)?;
    let path = self.account_json_path(&record.account_safe);
    atomic_write_json(&path, record)?;
    Ok(())
  }

  fn read_account(&self, account_safe: &str) -> Result<AccountRecord, AccountError> {
    self.migrate_if_needed(account_safe)?;
    let path = self.account_json_path(account_safe);
    let raw = std::fs::read_to_string(&path).map_err(|_| AccountError::NoAccount)?;
    serde_json::from_str(&raw).map_err(|_| AccountError::CorruptAccount)
  }

  pub fn authenticate(&self, account_name: &str, password: &str) -> Result<AuthOutcome, AccountError> {
    let account_safe = safe_name(account_name);
    let mut record = self.read_account(&account_safe)?;

    if record.blacklisted {
      return Err(AccountError::Blacklisted);
    }
    if record.account_disabled {
      return Err(AccountError::AccountDisabled);
    }
    if !verify_password(password, &record.password_hash) {
      return Err(AccountError::WrongPassword);
    }

    record.last_login = now();
    self.write_account(&record)?;

    let characters = self.list_characters(&account_safe)?;
    let requires_character_create = characters.is_empty();
    let requires_character_select = if self.allow_multiple_games {
      !characters.is_empty()
    } else {
      characters.len() > 1
    };
    let auto_loaded_character = if !self.allow_multiple_games && characters.len() == 1 {
      Some(characters[0].character_safe.clone())
    } else {
      None
    };

    Ok(AuthOutcome {
      account_safe,
      requires_character_select,
      requires_character_create,
      auto_loaded_character,
      characters,
    })
  }

  /// Enumerate characters for an account per the union/dedup rule in
  /// §4.2: directory files, `ACCOUNT.json#characters`, matching root
  /// saves, then (only under the orphan-claim conditions) unmatched
  /// simple-named root saves.
  pub fn list_characters(&self, account_safe: &str) -> Result<Vec<CharacterRef>, AccountError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    let dir = self.account_dir(account_safe);
    if let Ok(entries) = std::fs::read_dir(&dir) {
      let mut names: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
      names.sort();
      for path in names {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
          continue;
        };
        if stem.eq_ignore_ascii_case("account") {
          continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
          continue;
        }
        if file_has_password_hash(&path) {
          continue;
        }
        if seen.insert(stem.to_string()) {
          out.push(CharacterRef {
            character_safe: stem.to_string(),
            character_name: display_name_from_file(&path).unwrap_or_else(|| stem.to_string()),
          });
        }
      }
    }

    if let Ok(record) = self.read_account(account_safe) {
      for c in record.characters {
        if seen.insert(c.character_safe.clone()) {
          out.push(c);
        }
      }

      if let Ok(root_entries) = std::fs::read_dir(&self.root) {
        for entry in root_entries.filter_map(Result::ok) {
          let path = entry.path();
          if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
          }
          let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
          };
          if file_has_password_hash(&path) {
            continue;
          }
          let Ok(raw) = std::fs::read_to_string(&path) else {
            continue;
          };
          let Ok(v) = serde_json::from_str::<Value>(&raw) else {
            continue;
          };
          if v.get("account_name").and_then(Value::as_str) == Some(account_safe) && seen.insert(stem.to_string()) {
            out.push(CharacterRef {
              character_safe: stem.to_string(),
              character_name: display_name_from_value(&v).unwrap_or_else(|| stem.to_string()),
            });
          }
        }
      }

      if out.len() <= 1 && !record.password_hash.is_empty() {
        if let Ok(root_entries) = std::fs::read_dir(&self.root) {
          for entry in root_entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
              continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
              continue;
            };
            if seen.contains(stem) || file_has_password_hash(&path) {
              continue;
            }
            if stem.contains('/') || stem.contains('.') {
              continue;
            }
            if INTERNAL_PREFIXES.iter().any(|p| stem.starts_with(p)) {
              continue;
            }
            let Ok(raw) = std::fs::read_to_string(&path) else {
              continue;
            };
            let Ok(v) = serde_json::from_str::<Value>(&raw) else {
              continue;
            };
            if v.get("account_name").is_some() {
              continue;
            }
            if seen.insert(stem.to_string()) {
              out.push(CharacterRef {
                character_safe: stem.to_string(),
                character_name: display_name_from_value(&v).unwrap_or_else(|| stem.to_string()),
              });
            }
          }
        }
      }
    }

    out.sort_by(|a, b| {
      let a_self = a.character_safe == account_safe;
      let b_self = b.character_safe == account_safe;
      match (a_self, b_self) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a
          .character_name
          .to_lowercase()
          .cmp(&b.character_name.to_lowercase()),
      }
    });

    Ok(out)
  }

  /// Move a root-level character save into the account directory, stamp
  /// its identity fields, and register it in `ACCOUNT.json#characters`.
  pub fn link_character(&self, account_safe: &str, character_safe: &str, character_name: &str) -> Result<(), AccountError> {
    let legacy_path = self.root.join(format!("{character_safe}.json"));
    let target_path = self.account_dir(account_safe).join(format!("{character_safe}.json"));

    if legacy_path.exists() && !target_path.exists() {
      let raw = std::fs::read_to_string(&legacy_path)?;
      let mut v: Value = serde_json::from_str(&raw).map_err(|_| AccountError::CorruptSave)?;
      if let Value::Object(ref mut map) = v {
        map.insert("account_name".to_string(), Value::String(account_safe.to_string()));
        map.insert("character_name".to_string(), Value::String(character_name.to_string()));
      }
      std::fs::create_dir_all(self.account_dir(account_safe))?;
      atomic_write_json(&target_path, &v)?;
      std::fs::remove_file(&legacy_path)?;
    }

    let mut record = self.read_account(account_safe)?;
    if !record.characters.iter().any(|c| c.character_safe == character_safe) {
      record.characters.push(CharacterRef {
        character_safe: character_safe.to_string(),
        character_name: character_name.to_string(),
      });
      self.write_account(&record)?;
    }
    Ok(())
  }

  #[must_use]
  pub fn character_path(&self, account_safe: &str, character_safe: &str) -> PathBuf {
    self.account_dir(account_safe).join(format!("{character_safe}.json"))
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }
}

fn display_name_from_file(path: &Path) -> Option<String> {
  let raw = std::fs::read_to_string(path).ok()?;
  let v: Value = serde_json::from_str(&raw).ok()?;
  display_name_from_value(&v)
}

fn display_name_from_value(v: &Value) -> Option<String> {
  v.get("character_name")
    .and_then(Value::as_str)
    .map(std::string::ToString::to_string)
}

/// Write via temp-file + rename so readers never observe a partial file
/// so readers never observe a partial file.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let tmp = path.with_extension("json.tmp");
  let body = serde_json::to_vec_pretty(value)?;
  std::fs::write(&tmp, body)?;
  std::fs::rename(&tmp, path)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("sector_account_test_{}_{}", std::process::id(), now()))
  }

  #[test_log::test]
  fn safe_name_lowercases_and_replaces_spaces() {
    assert_eq!(safe_name("Jane Doe"), "jane_doe");
  }

  #[test_log::test]
  fn create_then_authenticate_round_trips() {
    let root = temp_root();
    let store = AccountStore::new(root.clone(), false);
    store.create_account("Jane Doe", "hunter2", "Jane Doe").unwrap();
    assert!(store.exists("Jane Doe"));

    let outcome = store.authenticate("Jane Doe", "hunter2").unwrap();
    assert_eq!(outcome.account_safe, "jane_doe");
    assert!(!outcome.requires_character_create);
    assert_eq!(outcome.auto_loaded_character.as_deref(), Some("jane_doe"));

    std::fs::remove_dir_all(&root).ok();
  }

  #[test_log::test]
  fn wrong_password_is_rejected() {
    let root = temp_root();
    let store = AccountStore::new(root.clone(), false);
    store.create_account("Jane", "hunter2", "Jane").unwrap();
    let err = store.authenticate("Jane", "wrong").unwrap_err();
    assert!(matches!(err, AccountError::WrongPassword));
    std::fs::remove_dir_all(&root).ok();
  }

  #[test_log::test]
  fn duplicate_create_account_fails() {
    let root = temp_root();
    let store = AccountStore::new(root.clone(), false);
    store.create_account("Jane", "hunter2", "Jane").unwrap();
    let err = store.create_account("Jane", "hunter2", "Jane").unwrap_err();
    assert!(matches!(err, AccountError::AccountExists));
    std::fs::remove_dir_all(&root).ok();
  }

  #[test_log::test]
  fn empty_character_name_is_invalid() {
    let root = temp_root();
    let store = AccountStore::new(root.clone(), false);
    let err = store.create_account("Jane", "hunter2", "").unwrap_err();
    assert!(matches!(err, AccountError::InvalidCharacterName));
    std::fs::remove_dir_all(&root).ok();
  }
}
