//! Inter-player mailbox: bounded inbox with an eviction rule for the
//! oldest unsaved message, plus a saved-message archive with its own cap.
use serde::{Deserialize, Serialize};

use crate::player::Player;

const BODY_MAX_LEN: usize = 500;
const INBOX_CAP: usize = 20;
const ARCHIVE_CAP: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub id: String,
  pub sender: String,
  pub recipient: String,
  pub subject: String,
  pub body: String,
  pub timestamp: i64,
  pub is_read: bool,
  pub is_saved: bool,
}

fn short_id(rng: &mut impl rand::RngCore) -> String {
  use crate::rng::uniform_int;
  format!("msg_{:08x}", uniform_int(rng, 0, i64::from(u32::MAX)) as u32)
}

impl Message {
  #[must_use]
  pub fn new(sender: String, recipient: String, subject: String, body: String, now: i64, rng: &mut impl rand::RngCore) -> Self {
    let mut body = body;
    body.truncate(BODY_MAX_LEN);
    Message {
      id: short_id(rng),
      sender,
      recipient,
      subject,
      body,
      timestamp: now,
      is_read: false,
      is_saved: false,
    }
  }
}

/// Append `msg` to `player.messages`, evicting the oldest non-saved
/// message if the inbox is full.
pub fn deliver(player: &mut Player, msg: Message) {
  let non_saved_count = player.messages.iter().filter(|m| !m.is_saved).count();
  if non_saved_count >= INBOX_CAP {
    if let Some(pos) = player
      .messages
      .iter()
      .position(|m| !m.is_saved)
    {
      player.messages.remove(pos);
    }
  }
  player.messages.push(msg);
}

/// Move a message to the saved archive; refused if the archive is full.
pub fn save_message(player: &mut Player, message_id: &str) -> Result<(), &'static str> {
  let saved_count = player.messages.iter().filter(|m| m.is_saved).count();
  let Some(msg) = player.messages.iter_mut().find(|m| m.id == message_id) else {
    return Err("MESSAGE_NOT_FOUND");
  };
  if msg.is_saved {
    return Ok(());
  }
  if saved_count >= ARCHIVE_CAP {
    return Err("ARCHIVE_FULL");
  }
  msg.is_saved = true;
  Ok(())
}

pub fn mark_read(player: &mut Player, message_id: &str) -> bool {
  if let Some(msg) = player.messages.iter_mut().find(|m| m.id == message_id) {
    msg.is_read = true;
    true
  } else {
    false
  }
}

pub fn delete_message(player: &mut Player, message_id: &str) -> bool {
  let before = player.messages.len();
  player.messages.retain(|m| m.id != message_id);
  player.messages.len() != before
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  #[test_log::test]
  fn deliver_evicts_oldest_non_saved_when_full() {
    let mut player = Player::new("Jane".into(), 0, "Alderon".into());
    let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
    for i in 0..INBOX_CAP {
      deliver(
        &mut player,
        Message::new("sys".into(), "Jane".into(), format!("s{i}"), "b".into(), i as i64, &mut rng),
      );
    }
    assert_eq!(player.messages.len(), INBOX_CAP);
    deliver(
      &mut player,
      Message::new("sys".into(), "Jane".into(), "new".into(), "b".into(), 999, &mut rng),
    );
    assert_eq!(player.messages.len(), INBOX_CAP);
    assert_eq!(player.messages.last().unwrap().subject, "new");
    assert_eq!(player.messages[0].subject, "s1");
  }

  #[test_log::test]
  fn body_truncated_at_500_chars() {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
    let long_body = "x".repeat(600);
    let msg = Message::new("a".into(), "b".into(), "s".into(), long_body, 0, &mut rng);
    assert_eq!(msg.body.len(), 500);
  }

  #[test_log::test]
  fn save_message_refuses_when_archive_full() {
    let mut player = Player::new("Jane".into(), 0, "Alderon".into());
    let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
    for i in 0..ARCHIVE_CAP {
      let msg = Message::new("a".into(), "Jane".into(), format!("s{i}"), "b".into(), i as i64, &mut rng);
      deliver(&mut player, msg.clone());
      save_message(&mut player, &msg.id).unwrap();
    }
    let overflow = Message::new("a".into(), "Jane".into(), "last".into(), "b".into(), 999, &mut rng);
    deliver(&mut player, overflow.clone());
    assert_eq!(save_message(&mut player, &overflow.id), Err("ARCHIVE_FULL"));
  }
}
