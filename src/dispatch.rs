//! Static action-name to handler lookup. Every wire action is registered
//! here exactly once; unregistered names fall through to a generic
//! protocol error without touching session state.
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::game::AppState;
use crate::handlers::{analytics, auth, banking, combat, factions, messaging, misc, navigation, player_info, ship_ops, trade};
use crate::payloads::ActionResponse;
use crate::session::Session;

type HandlerFn = fn(&Arc<AppState>, &mut Session, Value) -> ActionResponse;

static TABLE: Lazy<HashMap<&'static str, HandlerFn>> = Lazy::new(|| {
  let mut m: HashMap<&'static str, HandlerFn> = HashMap::new();

  // Auth/session
  m.insert("check_account", auth::check_account);
  m.insert("create_account", auth::create_account);
  m.insert("authenticate", auth::authenticate);
  m.insert("list_characters", auth::list_characters);
  m.insert("select_character", auth::select_character);
  m.insert("logout_commander", auth::logout_commander);
  m.insert("new_game", auth::new_game);
  m.insert("load_game", auth::load_game);
  m.insert("save_game", auth::save_game);
  m.insert("list_saves", auth::list_saves);
  m.insert("sync_assets", auth::sync_assets);

  // Player/planet info
  m.insert("get_player_info", player_info::get_player_info);
  m.insert("get_current_planet_info", player_info::get_current_planet_info);
  m.insert("get_docking_fee", player_info::get_docking_fee);
  m.insert("get_config", player_info::get_config);
  m.insert("get_winner_board", player_info::get_winner_board);
  m.insert("get_all_commander_statuses", player_info::get_all_commander_statuses);

  // Economy
  m.insert("trade_item", trade::trade_item);
  m.insert("buy_item", trade::buy_item);
  m.insert("sell_item", trade::sell_item);
  m.insert("jettison_cargo", trade::jettison_cargo);
  m.insert("get_market_sell_price", trade::get_market_sell_price);
  m.insert("get_effective_buy_price", trade::get_effective_buy_price);
  m.insert("get_item_market_snapshot", trade::get_item_market_snapshot);
  m.insert("get_best_trade_opportunities", trade::get_best_trade_opportunities);
  m.insert("get_bribe_market_snapshot", trade::get_bribe_market_snapshot);
  m.insert("get_contraband_market_context", trade::get_contraband_market_context);
  m.insert("get_smuggling_item_names", trade::get_smuggling_item_names);
  m.insert("check_contraband_detection", trade::check_contraband_detection);
  m.insert("bribe_npc", trade::bribe_npc);
  m.insert("sell_non_market_cargo", trade::sell_non_market_cargo);
  m.insert("get_active_trade_contract", trade::get_active_trade_contract);
  m.insert("reroll_trade_contract", trade::reroll_trade_contract);

  // Ship
  m.insert("buy_fuel", ship_ops::buy_fuel);
  m.insert("get_refuel_quote", ship_ops::get_refuel_quote);
  m.insert("repair_hull", ship_ops::repair_hull);
  m.insert("buy_ship", ship_ops::buy_ship);
  m.insert("transfer_fighters", ship_ops::transfer_fighters);
  m.insert("transfer_shields", ship_ops::transfer_shields);
  m.insert("check_auto_refuel", ship_ops::check_auto_refuel);
  m.insert("install_ship_upgrade", ship_ops::install_ship_upgrade);

  // Navigation
  m.insert("travel_to_planet", navigation::travel_to_planet);
  m.insert("get_planets", navigation::get_planets);
  m.insert("get_known_planets", navigation::get_known_planets);
  m.insert("roll_travel_event_payload", navigation::roll_travel_event_payload);
  m.insert("resolve_travel_event_payload", navigation::resolve_travel_event_payload);

  // Combat
  m.insert("get_orbit_targets", combat::get_orbit_targets);
  m.insert("start_combat_session", combat::start_combat_session);
  m.insert("resolve_combat_round", combat::resolve_combat_round);
  m.insert("flee_combat_session", combat::flee_combat_session);
  m.insert("fire_special_weapon", combat::fire_special_weapon);
  m.insert("get_special_weapon_status", combat::get_special_weapon_status);
  m.insert("should_initialize_planet_auto_combat", combat::should_initialize_planet_auto_combat);
  m.insert("_get_target_stats", combat::get_target_stats);

  // Banking
  m.insert("bank_deposit", banking::bank_deposit);
  m.insert("bank_withdraw", banking::bank_withdraw);
  m.insert("payout_interest", banking::payout_interest);
  m.insert("get_planet_financials", banking::get_planet_financials);
  m.insert("planet_deposit", banking::planet_deposit);
  m.insert("planet_withdraw", banking::planet_withdraw);
  m.insert("get_planet_crew_offers", banking::get_planet_crew_offers);
  m.insert("process_crew_pay", banking::process_crew_pay);

  // Factions/events
  m.insert("get_authority_standing_label", factions::get_authority_standing_label);
  m.insert("get_frontier_standing_label", factions::get_frontier_standing_label);
  m.insert("_get_authority_standing", factions::get_authority_standing);
  m.insert("_get_frontier_standing", factions::get_frontier_standing);
  m.insert("_adjust_authority_standing", factions::adjust_authority_standing);
  m.insert("_adjust_frontier_standing", factions::adjust_frontier_standing);
  m.insert("check_barred", factions::check_barred);
  m.insert("bar_player", factions::bar_player);
  m.insert("get_planet_event", factions::get_planet_event);
  m.insert("is_planet_hostile_market", factions::is_planet_hostile_market);
  m.insert("get_planet_price_penalty_seconds_remaining", factions::get_planet_price_penalty_seconds_remaining);
  m.insert("get_current_port_spotlight_deal", factions::get_current_port_spotlight_deal);
  m.insert("process_conquered_planet_defense_regen", factions::process_conquered_planet_defense_regen);
  m.insert("process_commander_stipend", factions::process_commander_stipend);
  m.insert("has_unseen_galactic_news", factions::has_unseen_galactic_news);
  m.insert("get_unseen_galactic_news", factions::get_unseen_galactic_news);
  m.insert("mark_galactic_news_seen", factions::mark_galactic_news_seen);

  // Messaging
  m.insert("send_message", messaging::send_message);
  m.insert("mark_message_read", messaging::mark_message_read);
  m.insert("delete_message", messaging::delete_message);
  m.insert("gift_cargo_to_orbit_target", messaging::gift_cargo_to_orbit_target);
  m.insert("get_other_players", messaging::get_other_players);

  // Misc
  m.insert("claim_abandoned_ship", misc::claim_abandoned_ship);
  m.insert("get_ship_level", ship_ops::get_ship_level);
  m.insert("get_spaceships", ship_ops::get_spaceships);
  m.insert("_load_shared_planet_states", misc::load_shared_planet_states);

  // Analytics
  m.insert("get_analytics_summary", analytics::get_analytics_summary);
  m.insert("get_analytics_events", analytics::get_analytics_events);
  m.insert("get_analytics_recommendations", analytics::get_analytics_recommendations);
  m.insert("reset_analytics", analytics::reset_analytics);
  m.insert("record_analytics_event", analytics::record_analytics_event);

  m
});

/// Look up `action` and invoke its handler, or return a generic protocol
/// error if no handler is registered under that name.
pub fn dispatch(action: &str, state: &Arc<AppState>, session: &mut Session, params: Value) -> ActionResponse {
  match TABLE.get(action) {
    Some(handler) => handler(state, session, params),
    None => crate::error::ActionError::UnknownAction(action.to_string()).into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GameConfig;
  use serde_json::json;

  fn temp_state() -> Arc<AppState> {
    let root = std::env::temp_dir().join(format!(
      "sector_dispatch_test_{}_{}",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    ));
    Arc::new(AppState::load(root, GameConfig::default(), true).unwrap())
  }

  #[test_log::test]
  fn unknown_action_returns_protocol_error() {
    let state = temp_state();
    let mut session = Session::new();
    let resp = dispatch("does_not_exist", &state, &mut session, json!({}));
    assert!(!resp.success);
  }

  #[test_log::test]
  fn known_action_reaches_its_handler() {
    let state = temp_state();
    let mut session = Session::new();
    let resp = dispatch("check_account", &state, &mut session, json!({"account_name": "x"}));
    assert!(resp.success);
  }
}
