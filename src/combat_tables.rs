//! Small constant tables used by round resolution.
pub const BASE_HIT_CHANCE: f64 = 0.55;
pub const MIN_HIT_CHANCE: f64 = 0.2;
pub const MAX_HIT_CHANCE: f64 = 0.9;
pub const CRITICAL_CHANCE: f64 = 0.12;
pub const CRITICAL_MULTIPLIER: f64 = 1.5;

pub const HIT_DAMAGE_MIN_PER_FIGHTER: f64 = 8.0;
pub const HIT_DAMAGE_MAX_PER_FIGHTER: f64 = 14.0;
pub const GRAZE_DAMAGE_MAX_PER_FIGHTER: f64 = 2.0;

pub const DEFENDER_LOSS_DAMAGE_DIVISOR: f64 = 10.0;
pub const DEFENDER_LOSS_RANDOM_MAX: f64 = 2.0;
pub const INTEGRITY_BLEED_RATE: f64 = 0.5;

pub const VICTORY_LOOT_MIN_PCT: f64 = 0.25;
pub const VICTORY_LOOT_MAX_PCT: f64 = 0.60;
pub const CHALLENGE_BONUS_SCALE: f64 = 0.75;
pub const RARE_DROP_CHANCE: f64 = 0.12;
pub const VICTORY_ITEM_LOOT_MIN_PCT: f64 = 0.20;
pub const VICTORY_ITEM_LOOT_MAX_PCT: f64 = 0.50;
pub const RARE_DROP_ITEM_NAME: &str = "Salvaged Artifact";

pub const DEFEAT_CREDIT_LOSS_MIN_PCT: f64 = 0.15;
pub const DEFEAT_CREDIT_LOSS_MAX_PCT: f64 = 0.40;
pub const DEFEAT_MAX_ITEM_TYPES_LOST: usize = 3;
pub const DEFEAT_ITEM_LOSS_MIN_PCT: f64 = 0.05;
pub const DEFEAT_ITEM_LOSS_MAX_PCT: f64 = 0.30;

pub const FLEE_PENALTY_MIN_PCT: f64 = 0.05;
pub const FLEE_PENALTY_MAX_PCT: f64 = 0.15;
pub const FLEE_BAR_DURATION_HOURS: i64 = 24;
