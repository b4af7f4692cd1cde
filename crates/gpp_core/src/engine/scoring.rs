//! Fixed DraftKings-style scoring rules.
//!
//! These are inputs of the engine, not a generic rule system: each position
//! category maps (volume output, scoring events) to points with its own
//! per-yard rate, per-event value, and bonus breakpoint.

use crate::models::Position;

pub const PASS_YARD_POINTS: f64 = 0.04;
pub const PASS_TD_POINTS: f64 = 4.0;
pub const RUSH_RECV_YARD_POINTS: f64 = 0.1;
pub const RUSH_RECV_TD_POINTS: f64 = 6.0;
/// 300 passing yards / 100 rushing-receiving yards bonus.
pub const PASS_BONUS_YARDS: f64 = 300.0;
pub const YARDAGE_BONUS_YARDS: f64 = 100.0;
pub const YARDAGE_BONUS_POINTS: f64 = 3.0;
/// Sacks, takeaways and other defensive scoring events.
pub const DST_EVENT_POINTS: f64 = 2.0;

/// Convert one trial's volume output and event count into fantasy points.
/// The result is clamped at zero; negative inputs never propagate.
pub fn points(position: Position, volume: f64, events: u64) -> f64 {
    let volume = volume.max(0.0);
    let raw = match position {
        Position::Qb => {
            let bonus = if volume >= PASS_BONUS_YARDS { YARDAGE_BONUS_POINTS } else { 0.0 };
            volume * PASS_YARD_POINTS + events as f64 * PASS_TD_POINTS + bonus
        }
        Position::Rb | Position::Wr | Position::Te => {
            let bonus = if volume >= YARDAGE_BONUS_YARDS { YARDAGE_BONUS_POINTS } else { 0.0 };
            volume * RUSH_RECV_YARD_POINTS + events as f64 * RUSH_RECV_TD_POINTS + bonus
        }
        // DST volume output is opponent points allowed.
        Position::Dst => points_allowed_tier(volume) + events as f64 * DST_EVENT_POINTS,
    };
    raw.max(0.0)
}

/// DK points-allowed tiers for a defense.
pub fn points_allowed_tier(points_allowed: f64) -> f64 {
    let pa = points_allowed.max(0.0);
    if pa < 1.0 {
        10.0
    } else if pa < 7.0 {
        7.0
    } else if pa < 14.0 {
        4.0
    } else if pa < 21.0 {
        1.0
    } else if pa < 28.0 {
        0.0
    } else if pa < 35.0 {
        -1.0
    } else {
        -4.0
    }
}
