//! Window evaluation: which event, if any, may be registered right now.
//!
//! A window for a scheduled time `r` is open while `r <= now <= r + tolerance`
//! (minutes since local midnight, inclusive on both ends). The entrance
//! window is checked before the exit window, so when a large tolerance makes
//! them overlap, entrance wins.
//!
//! When neither window is open the result names the "next relevant" event:
//! entrance only if it has not been reached yet and is closer than exit,
//! exit otherwise. This label is guidance for display and carries no
//! guarantee for schedules that span midnight.

use chrono::NaiveTime;
use serde::Serialize;

use crate::event_type::EventType;
use crate::schedule::{Schedule, Tolerance, minutes_since_midnight};

/// Outcome of evaluating the windows at one instant. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub admissible: bool,
    pub event_type: EventType,
    #[serde(with = "crate::schedule::hhmm")]
    pub reference_time: NaiveTime,
}

fn window_open(reference: u32, tolerance: Tolerance, now_minutes: f64) -> bool {
    let start = f64::from(reference);
    let end = start + f64::from(tolerance.minutes());
    start <= now_minutes && now_minutes <= end
}

/// Evaluates `schedule` at `now_minutes` (minutes since local midnight).
pub fn evaluate(schedule: &Schedule, tolerance: Tolerance, now_minutes: f64) -> Evaluation {
    let entrance = minutes_since_midnight(schedule.entrance);
    let exit = minutes_since_midnight(schedule.exit);

    if window_open(entrance, tolerance, now_minutes) {
        return Evaluation {
            admissible: true,
            event_type: EventType::Entrance,
            reference_time: schedule.entrance,
        };
    }
    if window_open(exit, tolerance, now_minutes) {
        return Evaluation {
            admissible: true,
            event_type: EventType::Exit,
            reference_time: schedule.exit,
        };
    }

    let delta_entrance = now_minutes - f64::from(entrance);
    let delta_exit = now_minutes - f64::from(exit);
    let next = if delta_entrance < 0.0 && delta_entrance.abs() < delta_exit.abs() {
        EventType::Entrance
    } else {
        EventType::Exit
    };
    Evaluation {
        admissible: false,
        event_type: next,
        reference_time: match next {
            EventType::Entrance => schedule.entrance,
            EventType::Exit => schedule.exit,
        },
    }
}
