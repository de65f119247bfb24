//! Spatial and combat rules.
//!
//! These checks run on both sides of the wire: the client uses them to refuse
//! an order before sending it, the server re-runs them against its own state.

use crate::types::{GameState, Position, Uid, Unit};
use std::collections::HashSet;
use thiserror::Error;

/// A request that is well-formed but breaks a game rule. These are expected
/// outcomes, not protocol errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleViolation {
    #[error("tile ({}, {}) is occupied", .0.x, .0.y)]
    Occupied(Position),
    #[error("move of {distance:.2} exceeds speed {speed}")]
    TooFar { distance: f64, speed: u32 },
    #[error("target at {distance:.2} is outside reach [{minreach}, {maxreach}]")]
    OutOfReach {
        distance: f64,
        minreach: u32,
        maxreach: u32,
    },
    #[error("no unit at ({}, {})", .0.x, .0.y)]
    NoUnit(Position),
    #[error("player {0} has no roster")]
    UnknownPlayer(Uid),
}

pub fn distance(from: Position, to: Position) -> f64 {
    from.distance_to(to)
}

/// True if any unit of any player stands on `position`.
pub fn is_occupied(state: &GameState, position: Position) -> bool {
    state.unit_at(position).is_some()
}

/// Checks whether `mover` may move to `target`.
///
/// Occupancy is global and checked first. A move of exactly `speed` is legal.
pub fn check_move(state: &GameState, mover: &Unit, target: Position) -> Result<(), RuleViolation> {
    if is_occupied(state, target) {
        return Err(RuleViolation::Occupied(target));
    }

    let distance = distance(mover.position(), target);
    if distance > f64::from(mover.speed) {
        return Err(RuleViolation::TooFar {
            distance,
            speed: mover.speed,
        });
    }

    Ok(())
}

/// Checks that `target` lies within the attacker's inclusive reach band and
/// returns the distance.
pub fn check_reach(attacker: &Unit, target: Position) -> Result<f64, RuleViolation> {
    let distance = distance(attacker.position(), target);
    if distance < f64::from(attacker.minreach) || distance > f64::from(attacker.maxreach) {
        return Err(RuleViolation::OutOfReach {
            distance,
            minreach: attacker.minreach,
            maxreach: attacker.maxreach,
        });
    }
    Ok(distance)
}

/// Checks that a roster about to be stored for `uid` keeps every tile
/// single-occupancy. Units already owned by `uid` are ignored, since the
/// roster replaces them.
pub fn check_roster(state: &GameState, uid: Uid, units: &[Unit]) -> Result<(), RuleViolation> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        let position = unit.position();
        if !seen.insert(position) {
            return Err(RuleViolation::Occupied(position));
        }
        if let Some((owner, _)) = state.unit_at(position) {
            if owner != uid {
                return Err(RuleViolation::Occupied(position));
            }
        }
    }
    Ok(())
}
