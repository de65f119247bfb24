//! Client-side view of the game and order validation
//!
//! [`Commander`] keeps the last snapshot received from the server plus the
//! player's current selection, and turns selections into protocol messages.
//! Every order is checked locally with the same rules the server uses, so an
//! illegal order is reported to the player instead of being sent.

use log::debug;
use shared::rules::{check_move, check_reach};
use shared::{ClientMessage, GameState, Position, RuleViolation, Uid, Unit};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("no {0} selected")]
    NothingSelected(&'static str),
    #[error("not registered")]
    NotRegistered,
    #[error(transparent)]
    Rule(#[from] RuleViolation),
}

#[derive(Debug, Default)]
pub struct Commander {
    uid: Option<Uid>,
    state: GameState,
    selected_unit: Option<Position>,
    selected_defender: Option<Position>,
}

impl Commander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_uid(&mut self, uid: Uid) {
        self.uid = Some(uid);
    }

    pub fn uid(&self) -> Option<Uid> {
        self.uid
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Replaces the local view with a fresh server snapshot. Selections that
    /// no longer point at a unit are dropped.
    pub fn apply_status(&mut self, state: GameState) {
        self.state = state;
        if let Some(position) = self.selected_unit {
            if self.own_unit(position).is_none() {
                self.selected_unit = None;
            }
        }
        if let Some(position) = self.selected_defender {
            if self.state.unit_at(position).is_none() {
                self.selected_defender = None;
            }
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.uid.is_some() && self.uid == self.state.turn
    }

    pub fn own_units(&self) -> &[Unit] {
        self.uid
            .and_then(|uid| self.state.player(uid))
            .map(|player| player.units.as_slice())
            .unwrap_or(&[])
    }

    fn own_unit(&self, position: Position) -> Option<&Unit> {
        self.uid
            .and_then(|uid| self.state.player(uid))
            .and_then(|player| player.unit_at(position))
    }

    /// Selects one of the player's own units to act with.
    pub fn select_unit(&mut self, x: i32, y: i32) -> Result<&Unit, OrderError> {
        let position = Position::new(x, y);
        self.selected_unit = None;
        if self.own_unit(position).is_none() {
            return Err(RuleViolation::NoUnit(position).into());
        }
        self.selected_unit = Some(position);
        Ok(self
            .own_unit(position)
            .expect("unit presence checked above"))
    }

    /// Selects any unit on the board as an attack target, own units included.
    pub fn select_defender(&mut self, x: i32, y: i32) -> Result<&Unit, OrderError> {
        let position = Position::new(x, y);
        self.selected_defender = None;
        let (_, unit) = self
            .state
            .unit_at(position)
            .ok_or(RuleViolation::NoUnit(position))?;
        self.selected_defender = Some(position);
        Ok(unit)
    }

    fn selected(&self) -> Result<Unit, OrderError> {
        self.uid.ok_or(OrderError::NotRegistered)?;
        let position = self.selected_unit.ok_or(OrderError::NothingSelected("unit"))?;
        self.own_unit(position)
            .cloned()
            .ok_or(OrderError::Rule(RuleViolation::NoUnit(position)))
    }

    /// Builds a move order for the selected unit.
    ///
    /// On success the local view is updated as if the server had accepted the
    /// move and the selection follows the unit; the next snapshot overrides
    /// both.
    pub fn plan_move(&mut self, x: i32, y: i32) -> Result<ClientMessage, OrderError> {
        let mover = self.selected()?;
        let target = Position::new(x, y);
        check_move(&self.state, &mover, target)?;

        let from = mover.position();
        if let Some(unit) = self
            .uid
            .and_then(|uid| self.state.player_mut(uid))
            .and_then(|player| player.unit_at_mut(from))
        {
            unit.move_to(target);
        }
        self.selected_unit = Some(target);
        debug!("Planned move ({}, {}) -> ({}, {})", from.x, from.y, x, y);

        Ok(ClientMessage::Move {
            mover: from,
            x,
            y,
        })
    }

    /// Builds an attack order from the selected unit on the selected defender.
    pub fn plan_attack(&self) -> Result<ClientMessage, OrderError> {
        let attacker = self.selected()?;
        let defender = self
            .selected_defender
            .ok_or(OrderError::NothingSelected("defender"))?;
        check_reach(&attacker, defender)?;

        Ok(ClientMessage::Attack {
            attacker: attacker.position(),
            defender,
        })
    }

    /// Builds a finish order. The turn marker is cleared locally until the
    /// next snapshot says who holds it.
    pub fn plan_finish(&mut self) -> ClientMessage {
        self.state.turn = None;
        ClientMessage::Finish
    }
}
