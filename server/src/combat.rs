//! Attack validation
//!
//! An attack is legal when the defender sits inside the attacker's inclusive
//! `[minreach, maxreach]` band. Legal attacks become [`AttackEvent`]s and are
//! handed to a [`DamagePolicy`]. Hit points and unit death are not modelled
//! yet; the default policy leaves the state untouched.

use log::debug;
use shared::rules::check_reach;
use shared::{GameState, Position, RuleViolation, Uid, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    /// Ordered by the attacker's owner.
    Ordered,
    /// Triggered by an enemy moving past the attacker.
    Opportunity,
}

/// A validated attack, as seen at the moment it was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackEvent {
    pub kind: AttackKind,
    pub attacker_owner: Uid,
    pub attacker: Unit,
    pub defender_owner: Uid,
    pub defender: Unit,
    pub distance: f64,
}

/// Extension point for combat effects.
///
/// Runs inside the store's critical section, so implementations must not
/// block.
pub trait DamagePolicy: Send + Sync {
    fn apply(&self, state: &mut GameState, event: &AttackEvent);
}

/// Records nothing and changes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDamage;

impl DamagePolicy for NoDamage {
    fn apply(&self, _state: &mut GameState, _event: &AttackEvent) {}
}

pub struct CombatResolver {
    policy: Box<dyn DamagePolicy>,
}

impl CombatResolver {
    pub fn new<D: DamagePolicy + 'static>(policy: D) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Resolves an attack ordered by `uid`.
    ///
    /// The attacker must stand at `attacker` in `uid`'s own roster; the
    /// defender may belong to anyone. Reach is checked against the stored
    /// unit, not whatever profile the client believes it has.
    pub fn resolve(
        &self,
        state: &mut GameState,
        uid: Uid,
        attacker: Position,
        defender: Position,
    ) -> Result<AttackEvent, RuleViolation> {
        let attacking_unit = state
            .player(uid)
            .ok_or(RuleViolation::UnknownPlayer(uid))?
            .unit_at(attacker)
            .cloned()
            .ok_or(RuleViolation::NoUnit(attacker))?;
        let (defender_owner, defending_unit) = state
            .unit_at(defender)
            .map(|(owner, unit)| (owner, unit.clone()))
            .ok_or(RuleViolation::NoUnit(defender))?;

        self.strike(
            state,
            AttackKind::Ordered,
            (uid, attacking_unit),
            (defender_owner, defending_unit),
        )
    }

    /// Validates reach between two known units and applies the policy.
    pub fn strike(
        &self,
        state: &mut GameState,
        kind: AttackKind,
        (attacker_owner, attacker): (Uid, Unit),
        (defender_owner, defender): (Uid, Unit),
    ) -> Result<AttackEvent, RuleViolation> {
        let distance = check_reach(&attacker, defender.position())?;

        let event = AttackEvent {
            kind,
            attacker_owner,
            attacker,
            defender_owner,
            defender,
            distance,
        };
        debug!(
            "{:?} attack by player {} at ({}, {}) on player {} at ({}, {})",
            event.kind,
            event.attacker_owner,
            event.attacker.x,
            event.attacker.y,
            event.defender_owner,
            event.defender.x,
            event.defender.y
        );

        self.policy.apply(state, &event);
        Ok(event)
    }
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::new(NoDamage)
    }
}
