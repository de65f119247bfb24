//! Move validation and application
//!
//! A move is checked for global occupancy and for speed, then any
//! opportunity attacks it provokes are resolved against the mover, and only
//! then is the mover's position updated.

use crate::combat::{AttackEvent, AttackKind, CombatResolver};
use log::debug;
use shared::rules::check_move;
use shared::{GameState, Position, RuleViolation, Uid, Unit};

/// Decides which units get a free attack on a unit moving from its current
/// tile to `target`. Returns the tiles those attackers stand on.
pub trait OpportunityPolicy: Send + Sync {
    fn attackers(
        &self,
        state: &GameState,
        mover_owner: Uid,
        mover: &Unit,
        target: Position,
    ) -> Vec<Position>;
}

/// Moving never provokes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpportunityAttacks;

impl OpportunityPolicy for NoOpportunityAttacks {
    fn attackers(&self, _: &GameState, _: Uid, _: &Unit, _: Position) -> Vec<Position> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub from: Position,
    pub to: Position,
    /// Opportunity attacks resolved before the unit moved.
    pub opportunity_attacks: Vec<AttackEvent>,
}

pub struct MovementResolver {
    policy: Box<dyn OpportunityPolicy>,
}

impl MovementResolver {
    pub fn new<O: OpportunityPolicy + 'static>(policy: O) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Moves the unit standing at `from` in `uid`'s roster to `to`.
    ///
    /// Occupancy and speed are checked before anything changes, so those
    /// failures leave the state as it was. Opportunity attacks are applied
    /// before the move and their effects stay even if the mover does not
    /// survive them, in which case the move fails with `NoUnit`.
    pub fn resolve(
        &self,
        state: &mut GameState,
        combat: &CombatResolver,
        uid: Uid,
        from: Position,
        to: Position,
    ) -> Result<MoveOutcome, RuleViolation> {
        let mover = state
            .player(uid)
            .ok_or(RuleViolation::UnknownPlayer(uid))?
            .unit_at(from)
            .cloned()
            .ok_or(RuleViolation::NoUnit(from))?;

        check_move(state, &mover, to)?;

        let mut opportunity_attacks = Vec::new();
        for position in self.policy.attackers(state, uid, &mover, to) {
            let Some((owner, attacker)) = state
                .unit_at(position)
                .map(|(owner, unit)| (owner, unit.clone()))
            else {
                continue;
            };
            // The mover's current profile, in case an earlier attack changed it.
            let Some(target) = state
                .player(uid)
                .and_then(|player| player.unit_at(from))
                .cloned()
            else {
                break;
            };

            match combat.strike(
                state,
                AttackKind::Opportunity,
                (owner, attacker),
                (uid, target),
            ) {
                Ok(event) => opportunity_attacks.push(event),
                Err(violation) => {
                    debug!("Opportunity attack from {:?} dropped: {}", position, violation)
                }
            }
        }

        // A damage policy may have removed the mover.
        let unit = state
            .player_mut(uid)
            .and_then(|player| player.unit_at_mut(from))
            .ok_or(RuleViolation::NoUnit(from))?;
        unit.move_to(to);

        Ok(MoveOutcome {
            from,
            to,
            opportunity_attacks,
        })
    }
}

impl Default for MovementResolver {
    fn default() -> Self {
        Self::new(NoOpportunityAttacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamagePolicy;
    use shared::Player;

    fn skirmish() -> GameState {
        GameState {
            turn: Some(0),
            players: vec![
                Player::new(
                    0,
                    vec![
                        Unit::at(0, 0).with_speed(5),
                        Unit::at(1, 0).with_speed(2),
                    ],
                ),
                Player::new(1, vec![Unit::at(2, 2).with_speed(5).with_reach(1, 2)]),
            ],
        }
    }

    /// Every enemy unit gets a swing at the mover.
    struct EveryEnemy;

    impl OpportunityPolicy for EveryEnemy {
        fn attackers(
            &self,
            state: &GameState,
            mover_owner: Uid,
            _: &Unit,
            _: Position,
        ) -> Vec<Position> {
            state
                .units()
                .filter(|(owner, _)| *owner != mover_owner)
                .map(|(_, unit)| unit.position())
                .collect()
        }
    }

    #[test]
    fn test_move_exactly_speed_succeeds() {
        let mut state = skirmish();
        let outcome = MovementResolver::default()
            .resolve(
                &mut state,
                &CombatResolver::default(),
                0,
                Position::new(0, 0),
                Position::new(3, 4),
            )
            .unwrap();

        assert_eq!(outcome.to, Position::new(3, 4));
        assert!(outcome.opportunity_attacks.is_empty());
        assert!(state.players[0].unit_at(Position::new(3, 4)).is_some());
        assert!(state.players[0].unit_at(Position::new(0, 0)).is_none());
    }

    #[test]
    fn test_move_too_far_leaves_state_unchanged() {
        let mut state = skirmish();
        let before = state.clone();

        let result = MovementResolver::default().resolve(
            &mut state,
            &CombatResolver::default(),
            0,
            Position::new(0, 0),
            Position::new(0, 6),
        );
        assert!(matches!(result, Err(RuleViolation::TooFar { .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_onto_own_unit_is_rejected() {
        let mut state = skirmish();
        let result = MovementResolver::default().resolve(
            &mut state,
            &CombatResolver::default(),
            0,
            Position::new(0, 0),
            Position::new(1, 0),
        );
        assert_eq!(result, Err(RuleViolation::Occupied(Position::new(1, 0))));
    }

    #[test]
    fn test_move_onto_enemy_is_rejected() {
        let mut state = skirmish();
        let before = state.clone();
        let result = MovementResolver::default().resolve(
            &mut state,
            &CombatResolver::default(),
            0,
            Position::new(0, 0),
            Position::new(2, 2),
        );
        assert_eq!(result, Err(RuleViolation::Occupied(Position::new(2, 2))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_cannot_move_enemy_unit() {
        let mut state = skirmish();
        let result = MovementResolver::default().resolve(
            &mut state,
            &CombatResolver::default(),
            0,
            Position::new(2, 2),
            Position::new(3, 3),
        );
        assert_eq!(result, Err(RuleViolation::NoUnit(Position::new(2, 2))));
    }

    #[test]
    fn test_opportunity_attacks_resolve_before_move() {
        let mut state = skirmish();
        let resolver = MovementResolver::new(EveryEnemy);

        // Two tiles from the mover, inside the enemy's [1, 2] reach.
        state.players[1].units[0].move_to(Position::new(0, 2));

        let outcome = resolver
            .resolve(
                &mut state,
                &CombatResolver::default(),
                0,
                Position::new(0, 0),
                Position::new(-3, 0),
            )
            .unwrap();

        assert_eq!(outcome.opportunity_attacks.len(), 1);
        let attack = &outcome.opportunity_attacks[0];
        assert_eq!(attack.kind, AttackKind::Opportunity);
        assert_eq!(attack.attacker_owner, 1);
        // The attack hit the mover where it stood before moving.
        assert_eq!(attack.defender.position(), Position::new(0, 0));
        assert!(state.players[0].unit_at(Position::new(-3, 0)).is_some());
    }

    #[test]
    fn test_out_of_reach_opportunity_attack_is_dropped() {
        let mut state = skirmish();
        let resolver = MovementResolver::new(EveryEnemy);

        let outcome = resolver
            .resolve(
                &mut state,
                &CombatResolver::default(),
                0,
                Position::new(0, 0),
                Position::new(-3, 0),
            )
            .unwrap();

        assert!(outcome.opportunity_attacks.is_empty());
        assert!(state.players[0].unit_at(Position::new(-3, 0)).is_some());
    }

    /// Removes whichever unit is struck.
    struct Lethal;

    impl DamagePolicy for Lethal {
        fn apply(&self, state: &mut GameState, event: &AttackEvent) {
            if let Some(player) = state.player_mut(event.defender_owner) {
                player.units.retain(|unit| !unit.is_at(event.defender.position()));
            }
        }
    }

    #[test]
    fn test_mover_killed_by_opportunity_attack_keeps_damage() {
        let mut state = skirmish();
        state.players[1].units[0].move_to(Position::new(0, 2));
        let resolver = MovementResolver::new(EveryEnemy);

        let result = resolver.resolve(
            &mut state,
            &CombatResolver::new(Lethal),
            0,
            Position::new(0, 0),
            Position::new(-3, 0),
        );

        assert_eq!(result, Err(RuleViolation::NoUnit(Position::new(0, 0))));
        // The strike landed: the mover is gone and never reached the target.
        assert_eq!(state.players[0].units.len(), 1);
        assert!(state.players[0].unit_at(Position::new(0, 0)).is_none());
        assert!(state.players[0].unit_at(Position::new(-3, 0)).is_none());
    }
}
