//! Authoritative game state behind a single lock
//!
//! [`GameStore`] is the only shared mutable resource in the server. Every
//! operation takes the lock, does in-memory work and releases it; nothing in
//! here performs I/O, so sessions never wait on each other's sockets.
//!
//! Turn order is round-robin by roster position, not by uid value. Removing a
//! player shifts everyone behind them one slot forward.

use crate::combat::{AttackEvent, CombatResolver, DamagePolicy, NoDamage};
use crate::movement::{MoveOutcome, MovementResolver, NoOpportunityAttacks, OpportunityPolicy};
use log::{debug, info};
use shared::rules::check_roster;
use shared::{GameState, Player, Position, RuleViolation, Uid};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct StoreInner {
    state: GameState,
    /// Released uids, reused oldest-first.
    free_uids: VecDeque<Uid>,
    /// Next never-issued uid.
    next_uid: Uid,
}

pub struct GameStore {
    inner: Mutex<StoreInner>,
    movement: MovementResolver,
    combat: CombatResolver,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    /// Creates an empty store with no opportunity attacks and no damage.
    pub fn new() -> Self {
        Self::with_policies(NoOpportunityAttacks, NoDamage)
    }

    pub fn with_policies<O, D>(opportunity: O, damage: D) -> Self
    where
        O: OpportunityPolicy + 'static,
        D: DamagePolicy + 'static,
    {
        Self {
            inner: Mutex::new(StoreInner {
                state: GameState::new(),
                free_uids: VecDeque::new(),
                next_uid: 0,
            }),
            movement: MovementResolver::new(opportunity),
            combat: CombatResolver::new(damage),
        }
    }

    // Every mutation completes before its guard drops, so a poisoned lock
    // still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an independent deep copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.lock().state.clone()
    }

    /// Whose turn it is, without copying the rosters.
    pub fn turn(&self) -> Option<Uid> {
        self.lock().state.turn
    }

    pub fn player_count(&self) -> usize {
        self.lock().state.players.len()
    }

    /// Inserts `player`, or replaces the roster of the player with the same uid.
    ///
    /// The roster is refused if it would put two units on one tile. When no one
    /// holds the turn, a newly inserted player receives it.
    pub fn upsert_player(&self, player: Player) -> Result<(), RuleViolation> {
        let mut inner = self.lock();
        let state = &mut inner.state;

        check_roster(state, player.uid, &player.units)?;

        let uid = player.uid;
        match state.player_mut(uid) {
            Some(existing) => {
                *existing = player;
                debug!("Replaced roster of player {}", uid);
            }
            None => {
                info!("Added player {} with {} units", uid, player.units.len());
                state.players.push(player);
                if state.turn.is_none() {
                    state.turn = Some(uid);
                }
            }
        }
        Ok(())
    }

    /// Issues a uid, reusing released ones before growing the counter.
    pub fn allocate_uid(&self) -> Uid {
        let mut inner = self.lock();
        if let Some(uid) = inner.free_uids.pop_front() {
            return uid;
        }
        let uid = inner.next_uid;
        inner.next_uid += 1;
        uid
    }

    /// Removes the player holding `uid` and returns the uid to the pool.
    ///
    /// If that player held the turn, the turn passes to the next player in
    /// roster order first. Releasing a uid that is not currently issued does
    /// nothing. Returns whether the uid was released.
    pub fn free_uid(&self, uid: Uid) -> bool {
        let mut inner = self.lock();
        if uid >= inner.next_uid || inner.free_uids.contains(&uid) {
            return false;
        }

        let state = &mut inner.state;
        if let Some(index) = state.position_of(uid) {
            if state.turn == Some(uid) {
                advance(state);
                if state.turn == Some(uid) {
                    state.turn = None;
                }
            }
            state.players.remove(index);
            info!("Removed player {}", uid);
        }

        inner.free_uids.push_back(uid);
        true
    }

    /// Passes the turn to the next player in roster order and returns the new
    /// holder.
    pub fn advance_turn(&self) -> Option<Uid> {
        let mut inner = self.lock();
        advance(&mut inner.state);
        inner.state.turn
    }

    /// Validates and applies a move for a unit in `uid`'s roster.
    pub fn move_unit(
        &self,
        uid: Uid,
        from: Position,
        to: Position,
    ) -> Result<MoveOutcome, RuleViolation> {
        let mut inner = self.lock();
        self.movement
            .resolve(&mut inner.state, &self.combat, uid, from, to)
    }

    /// Validates an attack ordered by `uid` and hands it to the damage policy.
    pub fn attack(
        &self,
        uid: Uid,
        attacker: Position,
        defender: Position,
    ) -> Result<AttackEvent, RuleViolation> {
        let mut inner = self.lock();
        self.combat.resolve(&mut inner.state, uid, attacker, defender)
    }
}

/// Round-robin step. An empty roster clears the turn; a marker that points at
/// no one restarts from the head of the roster.
fn advance(state: &mut GameState) {
    let count = state.players.len();
    if count == 0 {
        state.turn = None;
        return;
    }

    let next = match state.turn.and_then(|uid| state.position_of(uid)) {
        Some(index) => (index + 1) % count,
        None => 0,
    };
    state.turn = Some(state.players[next].uid);
}
