use serde::{Deserialize, Serialize};

/// Server-assigned player identifier.
pub type Uid = u32;

/// A tile coordinate. Units are identified by the tile they stand on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance between two tiles.
    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// A single combatant in a player's roster.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Unit {
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub speed: u32,
    pub minreach: u32,
    pub maxreach: u32,
    pub weapon: String,
    pub armor: Vec<String>,
    pub formation: String,
    #[serde(rename = "uclass")]
    pub class: String,
}

impl Unit {
    /// Creates a unit at `(x, y)` with an empty combat profile.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_reach(mut self, minreach: u32, maxreach: u32) -> Self {
        self.minreach = minreach;
        self.maxreach = maxreach;
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn is_at(&self, position: Position) -> bool {
        self.x == position.x && self.y == position.y
    }

    pub fn move_to(&mut self, position: Position) {
        self.x = position.x;
        self.y = position.y;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub uid: Uid,
    pub units: Vec<Unit>,
}

impl Player {
    pub fn new(uid: Uid, units: Vec<Unit>) -> Self {
        Self { uid, units }
    }

    pub fn unit_at(&self, position: Position) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.is_at(position))
    }

    pub fn unit_at_mut(&mut self, position: Position) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.is_at(position))
    }
}

/// Full game snapshot: whose turn it is and every registered roster.
///
/// `turn` is `None` when no one holds the turn. Roster order is the turn
/// rotation order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct GameState {
    pub turn: Option<Uid>,
    pub players: Vec<Player>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, uid: Uid) -> Option<&Player> {
        self.players.iter().find(|player| player.uid == uid)
    }

    pub fn player_mut(&mut self, uid: Uid) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.uid == uid)
    }

    /// Roster index of the player with `uid`.
    pub fn position_of(&self, uid: Uid) -> Option<usize> {
        self.players.iter().position(|player| player.uid == uid)
    }

    /// Finds the unit standing on `position`, whoever owns it.
    pub fn unit_at(&self, position: Position) -> Option<(Uid, &Unit)> {
        self.players.iter().find_map(|player| {
            player
                .unit_at(position)
                .map(|unit| (player.uid, unit))
        })
    }

    pub fn units(&self) -> impl Iterator<Item = (Uid, &Unit)> {
        self.players
            .iter()
            .flat_map(|player| player.units.iter().map(move |unit| (player.uid, unit)))
    }
}
