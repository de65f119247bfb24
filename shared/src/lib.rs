//! Types and rules shared by the skirmish server and its clients.
//!
//! Both sides of the connection use the same data model, the same wire codec
//! and the same spatial rules, so a client can reject an illegal order before
//! it ever reaches the server and the server reaches the same verdict when it
//! re-checks the order against its own state.
//!
//! - [`types`]: units, players and the game snapshot
//! - [`protocol`]: tagged JSON messages and length-prefixed framing
//! - [`rules`]: distance, occupancy, movement and reach checks

pub mod protocol;
pub mod rules;
pub mod types;

pub use protocol::{
    decode, encode, read_frame, read_frame_limited, read_message, read_message_limited,
    write_frame, write_message, ClientMessage, ProtocolError, ServerMessage, MAX_FRAME_SIZE,
    MAX_REQUEST_SIZE,
};
pub use rules::{check_move, check_reach, check_roster, distance, is_occupied, RuleViolation};
pub use types::{GameState, Player, Position, Uid, Unit};

/// Port the reference server listens on.
pub const DEFAULT_PORT: u16 = 20000;
