//! # Skirmish Server Library
//!
//! Authoritative server for a turn-based tactical skirmish. Clients connect
//! over TCP, register a roster of units, and take turns moving and attacking
//! on a shared integer grid. The server owns the only canonical copy of the
//! game; clients poll it with `status`.
//!
//! ## Architecture
//!
//! ### One Task Per Connection
//! The listener in [`network`] accepts connections and spawns a [`session`]
//! task for each, up to a fixed ceiling (8 by default). Connections beyond the
//! ceiling are closed immediately.
//!
//! ### Single Lock
//! All shared state lives in [`game::GameStore`] behind one mutex. Sessions
//! only ever hold it for in-memory work and take snapshots before writing to
//! the network, so a slow client never stalls the others. Operations from
//! different sessions are linearised in whatever order they reach the lock.
//!
//! ### Rules
//! Moves go through [`movement`] (global occupancy, speed, opportunity
//! attacks) and attacks through [`combat`] (inclusive reach band). Both
//! resolve against the store's own units, not the client's copy. Opportunity
//! attacks and damage are pluggable policies; the defaults do nothing.
//!
//! ### Turn Order
//! Turns rotate round-robin by roster position. When the active player leaves,
//! the turn passes to whoever was next in line. Whose turn it is is tracked but
//! not enforced: any registered player may move, attack or finish.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(&ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod combat;
pub mod config;
pub mod game;
pub mod movement;
pub mod network;
pub mod session;
