//! # Skirmish Client Library
//!
//! Client side of the turn-based skirmish: a connection to the server and a
//! local view of the game used to build and check orders.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::GameClient`] speaks the framed JSON protocol over one TCP
//! connection. `register` and `status` wait for their reply; `move`, `attack`
//! and `finish` are fire-and-forget.
//!
//! ### Game Module (`game`)
//! [`game::Commander`] holds the latest snapshot and the player's selection.
//! Orders are validated locally with the same rules the server applies, so an
//! illegal move or attack never leaves the client. The server checks again
//! anyway; its snapshot always wins.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::Commander;
//! use client::network::GameClient;
//! use shared::Unit;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = GameClient::connect("127.0.0.1:20000").await?;
//!     let mut commander = Commander::new();
//!
//!     let units = vec![Unit::at(0, 0).with_speed(5).with_reach(1, 1)];
//!     commander.set_uid(client.register(Some(units)).await?);
//!     commander.apply_status(client.status().await?);
//!
//!     if commander.is_my_turn() {
//!         commander.select_unit(0, 0)?;
//!         client.submit(&commander.plan_move(3, 4)?).await?;
//!         client.submit(&commander.plan_finish()).await?;
//!     }
//!
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
