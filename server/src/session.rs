//! Per-connection command loop
//!
//! A session reads one framed command at a time, applies it to the shared
//! [`GameStore`], and writes a reply for the commands that have one
//! (`register` and `status`). Protocol errors end the session; rule
//! violations are logged and the session carries on. Requests are capped at
//! [`MAX_REQUEST_SIZE`] so the snapshot of every connected roster always fits
//! one reply frame.
//!
//! However a session ends, a bound uid is released back to the store.

use crate::game::GameStore;
use log::{debug, info, warn};
use shared::{
    read_message_limited, write_message, ClientMessage, Player, Position, ProtocolError,
    ServerMessage, Uid, MAX_REQUEST_SIZE,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("'{0}' requires a registered player")]
    NotRegistered(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered(Uid),
    Terminated,
}

/// What the loop should do after a command has been applied.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Nothing,
    Send(ServerMessage),
    Close,
}

pub struct Session {
    peer: SocketAddr,
    store: Arc<GameStore>,
    state: SessionState,
}

impl Session {
    pub fn new(peer: SocketAddr, store: Arc<GameStore>) -> Self {
        Self {
            peer,
            store,
            state: SessionState::Unregistered,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn uid(&self) -> Option<Uid> {
        match self.state {
            SessionState::Registered(uid) => Some(uid),
            _ => None,
        }
    }

    /// Runs the command loop until the peer quits, disconnects or breaks the
    /// protocol. A clean quit or disconnect is `Ok`.
    pub async fn run<S>(mut self, mut stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let result = self.serve(&mut stream).await;
        self.terminate();
        result
    }

    async fn serve<S>(&mut self, stream: &mut S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let request = read_message_limited::<_, ClientMessage>(stream, MAX_REQUEST_SIZE);
            let Some(message) = request.await? else {
                debug!("{} closed the connection", self.peer);
                return Ok(());
            };

            match self.handle(message)? {
                Reply::Nothing => {}
                Reply::Send(reply) => write_message(stream, &reply).await?,
                Reply::Close => return Ok(()),
            }
        }
    }

    /// Applies one command to the store. Never performs I/O.
    pub fn handle(&mut self, message: ClientMessage) -> Result<Reply, SessionError> {
        match message {
            ClientMessage::Register { units } => {
                let uid = match self.uid() {
                    Some(uid) => uid,
                    None => self.store.allocate_uid(),
                };
                self.state = SessionState::Registered(uid);
                info!("{} registered as player {}", self.peer, uid);

                if let Some(units) = units {
                    if let Err(violation) = self.store.upsert_player(Player::new(uid, units)) {
                        warn!("Roster from player {} refused: {}", uid, violation);
                    }
                }
                Ok(Reply::Send(ServerMessage::Register { uid }))
            }

            ClientMessage::Status => {
                self.require_uid("status")?;
                Ok(Reply::Send(ServerMessage::Status(self.store.snapshot())))
            }

            ClientMessage::Finish => {
                let uid = self.require_uid("finish")?;
                let next = self.store.advance_turn();
                debug!("Player {} finished; turn is now {:?}", uid, next);
                Ok(Reply::Nothing)
            }

            ClientMessage::Quit => {
                debug!("{} quit", self.peer);
                self.terminate();
                Ok(Reply::Close)
            }

            ClientMessage::Move { mover, x, y } => {
                let uid = self.require_uid("move")?;
                let target = Position::new(x, y);
                match self.store.move_unit(uid, mover, target) {
                    Ok(outcome) => debug!(
                        "Player {} moved ({}, {}) to ({}, {})",
                        uid, outcome.from.x, outcome.from.y, outcome.to.x, outcome.to.y
                    ),
                    Err(violation) => info!("Move by player {} rejected: {}", uid, violation),
                }
                Ok(Reply::Nothing)
            }

            ClientMessage::Attack { attacker, defender } => {
                let uid = self.require_uid("attack")?;
                if let Err(violation) = self.store.attack(uid, attacker, defender) {
                    info!("Attack by player {} rejected: {}", uid, violation);
                }
                Ok(Reply::Nothing)
            }
        }
    }

    fn require_uid(&self, command: &'static str) -> Result<Uid, SessionError> {
        self.uid().ok_or(SessionError::NotRegistered(command))
    }

    /// Releases the bound uid, if any. Safe to call more than once.
    fn terminate(&mut self) {
        if let SessionState::Registered(uid) = self.state {
            self.store.free_uid(uid);
            info!("Player {} ({}) left", uid, self.peer);
        }
        self.state = SessionState::Terminated;
    }
}
