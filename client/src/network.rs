use log::debug;
use shared::{
    read_message, write_message, ClientMessage, GameState, Position, ProtocolError, ServerMessage,
    Uid, Unit,
};
use std::io;
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("server closed the connection")]
    Disconnected,
    #[error("expected a '{expected}' reply, got {got:?}")]
    UnexpectedReply {
        expected: &'static str,
        got: ServerMessage,
    },
}

/// A connection to the skirmish server.
///
/// Commands without a reply (`move`, `attack`, `finish`) return as soon as
/// the frame is written; the result shows up in the next `status`.
pub struct GameClient {
    stream: TcpStream,
    uid: Option<Uid>,
}

impl GameClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(GameClient { stream, uid: None })
    }

    pub fn uid(&self) -> Option<Uid> {
        self.uid
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        debug!("Sending {}", message.command());
        write_message(&mut self.stream, message).await?;
        Ok(())
    }

    async fn request(&mut self, message: &ClientMessage) -> Result<ServerMessage, ClientError> {
        self.send(message).await?;
        read_message(&mut self.stream)
            .await?
            .ok_or(ClientError::Disconnected)
    }

    /// Registers, optionally with a roster, and returns the assigned uid.
    pub async fn register(&mut self, units: Option<Vec<Unit>>) -> Result<Uid, ClientError> {
        match self.request(&ClientMessage::Register { units }).await? {
            ServerMessage::Register { uid } => {
                self.uid = Some(uid);
                Ok(uid)
            }
            got => Err(ClientError::UnexpectedReply {
                expected: "register",
                got,
            }),
        }
    }

    pub async fn status(&mut self) -> Result<GameState, ClientError> {
        match self.request(&ClientMessage::Status).await? {
            ServerMessage::Status(state) => Ok(state),
            got => Err(ClientError::UnexpectedReply {
                expected: "status",
                got,
            }),
        }
    }

    pub async fn move_unit(
        &mut self,
        mover: Position,
        target: Position,
    ) -> Result<(), ClientError> {
        self.send(&ClientMessage::Move {
            mover,
            x: target.x,
            y: target.y,
        })
        .await
    }

    pub async fn attack(
        &mut self,
        attacker: Position,
        defender: Position,
    ) -> Result<(), ClientError> {
        self.send(&ClientMessage::Attack { attacker, defender }).await
    }

    pub async fn finish_turn(&mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Finish).await
    }

    /// Sends a message built by [`crate::game::Commander`].
    pub async fn submit(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        self.send(message).await
    }

    /// Leaves the game. The server closes the connection afterwards.
    pub async fn quit(mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Quit).await
    }
}
