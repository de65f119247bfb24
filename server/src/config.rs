use shared::{DEFAULT_PORT, MAX_FRAME_SIZE, MAX_REQUEST_SIZE};
use std::io;

/// Concurrent sessions accepted before new connections are turned away.
pub const DEFAULT_MAX_SESSIONS: usize = 8;

/// Most sessions whose rosters still fit a `status` snapshot in one frame.
pub const MAX_SESSIONS_LIMIT: usize = (MAX_FRAME_SIZE / MAX_REQUEST_SIZE) as usize;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_sessions: usize,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.max_sessions == 0 || self.max_sessions > MAX_SESSIONS_LIMIT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "max sessions must be between 1 and {}, got {}",
                    MAX_SESSIONS_LIMIT, self.max_sessions
                ),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}
