//! Player roster entry

use uuid::Uuid;

use crate::events::PublicPlayer;
use crate::ports::ConnectionId;

/// A player known to the session.
///
/// Players are retained offline after a disconnect so their identity, score
/// and master status survive a reconnection; they are only deleted on kick,
/// on restart garbage collection, or with the whole session.
#[derive(Debug, Clone)]
pub struct Player {
    pub uuid: Uuid,
    pub pseudonym: String,
    pub ready: bool,
    pub online: bool,
    pub master: bool,
    /// Opaque transport reference; None while offline
    pub connection: Option<ConnectionId>,
}

impl Player {
    pub fn new(uuid: Uuid, pseudonym: String, master: bool, connection: ConnectionId) -> Self {
        Self {
            uuid,
            pseudonym,
            ready: true,
            online: true,
            master,
            connection: Some(connection),
        }
    }

    /// Projection safe to broadcast to every client
    pub fn public(&self) -> PublicPlayer {
        PublicPlayer {
            uuid: self.uuid,
            pseudonym: self.pseudonym.clone(),
            ready: self.ready,
            master: self.master,
            online: self.online,
        }
    }
}
