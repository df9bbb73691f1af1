use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Session, SessionId};
use crate::domain::Decimal;

/// Sessions keyed by id. Each action takes the lock for its own duration,
/// so actions on one session apply in request order.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, default_contribution: Decimal) -> SessionId {
        let id = SessionId::new();
        self.sessions
            .write()
            .await
            .insert(id, Session::new(default_contribution));
        id
    }

    /// Run `f` against the session, or return None if the id is unknown.
    pub async fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(&id).map(f)
    }

    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
