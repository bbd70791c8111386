use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use snakes_actor_utils::ActorHandle;
use tracing::debug;

use crate::JoinRejected;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: &str, secret: &str) -> Self {
        Self {
            identity: String::from(identity),
            secret: String::from(secret),
        }
    }
}

/// Decides whether a player may join. Called from whichever thread asks to
/// join, possibly several at once.
pub trait Authenticator: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> bool;
}

/// Known players and their secrets, kept in memory.
#[derive(Clone, Debug, Default)]
pub struct UserDatabase {
    secrets: HashMap<String, String>,
}

impl UserDatabase {
    pub fn new(users: impl IntoIterator<Item = Credentials>) -> Self {
        Self {
            secrets: users
                .into_iter()
                .map(|user| (user.identity, user.secret))
                .collect(),
        }
    }

    /// Reads a JSON array of `{ "identity": ..., "secret": ... }` objects.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let users: Vec<Credentials> = serde_json::from_reader(reader)?;
        if users.is_empty() {
            anyhow::bail!("User database '{}' has no users", path.display());
        }
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl Authenticator for UserDatabase {
    fn verify(&self, credentials: &Credentials) -> bool {
        self.secrets
            .get(&credentials.identity)
            .map_or(false, |secret| *secret == credentials.secret)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    Scripted,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorKind::Player => write!(f, "player"),
            ActorKind::Scripted => write!(f, "scripted"),
        }
    }
}

/// A join that passed verification and waits for the coordinator to do the
/// bookkeeping at the start of the next tick.
pub(crate) struct JoinRequest {
    pub(crate) kind: ActorKind,
    pub(crate) name: String,
    pub(crate) reply: Sender<Result<ActorHandle, JoinRejected>>,
}

/// Lets actors join a game that is already running, from any thread.
#[derive(Clone)]
pub struct Registrar {
    requests: Sender<JoinRequest>,
    authenticator: Arc<dyn Authenticator>,
}

impl Registrar {
    pub(crate) fn new(
        requests: Sender<JoinRequest>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            requests,
            authenticator,
        }
    }

    /// Verifies the credentials right away, then blocks until the
    /// coordinator has admitted or rejected the player.
    pub fn join(&self, credentials: &Credentials) -> Result<ActorHandle, JoinRejected> {
        if !self.authenticator.verify(credentials) {
            debug!(identity = %credentials.identity, "Rejected credentials");
            return Err(JoinRejected::BadCredentials);
        }
        self.request(ActorKind::Player, credentials.identity.clone())
    }

    pub fn join_scripted(&self, name: &str) -> Result<ActorHandle, JoinRejected> {
        self.request(ActorKind::Scripted, String::from(name))
    }

    fn request(&self, kind: ActorKind, name: String) -> Result<ActorHandle, JoinRejected> {
        let (reply, answer) = crossbeam_channel::bounded(1);
        self.requests
            .send(JoinRequest { kind, name, reply })
            .map_err(|_| JoinRejected::GameOver)?;
        // The coordinator drops pending requests unanswered once the game is over
        answer.recv().map_err(|_| JoinRejected::GameOver)?
    }
}
