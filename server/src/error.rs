use snakes::{ActorId, CapacityExhausted};

use crate::Phase;

/// Why a join request was turned down. None of these affect the running game.
#[derive(Debug, PartialEq, Eq)]
pub enum JoinRejected {
    BadCredentials,
    /// No room for another actor of this kind.
    GameFull { capacity: usize },
    BoardFull(CapacityExhausted),
    /// The coordinator has stopped and takes no more actors.
    GameOver,
}

impl std::error::Error for JoinRejected {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JoinRejected::BoardFull(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for JoinRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinRejected::BadCredentials => write!(f, "Unknown identity or wrong secret"),
            JoinRejected::GameFull { capacity } => {
                write!(f, "All {} places for this kind of actor are taken", capacity)
            }
            JoinRejected::BoardFull(_) => write!(f, "There is no room left on the board"),
            JoinRejected::GameOver => write!(f, "The game is over"),
        }
    }
}

/// The error type for running the coordinator.
#[derive(Debug)]
pub enum GameError {
    /// A shutdown was requested. The board is left as it was after the last
    /// complete tick.
    Interrupted,
    WorkerFailed { phase: Phase, actor: ActorId },
    Recording(anyhow::Error),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Recording(err) => Some(&**err),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::Interrupted => write!(f, "The game was stopped between two ticks"),
            GameError::WorkerFailed { phase, actor } => {
                write!(f, "The {} worker for actor {} panicked", phase, actor)
            }
            GameError::Recording(_) => write!(f, "Could not record the game"),
        }
    }
}
