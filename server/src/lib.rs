mod barrier;
mod config;
mod coordinator;
mod error;
mod recording;
mod registration;
mod summary;
pub use barrier::*;
pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use recording::*;
pub use registration::{ActorKind, Authenticator, Credentials, Registrar, UserDatabase};
pub use summary::{GameSummary, Standing};
