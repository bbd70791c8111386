pub use board::*;
pub use command_buffer::*;
pub use errors::*;
pub use heading::*;
pub use snapshot::*;
pub use visualization::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod command_buffer;
mod errors;
mod heading;
mod snapshot;
mod visualization;
