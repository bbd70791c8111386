use std::sync::Arc;

use crossbeam_channel::Receiver;
use snakes::{ActorId, CommandBuffer, Heading, Interrupted, Snapshot};

/// Pushes headings into one actor's command buffer. Cheap to clone, so an
/// input source can own one on a different thread.
#[derive(Clone)]
pub struct CommandSender {
    id: ActorId,
    buffer: Arc<CommandBuffer>,
}

impl CommandSender {
    pub fn new(id: ActorId, buffer: Arc<CommandBuffer>) -> Self {
        Self { id, buffer }
    }

    pub fn actor_id(&self) -> ActorId {
        self.id
    }

    /// May wait briefly if the coordinator has not caught up on earlier
    /// commands. Fails once the game is shutting down.
    pub fn submit_command(&self, heading: Heading) -> Result<(), Interrupted> {
        self.buffer.push(heading)
    }
}

/// Everything an actor gets back from joining a game.
pub struct ActorHandle {
    pub id: ActorId,
    pub name: String,
    pub commands: CommandSender,
    /// One snapshot per tick while the snake is alive. Disconnects when the
    /// game is over.
    pub snapshots: Receiver<Arc<Snapshot>>,
}

impl ActorHandle {
    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }
}
