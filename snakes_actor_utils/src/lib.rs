mod handle;
mod player;
pub use handle::*;
pub use player::*;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use snakes::{ActorId, Interrupted, Snapshot};
use tracing::{debug, info};

/// The capability every participant in a game offers: looking at the board
/// once per tick and steering through its [`CommandSender`].
///
/// Humans and scripted snakes are different implementations of this trait.
pub trait Actor {
    /// Called with every snapshot the coordinator delivers while this actor's
    /// snake is alive, plus one last time in the tick it dies.
    fn receive_snapshot(
        &mut self,
        me: ActorId,
        snapshot: &Snapshot,
        commands: &CommandSender,
    ) -> anyhow::Result<()>;

    fn run(&mut self, handle: ActorHandle) -> anyhow::Result<()> {
        let ActorHandle {
            id,
            name,
            commands,
            snapshots,
        } = handle;

        loop {
            let snapshot: Arc<Snapshot> = match snapshots.recv() {
                Ok(snapshot) => snapshot,
                // The coordinator hung up - the game is over.
                Err(_) => break,
            };
            match self.receive_snapshot(id, &snapshot, &commands) {
                Ok(()) => {}
                Err(err) if err.downcast_ref::<Interrupted>().is_some() => {
                    debug!(actor = %id, "Stopped while submitting a command");
                    break;
                }
                Err(err) => return Err(err),
            }
            if let Some(body) = snapshot.body(id).filter(|body| !body.is_alive()) {
                info!(actor = %id, name = %name, score = body.score(), "Snake died");
                break;
            }
        }
        Ok(())
    }
}

/// Runs `actor` on its own thread until its snake dies or the game ends.
pub fn spawn_actor<A>(
    mut actor: A,
    handle: ActorHandle,
) -> std::io::Result<JoinHandle<anyhow::Result<()>>>
where
    A: Actor + Send + 'static,
{
    thread::Builder::new()
        .name(format!("actor-{}", handle.id.0))
        .spawn(move || actor.run(handle))
}
