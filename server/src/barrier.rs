use std::panic::{self, AssertUnwindSafe};
use std::thread;

use snakes::ActorId;
use tracing::{trace, warn};

use crate::GameError;

/// The two stages of a tick that run one worker per actor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Popping the next command out of every command buffer.
    Gather,
    /// Handing the new snapshot to every actor.
    Broadcast,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Gather => write!(f, "gather"),
            Phase::Broadcast => write!(f, "broadcast"),
        }
    }
}

/// Runs one short-lived worker per unit of work and waits until every one of
/// them has reported back before returning.
///
/// Workers report over a completion channel that has room for all of them,
/// so nobody blocks on the way out and the coordinator sleeps in `recv`
/// rather than polling.
///
/// Every call spawns fresh OS threads: two phases per tick means about
/// `2 * actors` spawns per tick, a few milliseconds at the scripted-actor
/// limit. That is small next to the default 120 ms period, but it grows
/// with the number of actors.
#[derive(Copy, Clone, Debug)]
pub struct PhaseBarrier {
    phase: Phase,
}

impl PhaseBarrier {
    pub fn new(phase: Phase) -> Self {
        Self { phase }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Calls `work` for every unit on a thread of its own.
    ///
    /// The results come back sorted by actor id. If any worker panicked, the
    /// lowest such actor id is reported as [`GameError::WorkerFailed`] once
    /// all other workers have finished.
    pub fn fan_out<U, T, F>(
        &self,
        units: Vec<(ActorId, U)>,
        work: F,
    ) -> Result<Vec<(ActorId, T)>, GameError>
    where
        U: Send,
        T: Send,
        F: Fn(ActorId, U) -> T + Sync,
    {
        let phase = self.phase;
        let expected = units.len();
        let (done_tx, done_rx) = crossbeam_channel::bounded(expected.max(1));
        let work = &work;

        let reports: Vec<(ActorId, Option<T>)> = thread::scope(|scope| {
            for (id, unit) in units {
                let worker_tx = done_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", phase, id.0))
                    .spawn_scoped(scope, move || {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| work(id, unit)));
                        // The channel has room for every worker
                        let _ = worker_tx.send((id, result.ok()));
                    });
                if let Err(err) = spawned {
                    warn!(%phase, actor = %id, %err, "Could not start worker");
                    let _ = done_tx.send((id, None));
                }
            }
            drop(done_tx);
            // Ends once the last worker has dropped its sender
            done_rx.iter().collect()
        });
        trace!(%phase, workers = expected, "Barrier passed");

        let mut results = Vec::with_capacity(reports.len());
        let mut failed: Option<ActorId> = None;
        for (id, report) in reports {
            match report {
                Some(value) => results.push((id, value)),
                None => failed = Some(failed.map_or(id, |other| other.min(id))),
            }
        }
        if let Some(actor) = failed {
            return Err(GameError::WorkerFailed { phase, actor });
        }
        results.sort_by_key(|(id, _)| *id);
        Ok(results)
    }
}
