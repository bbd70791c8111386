use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::rngs::StdRng;
use snakes::{ActorId, Board, CommandBuffer, CurrentHeading, MoveOutcome, Snapshot};
use snakes_actor_utils::{ActorHandle, CommandSender};
use tracing::{debug, info, trace, warn};

use crate::registration::JoinRequest;
use crate::summary::{standings, RosterEntry};
use crate::{
    ActorKind, Authenticator, Credentials, GameConfig, GameError, GameSummary, JoinRejected,
    Phase, PhaseBarrier, Recorder, Registrar,
};

/// How often the wait for expected players looks for a shutdown request.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to sleep after a tick that took `elapsed`. An overrun is not
/// made up for in later ticks.
fn time_left(period: Duration, elapsed: Duration) -> Option<Duration> {
    period.checked_sub(elapsed).filter(|rest| !rest.is_zero())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// No snake is alive any more.
    GameOver,
}

/// Asks a running [`Coordinator`] to stop after the tick it is working on.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The coordinator's end of one live actor.
struct ActorLink {
    buffer: Arc<CommandBuffer>,
    snapshots: Sender<Arc<Snapshot>>,
    heading: CurrentHeading,
}

/// Runs the game: owns the board, admits actors and moves every snake once
/// per tick.
///
/// Actors only ever see the board through snapshots and only ever change it
/// through their command buffers, so the board needs no lock.
pub struct Coordinator {
    config: GameConfig,
    board: Board,
    rng: StdRng,
    /// The number of the next tick to run.
    tick: u64,
    /// Actors whose snakes are alive. Dead ones are dropped from here, which
    /// hangs up their snapshot channel.
    links: BTreeMap<ActorId, ActorLink>,
    /// Every actor that ever joined.
    roster: BTreeMap<ActorId, RosterEntry>,
    next_id: u32,
    players: usize,
    scripted: usize,
    authenticator: Arc<dyn Authenticator>,
    join_tx: Sender<JoinRequest>,
    /// `None` once the game is over.
    join_rx: Option<Receiver<JoinRequest>>,
    shutdown: ShutdownHandle,
    recorder: Option<Recorder>,
}

impl Coordinator {
    /// Panics if the config does not validate.
    pub fn new(config: GameConfig, authenticator: Arc<dyn Authenticator>, rng: StdRng) -> Self {
        if let Err(err) = config.validate() {
            panic!("Invalid game config: {}", err);
        }
        let (join_tx, join_rx) = crossbeam_channel::unbounded();
        Self {
            board: Board::new(config.grid_size),
            config,
            rng,
            tick: 0,
            links: BTreeMap::new(),
            roster: BTreeMap::new(),
            next_id: 1,
            players: 0,
            scripted: 0,
            authenticator,
            join_tx,
            join_rx: Some(join_rx),
            shutdown: ShutdownHandle::default(),
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The number of the next tick to run, which is also the number of ticks
    /// run so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn registrar(&self) -> Registrar {
        Registrar::new(self.join_tx.clone(), Arc::clone(&self.authenticator))
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Lets a player join before the game is running.
    pub fn join(&mut self, credentials: &Credentials) -> Result<ActorHandle, JoinRejected> {
        if !self.authenticator.verify(credentials) {
            debug!(identity = %credentials.identity, "Rejected credentials");
            return Err(JoinRejected::BadCredentials);
        }
        self.admit(ActorKind::Player, credentials.identity.clone())
    }

    /// Lets a scripted actor join before the game is running.
    pub fn join_scripted(&mut self, name: &str) -> Result<ActorHandle, JoinRejected> {
        self.admit(ActorKind::Scripted, String::from(name))
    }

    /// The current standings. Also available after [`Coordinator::run()`]
    /// has returned.
    pub fn summary(&self) -> GameSummary {
        GameSummary::new(self.tick, standings(&self.board, &self.roster))
    }

    /// Plays until no snake is alive or a shutdown is requested.
    ///
    /// Waits for `expected_players` players to join first. Whatever the
    /// outcome, all actors are disconnected afterwards and no further joins
    /// are accepted.
    pub fn run(&mut self) -> Result<GameSummary, GameError> {
        let result = self.play();
        self.finish();
        result?;
        let summary = self.summary();
        if let Some(recorder) = &mut self.recorder {
            let path = recorder
                .write_game_recording(&summary)
                .map_err(GameError::Recording)?;
            info!(path = %path.display(), "Wrote game recording");
        }
        Ok(summary)
    }

    fn play(&mut self) -> Result<(), GameError> {
        self.wait_for_players()?;
        info!(actors = self.links.len(), "Game started");
        let period = self.config.tick_period();
        loop {
            if self.shutdown.is_requested() {
                info!(tick = self.tick, "Shutdown requested");
                return Err(GameError::Interrupted);
            }
            let started = Instant::now();
            if self.run_tick()? == TickOutcome::GameOver {
                info!(ticks = self.tick, "Game over");
                return Ok(());
            }
            let elapsed = started.elapsed();
            trace!(tick = self.tick - 1, ?elapsed, "Tick done");
            if let Some(rest) = time_left(period, elapsed) {
                thread::sleep(rest);
            }
        }
    }

    fn wait_for_players(&mut self) -> Result<(), GameError> {
        while self.players < self.config.expected_players {
            if self.shutdown.is_requested() {
                return Err(GameError::Interrupted);
            }
            let Some(join_rx) = &self.join_rx else {
                return Ok(());
            };
            match join_rx.recv_timeout(JOIN_POLL_INTERVAL) {
                Ok(request) => self.answer(request),
                Err(RecvTimeoutError::Timeout) => {}
                // We hold a sender ourselves
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
        Ok(())
    }

    /// Runs a single tick without sleeping afterwards.
    pub fn run_tick(&mut self) -> Result<TickOutcome, GameError> {
        self.admit_pending();
        let tick = self.tick;
        self.tick += 1;

        // Gather
        let buffers: Vec<(ActorId, &CommandBuffer)> = self
            .links
            .iter()
            .map(|(&id, link)| (id, &*link.buffer))
            .collect();
        let popped = PhaseBarrier::new(Phase::Gather)
            .fan_out(buffers, |_, buffer| buffer.pop_latest())?;

        // Apply, in id order
        for (id, requested) in popped {
            let Some(link) = self.links.get_mut(&id) else {
                continue;
            };
            if let Some(requested) = requested {
                if !link.heading.update(requested) {
                    debug!(tick, actor = %id, %requested, "Ignored reversal");
                }
            }
            let Some(heading) = link.heading.get() else {
                continue;
            };
            match self.board.apply_move(id, heading) {
                MoveOutcome::Died(cause) => {
                    info!(tick, actor = %id, %cause, "Snake died");
                }
                outcome => trace!(tick, actor = %id, ?outcome),
            }
        }

        if !self.board.any_alive() {
            return Ok(TickOutcome::GameOver);
        }

        // Broadcast, including to snakes that died just now
        let snapshot = Arc::new(self.board.snapshot(tick));
        let channels: Vec<(ActorId, &Sender<Arc<Snapshot>>)> = self
            .links
            .iter()
            .map(|(&id, link)| (id, &link.snapshots))
            .collect();
        PhaseBarrier::new(Phase::Broadcast).fan_out(channels, |id, channel| {
            if channel.send(Arc::clone(&snapshot)).is_err() {
                debug!(tick, actor = %id, "Actor stopped listening");
            }
        })?;
        self.retire_dead();

        if self.config.food_interval_ticks != 0 && tick % self.config.food_interval_ticks == 0 {
            self.board.spawn_food(&mut self.rng);
        }

        if let Some(recorder) = &mut self.recorder {
            recorder.record_tick(tick, standings(&self.board, &self.roster));
        }
        Ok(TickOutcome::Running)
    }

    fn admit_pending(&mut self) {
        let requests: Vec<JoinRequest> = match &self.join_rx {
            Some(join_rx) => join_rx.try_iter().collect(),
            None => return,
        };
        for request in requests {
            self.answer(request);
        }
    }

    fn answer(&mut self, request: JoinRequest) {
        let JoinRequest { kind, name, reply } = request;
        let result = self.admit(kind, name);
        if let Err(Ok(handle)) = reply.send(result).map_err(|err| err.into_inner()) {
            // Its snake stays on the board without ever moving
            warn!(actor = %handle.id, "Actor left before its join was answered");
        }
    }

    fn admit(&mut self, kind: ActorKind, name: String) -> Result<ActorHandle, JoinRejected> {
        if self.join_rx.is_none() {
            return Err(JoinRejected::GameOver);
        }
        let (count, capacity) = match kind {
            ActorKind::Player => (self.players, self.config.max_players),
            ActorKind::Scripted => (self.scripted, self.config.max_scripted),
        };
        if count >= capacity {
            debug!(%name, %kind, capacity, "Game is full");
            return Err(JoinRejected::GameFull { capacity });
        }

        let id = ActorId(self.next_id);
        let head = self
            .board
            .spawn(id, &mut self.rng)
            .map_err(JoinRejected::BoardFull)?;
        self.next_id += 1;
        match kind {
            ActorKind::Player => self.players += 1,
            ActorKind::Scripted => self.scripted += 1,
        }

        let buffer = Arc::new(CommandBuffer::new(self.config.buffer_settings()));
        let (snapshots_tx, snapshots_rx) = crossbeam_channel::unbounded();
        self.links.insert(
            id,
            ActorLink {
                buffer: Arc::clone(&buffer),
                snapshots: snapshots_tx,
                heading: CurrentHeading::default(),
            },
        );
        self.roster.insert(
            id,
            RosterEntry {
                name: name.clone(),
                kind,
            },
        );
        info!(actor = %id, %name, %kind, at = %head, "Actor joined");

        Ok(ActorHandle {
            id,
            name,
            commands: CommandSender::new(id, buffer),
            snapshots: snapshots_rx,
        })
    }

    fn retire_dead(&mut self) {
        let board = &self.board;
        let dead: Vec<ActorId> = self
            .links
            .keys()
            .copied()
            .filter(|&id| !board.is_alive(id))
            .collect();
        for id in dead {
            if let Some(link) = self.links.remove(&id) {
                link.buffer.close();
            }
        }
    }

    /// Stops taking joins, sends every remaining actor the final board and
    /// hangs up on it.
    fn finish(&mut self) {
        // Pending requests are dropped unanswered, which their callers see
        // as the game being over
        self.join_rx = None;
        let snapshot = Arc::new(self.board.snapshot(self.tick.saturating_sub(1)));
        for (id, link) in std::mem::take(&mut self.links) {
            link.buffer.close();
            if link.snapshots.send(Arc::clone(&snapshot)).is_err() {
                trace!(actor = %id, "Actor already gone");
            }
        }
    }
}
