use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use snakes::{BufferOrder, BufferSettings, DEFAULT_GRID_SIZE};

/// Everything that shapes one game. Missing fields in a config file fall back
/// to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Side length of the square board.
    pub grid_size: u16,
    pub tick_period_ms: u64,
    /// Food is spawned on every tick that is a multiple of this. 0 disables food.
    pub food_interval_ticks: u64,
    /// A command buffer holding more than this many commands is cleared on
    /// the next pop.
    pub buffer_overflow_threshold: usize,
    /// Pushing into a full buffer blocks until the coordinator pops.
    pub buffer_capacity: usize,
    pub buffer_order: BufferOrder,
    /// Upper bound on human players.
    pub max_players: usize,
    /// Upper bound on scripted actors.
    pub max_scripted: usize,
    /// The game does not start before this many players have joined.
    pub expected_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            tick_period_ms: 120,
            food_interval_ticks: 100,
            buffer_overflow_threshold: 3,
            buffer_capacity: 5,
            buffer_order: BufferOrder::Lifo,
            max_players: 4,
            max_scripted: 100,
            expected_players: 0,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: GameConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grid_size == 0 {
            anyhow::bail!("grid_size must be at least 1");
        }
        if self.buffer_capacity == 0 {
            anyhow::bail!("buffer_capacity must be at least 1");
        }
        // Otherwise pushes block before a backlog can ever overflow
        if self.buffer_capacity <= self.buffer_overflow_threshold {
            anyhow::bail!(
                "buffer_capacity ({}) must exceed buffer_overflow_threshold ({})",
                self.buffer_capacity,
                self.buffer_overflow_threshold
            );
        }
        if self.expected_players > self.max_players {
            anyhow::bail!(
                "expected_players ({}) exceeds max_players ({})",
                self.expected_players,
                self.max_players
            );
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn buffer_settings(&self) -> BufferSettings {
        BufferSettings {
            capacity: self.buffer_capacity,
            overflow_threshold: self.buffer_overflow_threshold,
            order: self.buffer_order,
        }
    }
}
