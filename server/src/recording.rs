use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Serialize;

use crate::{GameSummary, Standing};

/// Writes the course of a game to `<directory>/game_<n>.json`, one entry
/// per tick.
pub struct Recorder {
    num: usize,
    directory: PathBuf,
    ticks: Vec<TickRecord>,
}

#[derive(Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub actors: Vec<Standing>,
}

#[derive(Serialize)]
struct GameRecording<'a> {
    ticks: &'a [TickRecord],
    summary: &'a GameSummary,
}

impl Recorder {
    pub fn new(directory: PathBuf) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("Directory '{}' does not exist", directory.display());
        }
        Ok(Self {
            num: 1,
            directory,
            ticks: Vec::new(),
        })
    }

    pub fn record_tick(&mut self, tick: u64, actors: Vec<Standing>) {
        self.ticks.push(TickRecord { tick, actors });
    }

    pub fn recorded_ticks(&self) -> usize {
        self.ticks.len()
    }

    /// Writes everything recorded since the last call and starts over.
    pub fn write_game_recording(&mut self, summary: &GameSummary) -> anyhow::Result<PathBuf> {
        let filepath = self.directory.join(format!("game_{:0>6}.json", self.num));
        let writer = BufWriter::new(File::create(&filepath)?);
        let ticks = std::mem::take(&mut self.ticks);
        serde_json::to_writer_pretty(
            writer,
            &GameRecording {
                ticks: &ticks,
                summary,
            },
        )?;
        self.num += 1;
        Ok(filepath)
    }
}
