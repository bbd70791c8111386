use std::collections::BTreeMap;

use serde::Serialize;
use snakes::{ActorId, Board, DeathCause};

use crate::ActorKind;

/// One actor's result, dead or alive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
    pub score: i32,
    pub length: usize,
    pub alive: bool,
    pub death: Option<DeathCause>,
}

/// Where the game stands after the last complete tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub ticks: u64,
    /// Best score first. Among equal scores, survivors come first, then
    /// lower ids.
    pub standings: Vec<Standing>,
}

#[derive(Clone, Debug)]
pub(crate) struct RosterEntry {
    pub(crate) name: String,
    pub(crate) kind: ActorKind,
}

/// Every actor with a body on `board`, in id order.
pub(crate) fn standings(board: &Board, roster: &BTreeMap<ActorId, RosterEntry>) -> Vec<Standing> {
    board
        .bodies()
        .filter_map(|(id, body)| {
            let entry = roster.get(&id)?;
            Some(Standing {
                id,
                name: entry.name.clone(),
                kind: entry.kind,
                score: body.score(),
                length: body.len(),
                alive: body.is_alive(),
                death: body.death_cause(),
            })
        })
        .collect()
}

impl GameSummary {
    pub(crate) fn new(ticks: u64, mut standings: Vec<Standing>) -> Self {
        standings.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.alive.cmp(&a.alive))
                .then(a.id.cmp(&b.id))
        });
        Self { ticks, standings }
    }

    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Standings after {} ticks:\n", self.ticks)?;
        writeln!(
            f,
            " {:>4} | {:19} | {:8} | {:>5} | {:>6} | status",
            "id", "name", "kind", "score", "length"
        )?;
        writeln!(f, "------|---------------------|----------|-------|--------|-------")?;
        for standing in &self.standings {
            let status = match standing.death {
                Some(cause) => format!("dead, {}", cause),
                None => String::from("alive"),
            };
            writeln!(
                f,
                " {:>4} | {:19} | {:8} | {:>5} | {:>6} | {}",
                standing.id.to_string(),
                standing.name,
                standing.kind.to_string(),
                standing.score,
                standing.length,
                status
            )?;
        }
        Ok(())
    }
}
