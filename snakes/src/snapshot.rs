use std::collections::BTreeMap;

use serde::Serialize;

use crate::{wrapping_step, ActorId, Body, Coord, Heading, Tile};

/// An immutable copy of the board, taken between two ticks.
///
/// Owns all of its data, so it can be held across any number of later ticks
/// without observing them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    tick: u64,
    size: u16,
    tiles: Vec<Tile>,
    bodies: BTreeMap<ActorId, Body>,
}

impl Snapshot {
    pub(crate) fn new(
        tick: u64,
        size: u16,
        tiles: Vec<Tile>,
        bodies: BTreeMap<ActorId, Body>,
    ) -> Self {
        Self {
            tick,
            size,
            tiles,
            bodies,
        }
    }

    /// The tick whose moves this snapshot reflects.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn tile(&self, coord: Coord) -> Tile {
        self.tiles[coord.y as usize * self.size as usize + coord.x as usize]
    }

    pub fn body(&self, id: ActorId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (ActorId, &Body)> + '_ {
        self.bodies.iter().map(|(&id, body)| (id, body))
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.bodies.get(&id).map_or(false, Body::is_alive)
    }

    pub fn alive_actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.bodies
            .iter()
            .filter(|(_, body)| body.is_alive())
            .map(|(&id, _)| id)
    }

    /// Whether the snake of `id` has a segment on `coord`.
    pub fn occupies(&self, id: ActorId, coord: Coord) -> bool {
        self.bodies.get(&id).map_or(false, |body| body.occupies(coord))
    }

    pub fn step(&self, from: Coord, heading: Heading) -> Coord {
        wrapping_step(self.size, from, heading)
    }

    /// All tiles of a given kind, in row-major order.
    pub fn find_tiles(&self, kind: Tile) -> impl Iterator<Item = Coord> + '_ {
        let size = self.size as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, &tile)| tile == kind)
            .map(move |(idx, _)| Coord::new((idx % size) as u16, (idx / size) as u16))
    }
}
