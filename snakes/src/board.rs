use std::collections::{BTreeMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{CapacityExhausted, Heading, Snapshot};

pub const DEFAULT_GRID_SIZE: u16 = 40;

/// Identifies a registered actor. Ids start at 1 and are never reused within a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position on the board. `(0, 0)` is the top left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: u16,
    pub y: u16,
}

impl Coord {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    #[default]
    Empty,
    Body,
    /// Grows the snake that eats it by one segment and adds a point.
    FoodBonus,
    /// Takes two segments off the tail of the snake that eats it and removes a point.
    FoodMalus,
}

impl Tile {
    pub fn is_food(self) -> bool {
        matches!(self, Tile::FoodBonus | Tile::FoodMalus)
    }
}

/// Why a snake is no longer alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum DeathCause {
    /// Ate malus food without enough segments left to pay for it.
    Starved,
    /// Moved onto a body tile. `with` is the snake that held the tile, which
    /// may be the snake itself.
    Collision { at: Coord, with: ActorId },
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeathCause::Starved => write!(f, "starved on malus food"),
            DeathCause::Collision { at, with } => {
                write!(f, "collided with the body of {} at {}", with, at)
            }
        }
    }
}

/// The segments of one snake, head first, together with its score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    segments: VecDeque<Coord>,
    score: i32,
    alive: bool,
    death: Option<DeathCause>,
}

impl Body {
    fn new(segments: VecDeque<Coord>) -> Self {
        Self {
            segments,
            score: 0,
            alive: true,
            death: None,
        }
    }

    /// Head first. Empty once the snake is dead.
    pub fn segments(&self) -> &VecDeque<Coord> {
        &self.segments
    }

    pub fn head(&self) -> Option<Coord> {
        self.segments.front().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death
    }

    pub fn occupies(&self, coord: Coord) -> bool {
        self.segments.contains(&coord)
    }

    fn kill(&mut self, cause: DeathCause) {
        self.alive = false;
        self.death = Some(cause);
    }
}

/// One step from `from` on a `size` x `size` board whose edges wrap around.
pub fn wrapping_step(size: u16, from: Coord, heading: Heading) -> Coord {
    let n = size as i32;
    let (dx, dy) = heading.delta();
    Coord {
        x: (from.x as i32 + dx).rem_euclid(n) as u16,
        y: (from.y as i32 + dy).rem_euclid(n) as u16,
    }
}

/// Summarizes what a single call to [`Board::apply_move()`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Grew,
    Shrank,
    Died(DeathCause),
}

/// The shared game board: a square grid of tiles with wrapping edges, and the
/// bodies of every snake that ever joined.
///
/// Invariant: a tile is [`Tile::Body`] exactly when one live body occupies it.
/// Dead bodies stay in the map with their score, but own no tiles.
#[derive(Clone, Debug)]
pub struct Board {
    size: u16,
    /// Row-major.
    tiles: Vec<Tile>,
    bodies: BTreeMap<ActorId, Body>,
}

impl Board {
    /// Creates an empty `size` x `size` board.
    ///
    /// Panics if `size` is zero.
    pub fn new(size: u16) -> Self {
        assert!(size > 0, "A board needs at least one tile");
        Self {
            size,
            tiles: vec![Tile::Empty; size as usize * size as usize],
            bodies: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn tile(&self, coord: Coord) -> Tile {
        self.tiles[self.index(coord)]
    }

    pub fn body(&self, id: ActorId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// All bodies, dead or alive, in id order.
    pub fn bodies(&self) -> impl Iterator<Item = (ActorId, &Body)> + '_ {
        self.bodies.iter().map(|(&id, body)| (id, body))
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.bodies.get(&id).map_or(false, Body::is_alive)
    }

    pub fn any_alive(&self) -> bool {
        self.bodies.values().any(Body::is_alive)
    }

    /// The coordinate one step away from `from`, wrapping around the edges.
    pub fn step(&self, from: Coord, heading: Heading) -> Coord {
        wrapping_step(self.size, from, heading)
    }

    /// The live snake occupying `coord`, if any.
    pub fn owner_of(&self, coord: Coord) -> Option<ActorId> {
        if self.tile(coord) != Tile::Body {
            return None;
        }
        self.bodies
            .iter()
            .find(|(_, body)| body.alive && body.occupies(coord))
            .map(|(&id, _)| id)
    }

    pub fn empty_tiles(&self) -> impl Iterator<Item = Coord> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, &tile)| tile == Tile::Empty)
            .map(|(idx, _)| self.coord_of(idx))
    }

    /// Picks one of the empty tiles uniformly at random.
    pub fn random_empty_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        let empty: Vec<Coord> = self.empty_tiles().collect();
        empty.choose(rng).copied()
    }

    /// Creates a single-segment snake for `id` on a random empty tile.
    ///
    /// Panics if `id` already has a body.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        id: ActorId,
        rng: &mut R,
    ) -> Result<Coord, CapacityExhausted> {
        assert!(
            !self.bodies.contains_key(&id),
            "Actor {} was spawned twice",
            id
        );
        let head = self.random_empty_tile(rng).ok_or(CapacityExhausted {
            grid_size: self.size,
        })?;
        self.set_tile(head, Tile::Body);
        self.bodies.insert(id, Body::new(VecDeque::from([head])));
        Ok(head)
    }

    /// Places one bonus and one malus food on random empty tiles.
    ///
    /// Either placement is skipped when there is no empty tile left.
    pub fn spawn_food<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for food in [Tile::FoodBonus, Tile::FoodMalus] {
            match self.random_empty_tile(rng) {
                Some(coord) => {
                    self.set_tile(coord, food);
                    trace!(?food, %coord, "Spawned food");
                }
                None => trace!(?food, "No empty tile left for food"),
            }
        }
    }

    /// Puts a snake with the given segments (head first) on the board.
    ///
    /// Panics if `id` already has a body, if there are no segments, or if any
    /// of the tiles is not empty.
    pub fn place_body(&mut self, id: ActorId, segments: impl IntoIterator<Item = Coord>) {
        assert!(
            !self.bodies.contains_key(&id),
            "Actor {} was spawned twice",
            id
        );
        let segments: VecDeque<Coord> = segments.into_iter().collect();
        assert!(!segments.is_empty(), "A body needs at least one segment");
        for &coord in &segments {
            assert_eq!(self.tile(coord), Tile::Empty, "Tile {} is taken", coord);
            self.set_tile(coord, Tile::Body);
        }
        self.bodies.insert(id, Body::new(segments));
    }

    /// Panics if `food` is not a food tile or `coord` is not empty.
    pub fn place_food(&mut self, coord: Coord, food: Tile) {
        assert!(food.is_food(), "{:?} is not food", food);
        assert_eq!(self.tile(coord), Tile::Empty, "Tile {} is taken", coord);
        self.set_tile(coord, food);
    }

    /// Moves the snake of `id` one step in `heading` and applies whatever it
    /// runs into.
    ///
    /// This is the core function of this type. What happens depends on the
    /// tile the new head lands on, looked at before the tail moves:
    /// - bonus food: the tail stays, so the snake grows by one, and scores a point.
    /// - malus food: the two last segments are removed and the snake loses a point.
    ///   If nothing is left, the snake is dead and the food is gone.
    /// - a body tile (its own or another snake's): the snake is dead and all
    ///   of its tiles are cleared. The other snake is not affected.
    /// - an empty tile: a normal move, the tail follows.
    ///
    /// Panics if `id` has no body or is dead. The scheduler only moves live
    /// snakes, so this is a bug in the caller.
    pub fn apply_move(&mut self, id: ActorId, heading: Heading) -> MoveOutcome {
        let mut body = self
            .bodies
            .remove(&id)
            .unwrap_or_else(|| panic!("Tried to move actor {}, which has no body", id));
        assert!(body.alive, "Tried to move actor {}, which is dead", id);

        // Live bodies always have a head
        let head = body.segments[0];
        let new_head = self.step(head, heading);

        let outcome = match self.tile(new_head) {
            Tile::FoodBonus => {
                self.set_tile(new_head, Tile::Body);
                body.segments.push_front(new_head);
                body.score += 1;
                MoveOutcome::Grew
            }
            Tile::FoodMalus => {
                for _ in 0..2 {
                    if let Some(tail) = body.segments.pop_back() {
                        self.set_tile(tail, Tile::Empty);
                    }
                }
                body.score -= 1;
                if body.segments.is_empty() {
                    self.set_tile(new_head, Tile::Empty);
                    body.kill(DeathCause::Starved);
                    MoveOutcome::Died(DeathCause::Starved)
                } else {
                    self.set_tile(new_head, Tile::Body);
                    body.segments.push_front(new_head);
                    MoveOutcome::Shrank
                }
            }
            Tile::Body => {
                let with = if body.occupies(new_head) {
                    id
                } else {
                    self.owner_of(new_head)
                        .expect("Every body tile belongs to a live snake")
                };
                for coord in std::mem::take(&mut body.segments) {
                    self.set_tile(coord, Tile::Empty);
                }
                let cause = DeathCause::Collision { at: new_head, with };
                body.kill(cause);
                MoveOutcome::Died(cause)
            }
            Tile::Empty => {
                if let Some(tail) = body.segments.pop_back() {
                    self.set_tile(tail, Tile::Empty);
                }
                self.set_tile(new_head, Tile::Body);
                body.segments.push_front(new_head);
                MoveOutcome::Moved
            }
        };

        self.bodies.insert(id, body);
        outcome
    }

    /// A deep copy of the board, tagged with the tick it was taken at.
    pub fn snapshot(&self, tick: u64) -> Snapshot {
        Snapshot::new(tick, self.size, self.tiles.clone(), self.bodies.clone())
    }

    fn index(&self, coord: Coord) -> usize {
        debug_assert!(coord.x < self.size && coord.y < self.size);
        coord.y as usize * self.size as usize + coord.x as usize
    }

    fn coord_of(&self, idx: usize) -> Coord {
        let size = self.size as usize;
        Coord::new((idx % size) as u16, (idx / size) as u16)
    }

    fn set_tile(&mut self, coord: Coord, tile: Tile) {
        let idx = self.index(coord);
        self.tiles[idx] = tile;
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::arbitrary::GridSize;

    const A: ActorId = ActorId(1);
    const B: ActorId = ActorId(2);

    fn c(x: u16, y: u16) -> Coord {
        Coord::new(x, y)
    }

    fn segments(board: &Board, id: ActorId) -> Vec<Coord> {
        board.body(id).unwrap().segments().iter().copied().collect()
    }

    /// Body tiles and live bodies agree, and no tile is claimed twice.
    fn invariants_hold(board: &Board) -> bool {
        for idx in 0..board.tiles.len() {
            let coord = board.coord_of(idx);
            let owners = board
                .bodies
                .values()
                .filter(|body| body.alive && body.occupies(coord))
                .count();
            let is_body = board.tile(coord) == Tile::Body;
            if owners > 1 || is_body != (owners == 1) {
                return false;
            }
        }
        board
            .bodies
            .values()
            .all(|body| body.alive != body.segments.is_empty())
    }

    quickcheck! {
        fn wraps_around_every_edge(size: GridSize) -> bool {
            let n = size.0;
            let board = Board::new(n);
            let last = n - 1;
            board.step(c(last, 0), Heading::Right) == c(0, 0)
                && board.step(c(0, 0), Heading::Left) == c(last, 0)
                && board.step(c(0, 0), Heading::Up) == c(0, last)
                && board.step(c(0, last), Heading::Down) == c(0, 0)
        }

        fn invariants_hold_under_random_play(seed: u64, moves: Vec<(u8, Heading)>) -> bool {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = Board::new(8);
            for id in 1..=3 {
                board.spawn(ActorId(id), &mut rng).unwrap();
            }
            for (i, (pick, heading)) in moves.into_iter().enumerate() {
                if i % 7 == 0 {
                    board.spawn_food(&mut rng);
                }
                let id = ActorId(pick as u32 % 3 + 1);
                if board.is_alive(id) {
                    board.apply_move(id, heading);
                }
                if !invariants_hold(&board) {
                    return false;
                }
            }
            true
        }
    }

    #[test]
    fn normal_move_trims_the_tail() {
        let mut board = Board::new(10);
        board.place_body(A, [c(3, 3), c(2, 3), c(1, 3)]);
        assert_eq!(board.apply_move(A, Heading::Down), MoveOutcome::Moved);
        assert_eq!(segments(&board, A), vec![c(3, 4), c(3, 3), c(2, 3)]);
        assert_eq!(board.tile(c(1, 3)), Tile::Empty);
        assert_eq!(board.tile(c(3, 4)), Tile::Body);
        assert_eq!(board.body(A).unwrap().score(), 0);
        assert!(invariants_hold(&board));
    }

    #[test]
    fn bonus_food_grows_and_scores() {
        let mut board = Board::new(10);
        board.place_body(A, [c(3, 3), c(2, 3)]);
        board.place_food(c(4, 3), Tile::FoodBonus);
        assert_eq!(board.apply_move(A, Heading::Right), MoveOutcome::Grew);
        assert_eq!(segments(&board, A), vec![c(4, 3), c(3, 3), c(2, 3)]);
        assert_eq!(board.body(A).unwrap().score(), 1);
        assert!(invariants_hold(&board));
    }

    #[test]
    fn malus_food_takes_two_tail_segments() {
        let mut board = Board::new(10);
        board.place_body(A, [c(3, 3), c(3, 4), c(3, 5), c(3, 6)]);
        board.place_food(c(3, 2), Tile::FoodMalus);
        assert_eq!(board.apply_move(A, Heading::Up), MoveOutcome::Shrank);
        assert_eq!(segments(&board, A), vec![c(3, 2), c(3, 3), c(3, 4)]);
        assert_eq!(board.tile(c(3, 5)), Tile::Empty);
        assert_eq!(board.tile(c(3, 6)), Tile::Empty);
        assert_eq!(board.body(A).unwrap().score(), -1);
        assert!(invariants_hold(&board));
    }

    #[test]
    fn malus_food_starves_a_two_segment_snake() {
        let mut board = Board::new(10);
        board.place_body(A, [c(3, 3), c(3, 4)]);
        board.place_food(c(3, 2), Tile::FoodMalus);
        assert_eq!(
            board.apply_move(A, Heading::Up),
            MoveOutcome::Died(DeathCause::Starved)
        );
        let body = board.body(A).unwrap();
        assert!(!body.is_alive());
        assert!(body.is_empty());
        assert_eq!(body.score(), -1);
        assert_eq!(board.tile(c(3, 2)), Tile::Empty);
        assert!(invariants_hold(&board));
    }

    #[test]
    fn single_segment_wraps_left_onto_malus_and_dies() {
        let mut board = Board::new(5);
        board.place_body(A, [c(0, 0)]);
        board.place_food(c(4, 0), Tile::FoodMalus);
        assert_eq!(
            board.apply_move(A, Heading::Left),
            MoveOutcome::Died(DeathCause::Starved)
        );
        let body = board.body(A).unwrap();
        assert!(!body.is_alive());
        assert!(body.is_empty());
        assert_eq!(body.score(), -1);
        assert!(board.empty_tiles().count() == 25);
    }

    #[test]
    fn collision_clears_only_the_mover() {
        let mut board = Board::new(10);
        board.place_body(A, [c(2, 2), c(1, 2), c(0, 2)]);
        board.place_body(B, [c(3, 1), c(3, 2), c(3, 3)]);
        assert_eq!(
            board.apply_move(A, Heading::Right),
            MoveOutcome::Died(DeathCause::Collision {
                at: c(3, 2),
                with: B
            })
        );
        assert!(!board.is_alive(A));
        assert!(board.body(A).unwrap().is_empty());
        for x in 0..3 {
            assert_eq!(board.tile(c(x, 2)), Tile::Empty);
        }
        assert!(board.is_alive(B));
        assert_eq!(segments(&board, B), vec![c(3, 1), c(3, 2), c(3, 3)]);
        assert!(invariants_hold(&board));
    }

    #[test]
    fn running_into_own_body_is_fatal() {
        let mut board = Board::new(10);
        board.place_body(A, [c(2, 2), c(2, 3), c(3, 3), c(3, 2), c(3, 1)]);
        assert_eq!(
            board.apply_move(A, Heading::Right),
            MoveOutcome::Died(DeathCause::Collision {
                at: c(3, 2),
                with: A
            })
        );
        assert_eq!(board.empty_tiles().count(), 100);
    }

    #[test]
    fn dead_snakes_keep_their_score() {
        let mut board = Board::new(10);
        board.place_body(A, [c(1, 1)]);
        board.place_body(B, [c(3, 1)]);
        board.place_food(c(2, 1), Tile::FoodBonus);
        assert_eq!(board.apply_move(A, Heading::Right), MoveOutcome::Grew);
        assert!(matches!(
            board.apply_move(A, Heading::Right),
            MoveOutcome::Died(DeathCause::Collision { with: B, .. })
        ));
        let body = board.body(A).unwrap();
        assert!(!body.is_alive());
        assert_eq!(body.score(), 1);
        assert_eq!(board.bodies().count(), 2);
    }

    #[test]
    fn three_moves_right_on_a_small_board() {
        let mut board = Board::new(5);
        board.place_body(A, [c(2, 2)]);
        for _ in 0..3 {
            assert_eq!(board.apply_move(A, Heading::Right), MoveOutcome::Moved);
        }
        assert_eq!(segments(&board, A), vec![c(0, 2)]);
        assert_eq!(board.body(A).unwrap().score(), 0);
        assert_eq!(board.empty_tiles().count(), 24);
    }

    #[test]
    fn same_target_resolves_in_application_order() {
        let mut board = Board::new(10);
        board.place_body(A, [c(4, 5)]);
        board.place_body(B, [c(6, 5)]);
        assert_eq!(board.apply_move(A, Heading::Right), MoveOutcome::Moved);
        assert_eq!(
            board.apply_move(B, Heading::Left),
            MoveOutcome::Died(DeathCause::Collision {
                at: c(5, 5),
                with: A
            })
        );
    }

    #[test]
    #[should_panic(expected = "which is dead")]
    fn moving_a_dead_snake_panics() {
        let mut board = Board::new(5);
        board.place_body(A, [c(0, 0)]);
        board.place_food(c(1, 0), Tile::FoodMalus);
        board.apply_move(A, Heading::Right);
        board.apply_move(A, Heading::Right);
    }

    #[test]
    fn spawn_fails_on_a_full_board() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new(2);
        for id in 1..=4 {
            board.spawn(ActorId(id), &mut rng).unwrap();
        }
        assert_eq!(
            board.spawn(ActorId(5), &mut rng),
            Err(CapacityExhausted { grid_size: 2 })
        );
        assert!(invariants_hold(&board));
    }

    #[test]
    fn spawn_food_places_one_of_each() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = Board::new(6);
        board.spawn(A, &mut rng).unwrap();
        board.spawn_food(&mut rng);
        let count = |tile: Tile| {
            (0..6)
                .flat_map(|y| (0..6).map(move |x| c(x, y)))
                .filter(|&p| board.tile(p) == tile)
                .count()
        };
        assert_eq!(count(Tile::FoodBonus), 1);
        assert_eq!(count(Tile::FoodMalus), 1);
        assert_eq!(count(Tile::Body), 1);
    }

    #[test]
    fn spawn_food_on_a_full_board_is_a_no_op() {
        let mut board = Board::new(1);
        board.place_body(A, [c(0, 0)]);
        board.spawn_food(&mut StdRng::seed_from_u64(0));
        assert_eq!(board.tile(c(0, 0)), Tile::Body);
    }

    #[test]
    fn snapshot_is_isolated_from_later_moves() {
        let mut board = Board::new(5);
        board.place_body(A, [c(1, 1)]);
        board.place_food(c(2, 1), Tile::FoodBonus);
        let snapshot = board.snapshot(0);
        board.apply_move(A, Heading::Right);
        board.apply_move(A, Heading::Right);
        assert_eq!(snapshot.tick(), 0);
        assert_eq!(snapshot.tile(c(2, 1)), Tile::FoodBonus);
        assert_eq!(snapshot.tile(c(3, 1)), Tile::Empty);
        let body = snapshot.body(A).unwrap();
        assert_eq!(body.head(), Some(c(1, 1)));
        assert_eq!(body.score(), 0);
        assert_eq!(board.body(A).unwrap().len(), 2);
    }
}
