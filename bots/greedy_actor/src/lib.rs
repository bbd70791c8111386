use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use snakes::{ActorId, Coord, Heading, Snapshot, Tile, ALL_HEADINGS};
use snakes_actor_utils::{Actor, CommandSender};
use tracing::debug;

/// A scripted snake that heads for the closest bonus food, never steps onto
/// a body or malus food when it has a choice, and otherwise keeps going.
pub struct GreedyActor {
    rng: StdRng,
    last_submitted: Option<Heading>,
}

impl GreedyActor {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            last_submitted: None,
        }
    }

    fn choose_heading(&mut self, me: ActorId, snapshot: &Snapshot) -> Option<Heading> {
        let body = snapshot.body(me)?;
        let head = body.head()?;
        let current = current_heading(snapshot, body.segments().iter().copied())
            .or(self.last_submitted);

        let safe: Vec<Heading> = ALL_HEADINGS
            .into_iter()
            .filter(|&h| current.map_or(true, |c| !h.is_opposite_of(c)))
            .filter(|&h| {
                matches!(
                    snapshot.tile(snapshot.step(head, h)),
                    Tile::Empty | Tile::FoodBonus
                )
            })
            .collect();
        if safe.is_empty() {
            debug!(actor = %me, "No safe move left");
            return current;
        }

        let size = snapshot.size();
        let target = snapshot
            .find_tiles(Tile::FoodBonus)
            .min_by_key(|&food| wrapped_distance(size, head, food));
        match target {
            Some(food) => {
                let best = safe
                    .iter()
                    .map(|&h| wrapped_distance(size, snapshot.step(head, h), food))
                    .min()?;
                let best_headings: Vec<Heading> = safe
                    .into_iter()
                    .filter(|&h| wrapped_distance(size, snapshot.step(head, h), food) == best)
                    .collect();
                match current {
                    Some(c) if best_headings.contains(&c) => Some(c),
                    _ => best_headings.choose(&mut self.rng).copied(),
                }
            }
            None => match current {
                Some(c) if safe.contains(&c) => Some(c),
                _ => safe.choose(&mut self.rng).copied(),
            },
        }
    }
}

impl Actor for GreedyActor {
    fn receive_snapshot(
        &mut self,
        me: ActorId,
        snapshot: &Snapshot,
        commands: &CommandSender,
    ) -> anyhow::Result<()> {
        let current = snapshot
            .body(me)
            .and_then(|body| current_heading(snapshot, body.segments().iter().copied()))
            .or(self.last_submitted);
        if let Some(heading) = self.choose_heading(me, snapshot) {
            if Some(heading) != current {
                commands.submit_command(heading)?;
                self.last_submitted = Some(heading);
            }
        }
        Ok(())
    }
}

/// The heading of the last move, read off the first two segments.
fn current_heading(
    snapshot: &Snapshot,
    mut segments: impl Iterator<Item = Coord>,
) -> Option<Heading> {
    let head = segments.next()?;
    let neck = segments.next()?;
    ALL_HEADINGS
        .into_iter()
        .find(|&h| snapshot.step(neck, h) == head)
}

/// Manhattan distance on a board whose edges wrap around.
fn wrapped_distance(size: u16, a: Coord, b: Coord) -> u32 {
    let axis = |p: u16, q: u16| {
        let d = p.abs_diff(q) as u32;
        d.min(size as u32 - d)
    };
    axis(a.x, b.x) + axis(a.y, b.y)
}
