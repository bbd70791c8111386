use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use snakes::{ActorId, Snapshot, ALL_HEADINGS};
use snakes_actor_utils::{Actor, CommandSender};
use tracing::trace;

/// About four seconds at the default tick period.
pub const DEFAULT_MAX_MOVE_DELAY_TICKS: u32 = 33;

/// A scripted snake without any intelligence: it picks a random heading,
/// waits a random number of ticks, and repeats.
pub struct RandomActor {
    rng: StdRng,
    max_move_delay_ticks: u32,
    ticks_until_move: u32,
}

impl RandomActor {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            max_move_delay_ticks: DEFAULT_MAX_MOVE_DELAY_TICKS,
            ticks_until_move: 0,
        }
    }

    pub fn with_max_move_delay_ticks(mut self, ticks: u32) -> Self {
        self.max_move_delay_ticks = ticks;
        self
    }
}

impl Actor for RandomActor {
    fn receive_snapshot(
        &mut self,
        me: ActorId,
        _snapshot: &Snapshot,
        commands: &CommandSender,
    ) -> anyhow::Result<()> {
        if self.ticks_until_move > 0 {
            self.ticks_until_move -= 1;
            return Ok(());
        }
        let heading = *ALL_HEADINGS.choose(&mut self.rng).unwrap();
        trace!(actor = %me, %heading, "Random move");
        commands.submit_command(heading)?;
        self.ticks_until_move = self.rng.gen_range(0..self.max_move_delay_ticks.max(1));
        Ok(())
    }
}
