use snakes::{ActorId, Snapshot};

use crate::{Actor, CommandSender};

/// A human-controlled snake.
///
/// Commands come from an input source holding a [`CommandSender`]; the
/// snapshots go to `view` for display.
pub struct PlayerActor<V> {
    view: V,
}

impl<V> PlayerActor<V>
where
    V: FnMut(ActorId, &Snapshot),
{
    pub fn new(view: V) -> Self {
        Self { view }
    }
}

impl<V> Actor for PlayerActor<V>
where
    V: FnMut(ActorId, &Snapshot),
{
    fn receive_snapshot(
        &mut self,
        me: ActorId,
        snapshot: &Snapshot,
        _commands: &CommandSender,
    ) -> anyhow::Result<()> {
        (self.view)(me, snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use snakes::{Board, BufferSettings, CommandBuffer, Coord, Heading};

    use super::*;
    use crate::ActorHandle;

    #[test]
    fn forwards_snapshots_until_the_game_ends() {
        let id = ActorId(1);
        let buffer = Arc::new(CommandBuffer::new(BufferSettings::default()));
        let (snapshots_tx, snapshots_rx) = crossbeam_channel::unbounded();
        let handle = ActorHandle {
            id,
            name: String::from("ryan"),
            commands: CommandSender::new(id, Arc::clone(&buffer)),
            snapshots: snapshots_rx,
        };
        let input = handle.command_sender();

        let mut board = Board::new(4);
        board.place_body(id, [Coord::new(1, 1)]);
        snapshots_tx.send(Arc::new(board.snapshot(0))).unwrap();
        snapshots_tx.send(Arc::new(board.snapshot(1))).unwrap();
        drop(snapshots_tx);

        let mut seen = Vec::new();
        let mut player = PlayerActor::new(|me: ActorId, snapshot: &Snapshot| {
            seen.push((me, snapshot.tick()))
        });
        player.run(handle).unwrap();
        assert_eq!(seen, vec![(id, 0), (id, 1)]);

        input.submit_command(Heading::Up).unwrap();
        assert_eq!(buffer.pop_latest(), Some(Heading::Up));
    }

    #[test]
    fn stops_after_seeing_its_own_death() {
        let id = ActorId(3);
        let buffer = Arc::new(CommandBuffer::new(BufferSettings::default()));
        let (snapshots_tx, snapshots_rx) = crossbeam_channel::unbounded();
        let handle = ActorHandle {
            id,
            name: String::from("tony"),
            commands: CommandSender::new(id, buffer),
            snapshots: snapshots_rx,
        };

        let mut board = Board::new(4);
        board.place_body(id, [Coord::new(0, 0)]);
        board.place_food(Coord::new(0, 1), snakes::Tile::FoodMalus);
        board.apply_move(id, Heading::Down);
        snapshots_tx.send(Arc::new(board.snapshot(5))).unwrap();
        // Never read: the actor stops at its death
        snapshots_tx.send(Arc::new(board.snapshot(6))).unwrap();

        let mut ticks = Vec::new();
        PlayerActor::new(|_: ActorId, snapshot: &Snapshot| ticks.push(snapshot.tick()))
            .run(handle)
            .unwrap();
        assert_eq!(ticks, vec![5]);
    }
}
