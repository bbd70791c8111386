use crate::{ActorId, Coord, Snapshot, Tile};

/// Draws the board as text, two columns per tile.
///
/// The viewer's own snake is drawn with `@` for the head and `o` for the
/// rest, other snakes with `#`. Bonus food is `+`, malus food is `-`.
pub fn visualize_board(snapshot: &Snapshot, viewer: Option<ActorId>) -> String {
    let size = snapshot.size();
    let viewer_head = viewer.and_then(|id| snapshot.body(id)).and_then(|body| body.head());

    // Draw the top of the box
    let mut result = String::from("    ╭");
    for _ in 0..size {
        result += "──";
    }
    result += "╮\n";

    for y in 0..size {
        result += &format!("{:>3} │", y);
        for x in 0..size {
            let coord = Coord::new(x, y);
            result += match snapshot.tile(coord) {
                Tile::Empty => "  ",
                Tile::FoodBonus => "+ ",
                Tile::FoodMalus => "- ",
                Tile::Body if viewer_head == Some(coord) => "@ ",
                Tile::Body if viewer.map_or(false, |id| snapshot.occupies(id, coord)) => "o ",
                Tile::Body => "# ",
            };
        }
        result += "│\n";
    }

    // Draw the bottom of the box
    result += "    ╰";
    for _ in 0..size {
        result += "──";
    }
    result += "╯";
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Board;

    #[test]
    fn draws_own_snake_apart_from_others() {
        let mut board = Board::new(3);
        board.place_body(ActorId(1), [Coord::new(0, 0), Coord::new(1, 0)]);
        board.place_body(ActorId(2), [Coord::new(2, 2)]);
        board.place_food(Coord::new(0, 1), Tile::FoodBonus);
        board.place_food(Coord::new(1, 1), Tile::FoodMalus);
        let expected = "    ╭──────╮
  0 │@ o   │
  1 │+ -   │
  2 │    # │
    ╰──────╯";
        assert_eq!(visualize_board(&board.snapshot(0), Some(ActorId(1))), expected);
    }
}
