use serde::{Deserialize, Serialize};

/// The direction a snake travels in.
///
/// `(0, 0)` is the top left corner of the board, so [`Heading::Up`] decreases
/// `y` and [`Heading::Left`] decreases `x`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_HEADINGS: [Heading; 4] = [Heading::Up, Heading::Down, Heading::Left, Heading::Right];

impl Heading {
    pub fn opposite(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    pub fn is_opposite_of(self, other: Heading) -> bool {
        self.opposite() == other
    }

    /// The offset of a single step in this direction, as `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }
}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Heading::Up => "up",
            Heading::Down => "down",
            Heading::Left => "left",
            Heading::Right => "right",
        };
        write!(f, "{}", s)
    }
}

/// The heading a snake keeps moving in from tick to tick.
///
/// Starts out unset: a snake that never received a command does not move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrentHeading(Option<Heading>);

impl CurrentHeading {
    pub fn new(heading: Option<Heading>) -> Self {
        Self(heading)
    }

    pub fn get(&self) -> Option<Heading> {
        self.0
    }

    /// Switches to `requested` unless it would turn the snake back onto itself.
    ///
    /// Returns whether the request was accepted.
    pub fn update(&mut self, requested: Heading) -> bool {
        match self.0 {
            Some(current) if requested.is_opposite_of(current) => false,
            _ => {
                self.0 = Some(requested);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    quickcheck! {
        fn reversal_is_never_accepted(current: Heading) -> bool {
            let mut heading = CurrentHeading::new(Some(current));
            let accepted = heading.update(current.opposite());
            !accepted && heading.get() == Some(current)
        }

        fn non_reversal_is_always_accepted(current: Option<Heading>, requested: Heading) -> bool {
            let mut heading = CurrentHeading::new(current);
            let reversal = current.map_or(false, |c| requested.is_opposite_of(c));
            heading.update(requested) != reversal
        }
    }

    #[test]
    fn first_command_sets_heading() {
        let mut heading = CurrentHeading::default();
        assert_eq!(heading.get(), None);
        assert!(heading.update(Heading::Left));
        assert_eq!(heading.get(), Some(Heading::Left));
    }

    #[test]
    fn opposites_are_symmetric() {
        for heading in ALL_HEADINGS {
            assert_eq!(heading.opposite().opposite(), heading);
            assert!(heading.opposite().is_opposite_of(heading));
            assert!(!heading.is_opposite_of(heading));
        }
    }
}
