use quickcheck::Arbitrary;

use crate::{Heading, ALL_HEADINGS};

/// A board side length that is small enough to test exhaustively.
#[derive(Copy, Clone, Debug)]
pub struct GridSize(pub u16);

impl quickcheck::Arbitrary for GridSize {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        GridSize(u16::arbitrary(g) % 63 + 2)
    }
}

impl quickcheck::Arbitrary for Heading {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&ALL_HEADINGS).unwrap()
    }
}
