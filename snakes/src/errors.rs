/// The error type for [`Board::spawn()`](crate::Board::spawn): there is no empty tile left.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CapacityExhausted {
    pub grid_size: u16,
}

impl std::error::Error for CapacityExhausted {}

impl std::fmt::Display for CapacityExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "No empty tile left on the {}x{} board to spawn a snake",
            self.grid_size, self.grid_size
        )
    }
}

/// A blocking wait was abandoned because the game is shutting down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Interrupted;

impl std::error::Error for Interrupted {}

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted because the game is shutting down")
    }
}
