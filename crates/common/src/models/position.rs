/// Outcome of position sizing for one iteration.
/// A zero quantity means "skip trading this iteration".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSize {
    pub cash: f64,
    pub last_price: f64,
    pub quantity: u64,
}
