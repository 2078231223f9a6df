/// Current holding of one instrument. A ticker in the holdings map always
/// has `shares > 0`; a position reaching zero shares is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: u64,
    pub avg_price: f64,
}
