//! Cards, hands, boards, ranges and equity lookups.
//!
//! Everything here is independent of the decision tree and the solver:
//!
//! - [`card`]: `Card`, `Hand`, `Board` and shared-card detection
//! - [`range`]: fractional hand ranges and range notation
//! - [`equity`]: the `EquityOracle` capability and an in-memory table

pub mod card;
pub mod equity;
pub mod range;

pub use card::{conflicts, Board, Card, CardParseError, Hand, NUM_CARDS, NUM_HANDS};
pub use equity::{EquityOracle, EquityTable, HandMatrix, OracleError};
pub use range::{ComboCounter, Range, RangeError};
