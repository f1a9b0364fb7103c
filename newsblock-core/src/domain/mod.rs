//! Domain types: 4h intervals, time blocks, and the column names they
//! annotate tables with.

pub mod block;
pub mod interval;

pub use block::TimeBlock;
pub use interval::Interval4h;

/// Column holding the block join key.
pub const TIME_BLOCK: &str = "Time_Block";
/// Column holding the interval label.
pub const INTERVAL_4H: &str = "Interval_4h";
/// Column holding the calendar date of the block.
pub const DATE: &str = "Date";
