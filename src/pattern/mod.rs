// Pattern - Channels, step grids and sequences read by the scheduler

pub mod channel;
pub mod grid;
pub mod sequence;
pub mod store;

pub use channel::{Channel, MAX_VOLUME};
pub use grid::{StepCell, StepGrid};
pub use sequence::Sequence;
pub use store::{PatternBank, PatternStore};
