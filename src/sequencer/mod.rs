// Sequencer - Step scheduling, tempo and transport control

mod driver;
pub mod lookahead;
pub mod scheduler;
pub mod stats;
pub mod timeline;
pub mod transport;

pub use lookahead::Lookahead;
pub use scheduler::{PlaybackMode, SchedulerState, StepScheduler, TransportState};
pub use stats::{BarSummary, SchedulerStats};
pub use timeline::{MAX_BPM, MIN_BPM, Meter, StepPosition, Tempo};
pub use transport::{TransportBuilder, TransportController, TransportError};
