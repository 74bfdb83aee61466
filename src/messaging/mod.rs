// Messaging - Transport notifications to observers (playheads, visualizers)

pub mod bus;
pub mod event;

pub use bus::{EventDispatcher, EventReceiver, EventSink, NotificationBus};
pub use event::{EventKind, TransportEvent};
