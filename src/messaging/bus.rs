// Notification bus - Lock-free, non-blocking event publication
// The scheduler pushes into a bounded ring; observers drain it or get a
// delivery thread calling their sink

use super::event::TransportEvent;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type EventProducer = ringbuf::HeapProd<TransportEvent>;
pub type EventConsumer = ringbuf::HeapCons<TransportEvent>;

/// Observer callback, run on the delivery thread
pub type EventSink = Arc<dyn Fn(&TransportEvent) + Send + Sync>;

/// Publishing half, owned by the scheduler
///
/// `emit` never blocks: when the ring is full the event is dropped and
/// counted.
pub struct NotificationBus {
    tx: Option<EventProducer>,
    dropped: Arc<AtomicU64>,
}

impl NotificationBus {
    /// Create a bus and the receiving half
    pub fn channel(capacity: usize) -> (NotificationBus, EventReceiver) {
        let rb = HeapRb::<TransportEvent>::new(capacity.max(1));
        let (tx, rx) = rb.split();
        let dropped = Arc::new(AtomicU64::new(0));
        (
            NotificationBus {
                tx: Some(tx),
                dropped: Arc::clone(&dropped),
            },
            EventReceiver { rx, dropped },
        )
    }

    /// Bus with no observer; events are discarded
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn emit(&mut self, event: TransportEvent) {
        if let Some(tx) = self.tx.as_mut() {
            if tx.try_push(event).is_err() {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    log::warn!("Notification queue full, {} events dropped so far", dropped);
                }
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Receiving half for polling consumers
pub struct EventReceiver {
    rx: EventConsumer,
    dropped: Arc<AtomicU64>,
}

impl EventReceiver {
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.rx.try_pop()
    }

    pub fn drain(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::with_capacity(self.rx.occupied_len());
        while let Some(event) = self.rx.try_pop() {
            events.push(event);
        }
        events
    }

    pub fn pending(&self) -> usize {
        self.rx.occupied_len()
    }

    /// Events lost because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Deliver every event to `sink` from a dedicated thread
    pub fn dispatch_to(self, sink: EventSink) -> EventDispatcher {
        EventDispatcher::spawn(self, sink, Duration::from_millis(2))
    }
}

/// Delivery thread feeding an [`EventSink`]
///
/// A panicking sink is contained: the event is counted as failed and
/// delivery continues with the next one.
pub struct EventDispatcher {
    running: Arc<AtomicBool>,
    failures: Arc<AtomicU64>,
    handle: Option<JoinHandle<EventReceiver>>,
}

impl EventDispatcher {
    fn spawn(mut receiver: EventReceiver, sink: EventSink, poll_interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let failures = Arc::new(AtomicU64::new(0));
        let thread_running = Arc::clone(&running);
        let thread_failures = Arc::clone(&failures);

        let handle = thread::Builder::new()
            .name("pulsegrid-events".to_string())
            .spawn(move || {
                loop {
                    let keep_going = thread_running.load(Ordering::Acquire);
                    while let Some(event) = receiver.try_recv() {
                        if catch_unwind(AssertUnwindSafe(|| sink(&event))).is_err() {
                            thread_failures.fetch_add(1, Ordering::Relaxed);
                            log::error!("Event sink panicked on {:?} event", event.kind);
                        }
                    }
                    if !keep_going {
                        break;
                    }
                    thread::park_timeout(poll_interval);
                }
                receiver
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Could not spawn event delivery thread: {}", e);
                None
            }
        };

        Self {
            running,
            failures,
            handle,
        }
    }

    /// Number of sink invocations that panicked
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Deliver what is queued, stop the thread and hand the receiver back
    pub fn shutdown(mut self) -> Option<EventReceiver> {
        self.stop_thread()
    }

    fn stop_thread(&mut self) -> Option<EventReceiver> {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.take()?;
        handle.thread().unpark();
        handle.join().ok()
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        let _ = self.stop_thread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::EventKind;
    use std::sync::Mutex;

    fn step(n: usize) -> TransportEvent {
        TransportEvent::new(EventKind::Step, n, 0, n as f64)
    }

    #[test]
    fn test_emit_and_drain() {
        let (mut bus, mut rx) = NotificationBus::channel(8);
        bus.emit(step(0));
        bus.emit(step(1));
        let events = rx.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].step, 1);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (mut bus, mut rx) = NotificationBus::channel(2);
        for n in 0..5 {
            bus.emit(step(n));
        }
        assert_eq!(bus.dropped(), 3);
        assert_eq!(rx.dropped(), 3);
        let steps: Vec<usize> = rx.drain().iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![0, 1]);
    }

    #[test]
    fn test_disabled_bus() {
        let mut bus = NotificationBus::disabled();
        bus.emit(step(0));
        assert_eq!(bus.dropped(), 0);
    }

    #[test]
    fn test_sink_receives_events_in_order() {
        let (mut bus, rx) = NotificationBus::channel(16);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let dispatcher = rx.dispatch_to(Arc::new(move |e: &TransportEvent| {
            sink_seen.lock().unwrap().push(e.step);
        }));

        for n in 0..4 {
            bus.emit(step(n));
        }
        assert!(dispatcher.shutdown().is_some());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let (mut bus, rx) = NotificationBus::channel(16);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let dispatcher = rx.dispatch_to(Arc::new(move |e: &TransportEvent| {
            if e.step == 1 {
                panic!("observer bug");
            }
            sink_seen.lock().unwrap().push(e.step);
        }));

        for n in 0..3 {
            bus.emit(step(n));
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while dispatcher.failures() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(dispatcher.failures(), 1);
        drop(dispatcher);
        assert_eq!(*seen.lock().unwrap(), vec![0, 2]);
    }
}
