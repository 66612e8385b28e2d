//! Activity bridge
//!
//! Connects the recorder to the system-wide input hook. The hook publishes
//! raw events on its own thread; the bridge only buffers them in the hook's
//! channel and the render tick drains and filters them.

use super::filter::ActivityFilter;
use super::types::{ActivityEvent, RawInputEvent};
use crate::recorder::channel::RecordingResult;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// System-wide mouse/keyboard hook
pub trait ActivityHook: Send + Sync {
    /// Begin delivering events. Fails when OS permission is missing.
    fn start_tracking(&self) -> RecordingResult<()>;

    /// Stop delivering events. Must be safe to call repeatedly.
    fn stop_tracking(&self);

    /// Subscribe to raw events; dropping the receiver unsubscribes
    fn subscribe(&self) -> broadcast::Receiver<RawInputEvent>;
}

/// Live subscription to the hook for one recording session
pub struct ActivityBridge {
    hook: Arc<dyn ActivityHook>,
    events: Option<broadcast::Receiver<RawInputEvent>>,
    filter: ActivityFilter,
}

impl ActivityBridge {
    /// Start tracking and subscribe
    ///
    /// Returns `None` when the hook cannot start, in which case auto zoom is
    /// unavailable for the session but recording is unaffected.
    pub fn connect(hook: Arc<dyn ActivityHook>, filter: ActivityFilter) -> Option<Self> {
        // subscribe first so nothing emitted right after start is missed
        let events = hook.subscribe();
        if let Err(e) = hook.start_tracking() {
            tracing::warn!("Input tracking unavailable, auto zoom disabled: {}", e);
            return None;
        }

        tracing::info!("Input tracking started");
        Some(Self {
            hook,
            events: Some(events),
            filter,
        })
    }

    /// Take every pending event that passes the filter
    pub fn drain(&mut self) -> Vec<ActivityEvent> {
        let mut accepted = Vec::new();
        let Some(events) = self.events.as_mut() else {
            return accepted;
        };

        loop {
            match events.try_recv() {
                Ok(raw) => {
                    if let Some(event) = self.filter.accept(&raw) {
                        accepted.push(event);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Input bridge lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    tracing::warn!("Input hook channel closed");
                    self.events = None;
                    break;
                }
            }
        }

        accepted
    }

    pub fn is_connected(&self) -> bool {
        self.events.is_some()
    }

    /// Unsubscribe and stop the hook
    pub fn shutdown(&mut self) {
        if self.events.take().is_some() {
            self.hook.stop_tracking();
            tracing::info!("Input tracking stopped");
        }
    }
}

impl Drop for ActivityBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::types::Modifiers;
    use crate::capture::traits::{DisplayBounds, SourceKind};
    use crate::recorder::channel::RecordingError;
    use crate::zoom::geometry::CursorPosition;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestHook {
        tx: broadcast::Sender<RawInputEvent>,
        deny: bool,
        stops: AtomicUsize,
    }

    impl TestHook {
        fn new(deny: bool) -> Arc<Self> {
            let (tx, _) = broadcast::channel(64);
            Arc::new(Self {
                tx,
                deny,
                stops: AtomicUsize::new(0),
            })
        }
    }

    impl ActivityHook for TestHook {
        fn start_tracking(&self) -> RecordingResult<()> {
            if self.deny {
                Err(RecordingError::PermissionDenied("accessibility".into()))
            } else {
                Ok(())
            }
        }

        fn stop_tracking(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn subscribe(&self) -> broadcast::Receiver<RawInputEvent> {
            self.tx.subscribe()
        }
    }

    fn screen_filter() -> ActivityFilter {
        ActivityFilter::new(
            SourceKind::Screen,
            Some(DisplayBounds::new(0.0, 0.0, 1920.0, 1080.0)),
        )
    }

    #[test]
    fn test_denied_hook_degrades() {
        let hook = TestHook::new(true);
        assert!(ActivityBridge::connect(hook, screen_filter()).is_none());
    }

    #[test]
    fn test_drain_filters_events() {
        let hook = TestHook::new(false);
        let mut bridge = ActivityBridge::connect(hook.clone(), screen_filter()).unwrap();

        hook.tx.send(RawInputEvent::MouseMove { x: 10.0, y: 20.0 }).unwrap();
        hook.tx.send(RawInputEvent::MouseMove { x: 5000.0, y: 20.0 }).unwrap();
        hook.tx
            .send(RawInputEvent::KeyDown {
                keycode: 60,
                modifiers: Modifiers::NONE,
            })
            .unwrap();

        let events = bridge.drain();
        assert_eq!(
            events,
            vec![ActivityEvent::Move(CursorPosition::new(10.0, 20.0))]
        );
        assert!(bridge.drain().is_empty());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let hook = TestHook::new(false);
        let mut bridge = ActivityBridge::connect(hook.clone(), screen_filter()).unwrap();
        bridge.shutdown();
        bridge.shutdown();
        drop(bridge);
        assert_eq!(hook.stops.load(Ordering::SeqCst), 1);
    }
}
