//! Zoom trigger policy
//!
//! Turns accepted activity into edge-triggered zoom in / zoom out signals.
//! Timers are deadlines checked by [`TriggerPolicy::poll`] on every tick, so
//! a deadline fires at most one tick late.

use crate::settings::ZoomSettings;

/// Edge emitted when the zoom state flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomSignal {
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    enabled: bool,
    inactivity_timeout_ms: f64,
    key_debounce_ms: f64,
    zoomed_in: bool,
    /// Zoom out when reached
    inactivity_deadline: Option<f64>,
    /// Pending keyboard activity settles when reached
    key_deadline: Option<f64>,
}

impl TriggerPolicy {
    pub fn new(settings: &ZoomSettings) -> Self {
        Self {
            enabled: settings.enabled,
            inactivity_timeout_ms: settings.inactivity_timeout_ms.max(0.0),
            key_debounce_ms: settings.key_debounce_ms.max(0.0),
            zoomed_in: false,
            inactivity_deadline: None,
            key_deadline: None,
        }
    }

    pub fn is_zoomed_in(&self) -> bool {
        self.zoomed_in
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A click always counts as activity and may zoom in
    pub fn on_click(&mut self, now_ms: f64) -> Option<ZoomSignal> {
        if !self.enabled {
            return None;
        }
        self.register_activity(now_ms)
    }

    /// Movement only keeps an existing zoom alive
    pub fn on_move(&mut self, now_ms: f64) {
        if self.enabled && self.zoomed_in {
            self.inactivity_deadline = Some(now_ms + self.inactivity_timeout_ms);
        }
    }

    /// Key presses count once they have been quiet for the debounce window
    pub fn on_key(&mut self, now_ms: f64) {
        if self.enabled {
            self.key_deadline = Some(now_ms + self.key_debounce_ms);
        }
    }

    /// Fire any timer that has expired by `now_ms`
    pub fn poll(&mut self, now_ms: f64) -> Option<ZoomSignal> {
        if !self.enabled {
            return None;
        }

        if let Some(settled_at) = self.key_deadline {
            if now_ms >= settled_at {
                self.key_deadline = None;
                if let Some(signal) = self.register_activity(settled_at) {
                    return Some(signal);
                }
            }
        }

        match self.inactivity_deadline {
            Some(deadline) if self.zoomed_in && now_ms >= deadline => {
                tracing::debug!(
                    "Inactive since {:.0}ms, zooming out",
                    deadline - self.inactivity_timeout_ms
                );
                self.inactivity_deadline = None;
                self.zoomed_in = false;
                Some(ZoomSignal::ZoomOut)
            }
            _ => None,
        }
    }

    /// Clear every timer and return to the unzoomed state
    pub fn rearm(&mut self) {
        self.zoomed_in = false;
        self.inactivity_deadline = None;
        self.key_deadline = None;
    }

    fn register_activity(&mut self, at_ms: f64) -> Option<ZoomSignal> {
        self.inactivity_deadline = Some(at_ms + self.inactivity_timeout_ms);
        if self.zoomed_in {
            None
        } else {
            self.zoomed_in = true;
            Some(ZoomSignal::ZoomIn)
        }
    }
}
