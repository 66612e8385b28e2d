//! Recorder handle
//!
//! Shared, cloneable entry point for the host application. Wraps the
//! coordinator in an async mutex and runs the render loop that ticks it at
//! the session frame rate.

use super::channel::RecordingResult;
use super::coordinator::{
    await_finalize, RecorderServices, RecordingCoordinator, RecordingEvent, ZoomStatus,
};
use super::state::{RecordingOptions, RecordingOutput, RecordingState};
use crate::capture::traits::{CaptureSource, SourceKind};
use crate::compositor::frame::Frame;
use crate::settings::ZoomSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

#[derive(Clone)]
pub struct Recorder {
    pub coordinator: Arc<Mutex<RecordingCoordinator>>,
    services: RecorderServices,
    render_loop: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl Recorder {
    pub fn new(services: RecorderServices, zoom_settings: ZoomSettings) -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(RecordingCoordinator::new(
                services.clone(),
                zoom_settings,
            ))),
            services,
            render_loop: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Sources of one kind, for the source picker
    pub async fn list_sources(&self, kind: SourceKind) -> RecordingResult<Vec<CaptureSource>> {
        self.services.registry.list_sources(kind).await
    }

    pub async fn set_zoom_settings(&self, settings: ZoomSettings) {
        self.coordinator.lock().await.set_zoom_settings(settings);
    }

    /// Start recording and the render loop
    pub async fn start_recording(
        &self,
        source: CaptureSource,
        options: RecordingOptions,
    ) -> RecordingResult<Uuid> {
        let mut coordinator = self.coordinator.lock().await;
        let id = coordinator.start(source, options).await?;
        let frame_rate = coordinator.frame_rate().unwrap_or(60);
        drop(coordinator);

        self.spawn_render_loop(frame_rate);
        Ok(id)
    }

    pub async fn pause_recording(&self) -> RecordingResult<()> {
        self.coordinator.lock().await.pause()
    }

    pub async fn resume_recording(&self) -> RecordingResult<()> {
        self.coordinator.lock().await.resume()
    }

    /// Stop recording and return the encoded output
    ///
    /// The render loop keeps running while the encoder finalizes and is
    /// cancelled afterwards. Returns `Ok(None)` if nothing was recording.
    pub async fn stop_recording(&self) -> RecordingResult<Option<RecordingOutput>> {
        let Some(finalized) = self.coordinator.lock().await.begin_stop()? else {
            return Ok(None);
        };

        let result = await_finalize(finalized).await;
        let output = self.coordinator.lock().await.finish_stop(result);
        self.cancel_render_loop();

        output.map(Some)
    }

    pub async fn state(&self) -> RecordingState {
        self.coordinator.lock().await.state()
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.coordinator.lock().await.subscribe()
    }

    pub async fn watch_state(&self) -> watch::Receiver<RecordingState> {
        self.coordinator.lock().await.watch_state()
    }

    pub async fn watch_zoom(&self) -> watch::Receiver<ZoomStatus> {
        self.coordinator.lock().await.watch_zoom()
    }

    pub async fn watch_preview(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.coordinator.lock().await.watch_preview()
    }

    pub fn is_render_loop_running(&self) -> bool {
        self.render_loop
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn spawn_render_loop(&self, frame_rate: u32) {
        let weak = Arc::downgrade(&self.coordinator);
        let period = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                let mut coordinator = coordinator.lock().await;
                if !coordinator.has_session() {
                    break;
                }
                let now = coordinator.process_time_ms();
                coordinator.tick(now);
            }

            tracing::debug!("Render loop exited");
        });

        if let Some(previous) = self.render_loop.lock().replace(handle) {
            previous.abort();
        }
        tracing::debug!("Render loop started at {} fps", frame_rate);
    }

    fn cancel_render_loop(&self) {
        if let Some(handle) = self.render_loop.lock().take() {
            handle.abort();
        }
    }
}
