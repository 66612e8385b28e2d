//! Recording coordinator
//!
//! Owns the active recording session and drives its lifecycle:
//! `Idle → Preparing → Recording ⇄ Paused → Stopping → Idle`.
//!
//! All session state is mutated from one place. Input events are only
//! buffered by the activity bridge; [`RecordingCoordinator::tick`] drains
//! them, updates the trigger policy and the virtual camera, composites the
//! frame and feeds the encoder sink.

use super::channel::{RecordingError, RecordingResult, TrackSet};
use super::sink::{CombinedStream, EncoderFactory, EncoderOptions, EncoderSink};
use super::state::{RecordingOptions, RecordingOutput, RecordingSegment, RecordingState};
use crate::capture::input::{ActivityBridge, ActivityEvent, ActivityFilter, ActivityHook};
use crate::capture::traits::{
    resolve_display, CaptureRegistry, CaptureSource, DisplayBounds, DisplayProvider,
};
use crate::compositor::frame::Frame;
use crate::compositor::layout::{canvas_size, CompositorLayout};
use crate::compositor::{CompositeError, Compositor, WebcamLayer};
use crate::settings::ZoomSettings;
use crate::zoom::{CursorPosition, SourceRect, TriggerPolicy, VirtualCameraController, ZoomSignal};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, oneshot, watch};
use uuid::Uuid;

/// Events emitted during recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    /// Recording started
    Started(Uuid),
    /// Recording stopped and the output is ready
    Stopped,
    Paused,
    Resumed,
    /// Error occurred
    Error(String),
    /// Auto zoom flipped (true = zoomed in)
    ZoomChanged(bool),
}

/// Zoom status shown next to the preview
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomStatus {
    /// Input tracking is running for the current session
    pub tracking: bool,
    pub zoomed_in: bool,
}

/// External collaborators a coordinator works with
#[derive(Clone)]
pub struct RecorderServices {
    pub registry: Arc<dyn CaptureRegistry>,
    pub displays: Arc<dyn DisplayProvider>,
    /// Optional system-wide input hook; without it auto zoom is off
    pub hook: Option<Arc<dyn ActivityHook>>,
    pub encoder: Arc<dyn EncoderFactory>,
}

/// Everything owned by one recording, torn down at stop
struct ActiveSession {
    id: Uuid,
    source: CaptureSource,
    options: RecordingOptions,
    settings: ZoomSettings,
    tracks: TrackSet,
    compositor: Compositor,
    camera: VirtualCameraController,
    policy: TriggerPolicy,
    bridge: Option<ActivityBridge>,
    display: DisplayBounds,
    cursor: CursorPosition,
    sink: Box<dyn EncoderSink>,
    chunks: Vec<Vec<u8>>,
    segments: Vec<RecordingSegment>,
    started_at: Instant,
    skipped_streak: u32,
}

impl ActiveSession {
    fn process_time_ms(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64() * 1000.0
    }

    fn zoom_status(&self) -> ZoomStatus {
        ZoomStatus {
            tracking: self.bridge.as_ref().is_some_and(|b| b.is_connected()),
            zoomed_in: self.policy.is_zoomed_in(),
        }
    }

    fn apply_signal(&mut self, signal: ZoomSignal, now_ms: f64) -> bool {
        let zoomed_in = signal == ZoomSignal::ZoomIn;
        self.camera
            .on_zoom_state_change(zoomed_in, self.cursor, &self.display, &self.settings, now_ms);
        zoomed_in
    }

    /// Release tracks, the hook subscription and zoom state
    fn teardown(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.shutdown();
        }
        self.tracks.stop_all();
        self.policy.rearm();
        self.camera.reset();
    }
}

/// Composite the latest primary and webcam frames
fn render_tracks(
    compositor: &mut Compositor,
    tracks: &mut TrackSet,
    rect: &SourceRect,
) -> Result<(), CompositeError> {
    let primary = tracks.primary.as_mut().and_then(|s| s.latest_frame());
    let webcam = tracks
        .webcam
        .as_mut()
        .and_then(|s| s.latest_frame().map(|frame| (frame, s.dimensions())));

    let layer = webcam.as_ref().map(|(frame, native_size)| WebcamLayer {
        frame: &**frame,
        native_size: *native_size,
    });

    compositor.render(primary.as_deref(), rect, layer)
}

/// Manages the recording session
pub struct RecordingCoordinator {
    services: RecorderServices,

    zoom_settings: ZoomSettings,

    layout: CompositorLayout,

    /// Current recording state
    state: Arc<RwLock<RecordingState>>,

    session: Option<ActiveSession>,

    /// Event broadcaster
    event_tx: broadcast::Sender<RecordingEvent>,

    state_tx: watch::Sender<RecordingState>,

    zoom_tx: watch::Sender<ZoomStatus>,

    preview_tx: watch::Sender<Option<Arc<Frame>>>,
}

impl RecordingCoordinator {
    pub fn new(services: RecorderServices, zoom_settings: ZoomSettings) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (state_tx, _) = watch::channel(RecordingState::Idle);
        let (zoom_tx, _) = watch::channel(ZoomStatus::default());
        let (preview_tx, _) = watch::channel(None);

        Self {
            services,
            zoom_settings: zoom_settings.sanitized(),
            layout: CompositorLayout::default(),
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            session: None,
            event_tx,
            state_tx,
            zoom_tx,
            preview_tx,
        }
    }

    /// Zoom settings for the next session
    pub fn set_zoom_settings(&mut self, settings: ZoomSettings) {
        self.zoom_settings = settings.sanitized();
    }

    pub fn zoom_settings(&self) -> &ZoomSettings {
        &self.zoom_settings
    }

    /// Overlay layout for the next session
    pub fn set_layout(&mut self, layout: CompositorLayout) {
        self.layout = layout;
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<RecordingState> {
        self.state_tx.subscribe()
    }

    pub fn watch_zoom(&self) -> watch::Receiver<ZoomStatus> {
        self.zoom_tx.subscribe()
    }

    /// Latest composited frame, updated every tick including while paused
    pub fn watch_preview(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.preview_tx.subscribe()
    }

    /// Milliseconds since the current session started
    pub fn process_time_ms(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.process_time_ms())
            .unwrap_or(0.0)
    }

    /// Recorded duration excluding pauses
    pub fn duration_ms(&self) -> f64 {
        let Some(session) = self.session.as_ref() else {
            return 0.0;
        };
        let now = session.process_time_ms();
        session.segments.iter().map(|s| s.elapsed_ms(now)).sum()
    }

    /// Frame rate of the current session
    pub fn frame_rate(&self) -> Option<u32> {
        self.session
            .as_ref()
            .map(|s| s.options.effective_frame_rate())
    }

    fn set_state(&self, state: RecordingState) {
        *self.state.write() = state;
        self.state_tx.send_replace(state);
    }

    /// Start recording `source`
    ///
    /// Only the primary stream is mandatory. A webcam or microphone that
    /// cannot be acquired is left out of the recording.
    pub async fn start(
        &mut self,
        source: CaptureSource,
        options: RecordingOptions,
    ) -> RecordingResult<Uuid> {
        if self.state() != RecordingState::Idle {
            return Err(RecordingError::AlreadyRecording);
        }

        tracing::info!("Starting recording of {} ({})", source.name, source.id);
        self.set_state(RecordingState::Preparing);

        let prepared = Self::prepare(
            self.services.clone(),
            self.layout.clone(),
            self.zoom_settings.clone(),
            source,
            options,
        )
        .await;

        match prepared {
            Ok(session) => {
                let id = session.id;
                self.zoom_tx.send_replace(session.zoom_status());
                self.preview_tx.send_replace(Some(session.compositor.snapshot()));
                self.session = Some(session);
                self.set_state(RecordingState::Recording);
                let _ = self.event_tx.send(RecordingEvent::Started(id));
                tracing::info!("Recording {} started", id);
                Ok(id)
            }
            Err(e) => {
                tracing::error!("Failed to start recording: {}", e);
                self.set_state(RecordingState::Idle);
                let _ = self.event_tx.send(RecordingEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Acquire streams and build the session
    ///
    /// Any early return drops the partially built [`TrackSet`], which stops
    /// every track acquired so far.
    async fn prepare(
        services: RecorderServices,
        layout: CompositorLayout,
        settings: ZoomSettings,
        source: CaptureSource,
        options: RecordingOptions,
    ) -> RecordingResult<ActiveSession> {
        let kind = source.kind().ok_or_else(|| {
            RecordingError::SourceUnavailable(format!("unrecognized source id {}", source.id))
        })?;
        let frame_rate = options.effective_frame_rate();
        let registry = &services.registry;
        let mut tracks = TrackSet::default();

        tracks.primary = Some(registry.acquire_stream(&source, frame_rate).await?);

        if options.include_webcam {
            match registry
                .acquire_webcam(options.webcam_device_id.as_deref())
                .await
            {
                Ok(stream) => tracks.webcam = Some(stream),
                Err(e) => tracing::warn!("Webcam unavailable, recording without it: {}", e),
            }
        }

        if options.wants_microphone() {
            match registry
                .acquire_microphone(options.microphone_device_id.as_deref())
                .await
            {
                Ok(stream) => tracks.microphone = Some(stream),
                Err(e) => tracing::warn!("Microphone unavailable, recording video only: {}", e),
            }
        }

        if let Some(primary) = tracks.primary.as_mut() {
            primary.wait_ready().await?;
        }
        let webcam_ready = match tracks.webcam.as_mut() {
            Some(webcam) => webcam.wait_ready().await,
            None => Ok(()),
        };
        if let Err(e) = webcam_ready {
            tracing::warn!("Webcam never became ready, dropping it: {}", e);
            if let Some(mut stream) = tracks.webcam.take() {
                stream.stop();
            }
        }

        let first = tracks
            .primary
            .as_mut()
            .and_then(|s| s.latest_frame())
            .ok_or_else(|| RecordingError::CaptureError("primary stream has no frame".into()))?;
        first
            .validate()
            .map_err(|e| RecordingError::CaptureError(e.to_string()))?;
        let raw = first.size();

        let displays = services.displays.list_displays();
        let display = resolve_display(&source, &displays)
            .map(|d| d.bounds)
            .unwrap_or_else(|| DisplayBounds::from_size(raw));

        let mut camera = match options.crop {
            Some(crop) => VirtualCameraController::with_base(raw, crop.to_raw()),
            None => VirtualCameraController::new(raw),
        };
        let base = camera.base();
        let canvas = canvas_size(base.width, base.height, options.resolution);

        let cursor = display.center();
        let mut compositor = Compositor::new(canvas, layout);
        let rect = camera.tick(0.0, cursor, &display, &settings);
        render_tracks(&mut compositor, &mut tracks, &rect)
            .map_err(|e| RecordingError::CaptureError(format!("first frame: {}", e)))?;

        let mut combined = CombinedStream::new(canvas, frame_rate);
        if let Some(mic) = tracks.microphone.as_ref() {
            combined = combined.with_audio(mic.track_info());
        }

        let encoder_options = EncoderOptions::for_quality(options.quality);
        let mut sink = services.encoder.create(&combined, &encoder_options)?;
        sink.start()?;

        tracing::info!(
            "Session prepared: {}, raw {}x{}, canvas {}x{}, {} kbps",
            tracks.summary(),
            raw.width,
            raw.height,
            canvas.width,
            canvas.height,
            encoder_options.video_bitrate / 1000
        );

        let bridge = match (&services.hook, settings.enabled) {
            (Some(hook), true) => {
                let filter = ActivityFilter::new(kind, Some(display));
                ActivityBridge::connect(hook.clone(), filter)
            }
            _ => None,
        };

        Ok(ActiveSession {
            id: Uuid::new_v4(),
            source,
            options,
            policy: TriggerPolicy::new(&settings),
            settings,
            tracks,
            compositor,
            camera,
            bridge,
            display,
            cursor,
            sink,
            chunks: Vec::new(),
            segments: vec![RecordingSegment::new(0, 0.0)],
            started_at: Instant::now(),
            skipped_streak: 0,
        })
    }

    /// Pause recording; the preview keeps updating
    pub fn pause(&mut self) -> RecordingResult<()> {
        if self.state() != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }
        let session = self.session.as_mut().ok_or(RecordingError::NotRecording)?;

        tracing::info!("Pausing recording");
        if let Err(e) = session.sink.pause() {
            let message = e.to_string();
            self.abort(e);
            return Err(RecordingError::EncodingError(message));
        }

        let now = session.process_time_ms();
        if let Some(segment) = session.segments.last_mut() {
            segment.end(now);
        }

        self.set_state(RecordingState::Paused);
        let _ = self.event_tx.send(RecordingEvent::Paused);
        Ok(())
    }

    /// Resume recording
    pub fn resume(&mut self) -> RecordingResult<()> {
        if self.state() != RecordingState::Paused {
            return Err(RecordingError::NotRecording);
        }
        let session = self.session.as_mut().ok_or(RecordingError::NotRecording)?;

        tracing::info!("Resuming recording");
        if let Err(e) = session.sink.resume() {
            let message = e.to_string();
            self.abort(e);
            return Err(RecordingError::EncodingError(message));
        }

        let now = session.process_time_ms();
        let index = session.segments.len();
        session.segments.push(RecordingSegment::new(index, now));

        self.set_state(RecordingState::Recording);
        let _ = self.event_tx.send(RecordingEvent::Resumed);
        Ok(())
    }

    /// Ask the sink to finalize
    ///
    /// Returns `None` when there is nothing to stop (idle, or a stop is
    /// already in progress). Otherwise the receiver resolves when the encoder
    /// is done and must be handed to [`RecordingCoordinator::finish_stop`].
    pub fn begin_stop(
        &mut self,
    ) -> RecordingResult<Option<oneshot::Receiver<RecordingResult<()>>>> {
        match self.state() {
            RecordingState::Recording | RecordingState::Paused => {}
            state => {
                tracing::debug!("Stop requested while {:?}, ignoring", state);
                return Ok(None);
            }
        }
        let Some(session) = self.session.as_mut() else {
            self.set_state(RecordingState::Idle);
            return Ok(None);
        };

        tracing::info!("Stopping recording {}", session.id);
        let now = session.process_time_ms();
        if let Some(segment) = session.segments.last_mut() {
            segment.end(now);
        }
        let finalized = session.sink.stop();

        self.set_state(RecordingState::Stopping);
        Ok(Some(finalized))
    }

    /// Tear the session down once the encoder has finalized
    ///
    /// Resources are released even when finalization failed.
    pub fn finish_stop(
        &mut self,
        finalized: RecordingResult<()>,
    ) -> RecordingResult<RecordingOutput> {
        let mut session = self.session.take().ok_or(RecordingError::NotRecording)?;

        let tail = session.sink.take_data();
        session.chunks.extend(tail);
        session.teardown();

        self.set_state(RecordingState::Idle);
        self.zoom_tx.send_replace(ZoomStatus::default());
        self.preview_tx.send_replace(None);

        match finalized {
            Ok(()) => {
                let bytes = session.chunks.concat();
                let output = RecordingOutput::new(bytes, &session.segments, Utc::now());
                tracing::info!(
                    "Recording {} stopped. Duration: {:.0}ms, {} bytes",
                    session.id,
                    output.total_duration_ms,
                    output.bytes.len()
                );
                let _ = self.event_tx.send(RecordingEvent::Stopped);
                Ok(output)
            }
            Err(e) => {
                tracing::error!("Encoder failed to finalize {}: {}", session.id, e);
                let _ = self.event_tx.send(RecordingEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stop and wait for the output in one call
    ///
    /// Returns `Ok(None)` when no recording was running.
    pub async fn stop(&mut self) -> RecordingResult<Option<RecordingOutput>> {
        let Some(finalized) = self.begin_stop()? else {
            return Ok(None);
        };
        let result = await_finalize(finalized).await;
        self.finish_stop(result).map(Some)
    }

    /// End the session after the encoder failed
    ///
    /// Runs the regular stop path without waiting for finalize, so tracks
    /// are released and the error reaches subscribers as
    /// [`RecordingEvent::Error`].
    fn abort(&mut self, error: RecordingError) {
        if let Ok(Some(_finalized)) = self.begin_stop() {
            let _ = self.finish_stop(Err(error));
        }
    }

    /// Advance the session by one frame
    ///
    /// Bad frames are skipped. An encoder error ends the session through
    /// the stop path.
    pub fn tick(&mut self, now_ms: f64) {
        let state = self.state();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let events = session
            .bridge
            .as_mut()
            .map(|b| b.drain())
            .unwrap_or_default();

        let mut signals = Vec::new();
        for event in events {
            match event {
                ActivityEvent::Move(position) => {
                    session.cursor = position;
                    session.policy.on_move(now_ms);
                }
                ActivityEvent::Click(position) => {
                    session.cursor = position;
                    signals.extend(session.policy.on_click(now_ms));
                }
                ActivityEvent::Key(_) => session.policy.on_key(now_ms),
            }
        }
        signals.extend(session.policy.poll(now_ms));

        for signal in signals {
            let zoomed_in = session.apply_signal(signal, now_ms);
            self.zoom_tx.send_replace(session.zoom_status());
            let _ = self.event_tx.send(RecordingEvent::ZoomChanged(zoomed_in));
        }

        let rect = session
            .camera
            .tick(now_ms, session.cursor, &session.display, &session.settings);

        let rendered = match render_tracks(&mut session.compositor, &mut session.tracks, &rect) {
            Ok(()) => {
                session.skipped_streak = 0;
                let previous = self
                    .preview_tx
                    .send_replace(Some(session.compositor.snapshot()));
                if let Some(frame) = previous {
                    session.compositor.recycle(frame);
                }
                true
            }
            Err(e) => {
                if session.skipped_streak == 0 {
                    tracing::debug!("Skipping frame: {}", e);
                }
                session.skipped_streak += 1;
                false
            }
        };

        let audio = session
            .tracks
            .microphone
            .as_mut()
            .map(|m| m.drain_samples())
            .unwrap_or_default();

        if state != RecordingState::Recording {
            return;
        }

        let mut written = Ok(());
        if rendered {
            written = session.sink.write_video(session.compositor.canvas(), now_ms);
        }
        for chunk in &audio {
            if written.is_err() {
                break;
            }
            written = session.sink.write_audio(chunk);
        }

        let data = session.sink.take_data();
        session.chunks.extend(data);

        if let Err(e) = written {
            tracing::error!("Encoder rejected samples for {}: {}", session.source.id, e);
            self.abort(e);
        }
    }
}

/// Wait for the encoder's finalize signal
pub async fn await_finalize(
    finalized: oneshot::Receiver<RecordingResult<()>>,
) -> RecordingResult<()> {
    finalized.await.unwrap_or_else(|_| {
        Err(RecordingError::EncodingError(
            "encoder dropped before finalizing".into(),
        ))
    })
}
