//! Virtual camera
//!
//! Owns the crop window ("source rect") applied to the raw video each frame.
//! A zoom state change starts a time-bounded eased transition; while zoomed
//! in with no transition running, the window pans after the cursor with
//! exponential smoothing. One controller exists per recording session.

use super::easing::ease_in_out_cubic;
use super::geometry::{display_to_raw, window_around, CursorPosition, SourceRect};
use crate::capture::traits::DisplayBounds;
use crate::compositor::frame::FrameSize;
use crate::settings::ZoomSettings;

/// An in-flight eased transition between two rects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomAnimation {
    pub start_time_ms: f64,
    pub duration_ms: f64,
    pub start_rect: SourceRect,
    pub end_rect: SourceRect,
}

impl ZoomAnimation {
    /// Linear (un-eased) progress in `[0, 1]`
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_time_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct VirtualCameraController {
    frame: FrameSize,
    /// Region the camera may show; the full frame or a custom crop
    base: SourceRect,
    rect: SourceRect,
    animation: Option<ZoomAnimation>,
    zoomed_in: bool,
}

impl VirtualCameraController {
    pub fn new(frame: FrameSize) -> Self {
        Self::with_base(frame, SourceRect::full(frame))
    }

    /// Camera restricted to `base`, which is clamped into the frame
    pub fn with_base(frame: FrameSize, base: SourceRect) -> Self {
        let full = SourceRect::full(frame);
        let base = if base.width > 0.0 && base.height > 0.0 {
            base.clamped_to(&full)
        } else {
            full
        };

        Self {
            frame,
            base,
            rect: base,
            animation: None,
            zoomed_in: false,
        }
    }

    pub fn rect(&self) -> SourceRect {
        self.rect
    }

    pub fn base(&self) -> SourceRect {
        self.base
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame
    }

    pub fn is_zoomed_in(&self) -> bool {
        self.zoomed_in
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn animation(&self) -> Option<&ZoomAnimation> {
        self.animation.as_ref()
    }

    /// Start a transition towards the zoomed-in or full view
    ///
    /// The transition always starts from the rect currently shown, so a
    /// reversal mid-animation continues smoothly from where it is.
    pub fn on_zoom_state_change(
        &mut self,
        zoomed_in: bool,
        cursor: CursorPosition,
        display: &DisplayBounds,
        settings: &ZoomSettings,
        now_ms: f64,
    ) {
        let end_rect = if zoomed_in {
            let zoom = settings.zoom_factor.max(1.0);
            self.target_for(
                cursor,
                display,
                self.base.width / zoom,
                self.base.height / zoom,
            )
        } else {
            self.base
        };

        tracing::debug!(
            "Zoom {} towards ({:.0}, {:.0}, {:.0}x{:.0})",
            if zoomed_in { "in" } else { "out" },
            end_rect.x,
            end_rect.y,
            end_rect.width,
            end_rect.height
        );

        self.zoomed_in = zoomed_in;
        self.animation = Some(ZoomAnimation {
            start_time_ms: now_ms,
            duration_ms: settings.animation_duration_ms.max(0.0),
            start_rect: self.rect,
            end_rect,
        });
    }

    /// Advance the camera to `now_ms` and return the rect to draw
    pub fn tick(
        &mut self,
        now_ms: f64,
        cursor: CursorPosition,
        display: &DisplayBounds,
        settings: &ZoomSettings,
    ) -> SourceRect {
        if let Some(animation) = self.animation {
            let progress = animation.progress(now_ms);
            if progress >= 1.0 {
                self.rect = animation.end_rect;
                self.animation = None;
            } else {
                let eased = ease_in_out_cubic(progress);
                self.rect = animation
                    .start_rect
                    .lerp(&animation.end_rect, eased)
                    .clamped_to(&self.base);
            }
        } else if self.zoomed_in {
            let target = self.target_for(cursor, display, self.rect.width, self.rect.height);
            let smoothing = settings.smoothing_factor.clamp(0.0, 1.0);
            let mut next = self.rect;
            next.x += (target.x - next.x) * smoothing;
            next.y += (target.y - next.y) * smoothing;
            self.rect = next.clamped_to(&self.base);
        } else {
            self.rect = self.base;
        }

        self.rect
    }

    /// Back to the full, unzoomed view with no transition pending
    pub fn reset(&mut self) {
        self.rect = self.base;
        self.animation = None;
        self.zoomed_in = false;
    }

    fn target_for(
        &self,
        cursor: CursorPosition,
        display: &DisplayBounds,
        width: f64,
        height: f64,
    ) -> SourceRect {
        let center = display_to_raw(cursor, display, self.frame);
        window_around(center, width, height, &self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const HD: FrameSize = FrameSize {
        width: 1920,
        height: 1080,
    };

    fn hd_display() -> DisplayBounds {
        DisplayBounds::new(0.0, 0.0, 1920.0, 1080.0)
    }

    fn settings() -> ZoomSettings {
        ZoomSettings {
            zoom_factor: 2.0,
            animation_duration_ms: 500.0,
            smoothing_factor: 0.2,
            ..Default::default()
        }
    }

    #[test]
    fn test_zoom_in_centers_on_cursor() {
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(
            true,
            CursorPosition::new(960.0, 540.0),
            &hd_display(),
            &settings(),
            0.0,
        );

        let animation = camera.animation().unwrap();
        assert_eq!(animation.end_rect, SourceRect::new(480.0, 270.0, 960.0, 540.0));
        assert_eq!(animation.start_rect, SourceRect::full(HD));
        assert!(camera.is_zoomed_in());
    }

    #[test]
    fn test_zoom_in_at_origin_is_clamped() {
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(
            true,
            CursorPosition::new(0.0, 0.0),
            &hd_display(),
            &settings(),
            0.0,
        );

        assert_eq!(
            camera.animation().unwrap().end_rect,
            SourceRect::new(0.0, 0.0, 960.0, 540.0)
        );
    }

    #[test]
    fn test_cursor_scaled_from_display_points() {
        // 1920x1080 logical display captured at 3840x2160
        let mut camera = VirtualCameraController::new(FrameSize::new(3840, 2160));
        camera.on_zoom_state_change(
            true,
            CursorPosition::new(960.0, 540.0),
            &hd_display(),
            &settings(),
            0.0,
        );
        assert_eq!(
            camera.animation().unwrap().end_rect,
            SourceRect::new(960.0, 540.0, 1920.0, 1080.0)
        );
    }

    #[test]
    fn test_animation_converges_exactly() {
        let settings = settings();
        let cursor = CursorPosition::new(1234.5, 321.0);
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 1000.0);
        let end = camera.animation().unwrap().end_rect;

        let mut now = 1000.0;
        while now < 1500.0 {
            camera.tick(now, cursor, &hd_display(), &settings);
            assert!(camera.is_animating());
            now += 16.0;
        }

        assert_eq!(camera.tick(1500.0, cursor, &hd_display(), &settings), end);
        assert!(!camera.is_animating());
    }

    #[test]
    fn test_animation_midpoint_is_eased() {
        let settings = settings();
        let cursor = CursorPosition::new(960.0, 540.0);
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 0.0);

        // quarter of the way in time is 1/16 of the way in space
        let rect = camera.tick(125.0, cursor, &hd_display(), &settings);
        assert!((rect.width - (1920.0 - 960.0 * 0.0625)).abs() < 1e-9);
        let rect = camera.tick(250.0, cursor, &hd_display(), &settings);
        assert!((rect.width - 1440.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversal_starts_from_current_rect() {
        let settings = settings();
        let cursor = CursorPosition::new(960.0, 540.0);
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 0.0);
        let midway = camera.tick(250.0, cursor, &hd_display(), &settings);

        camera.on_zoom_state_change(false, cursor, &hd_display(), &settings, 250.0);
        let animation = camera.animation().unwrap();
        assert_eq!(animation.start_rect, midway);
        assert_eq!(animation.end_rect, SourceRect::full(HD));

        assert!(camera.tick(260.0, cursor, &hd_display(), &settings).width > midway.width);
        assert_eq!(camera.tick(750.0, cursor, &hd_display(), &settings), SourceRect::full(HD));
        assert!(!camera.is_animating());
        assert!(!camera.is_zoomed_in());
    }

    #[test]
    fn test_follow_smooths_towards_cursor() {
        let settings = settings();
        let mut camera = VirtualCameraController::new(HD);
        let start = CursorPosition::new(960.0, 540.0);
        camera.on_zoom_state_change(true, start, &hd_display(), &settings, 0.0);
        camera.tick(500.0, start, &hd_display(), &settings);

        // cursor jumps right; target x = 1400 - 480 = 920, 20% of 440 per tick
        let moved = CursorPosition::new(1400.0, 540.0);
        let rect = camera.tick(516.0, moved, &hd_display(), &settings);
        assert!((rect.x - 568.0).abs() < 1e-9);
        assert_eq!(rect.y, 270.0);
        assert_eq!((rect.width, rect.height), (960.0, 540.0));

        let mut last = rect.x;
        for i in 0..200 {
            let rect = camera.tick(532.0 + i as f64 * 16.0, moved, &hd_display(), &settings);
            assert!(rect.x >= last);
            last = rect.x;
        }
        assert!((last - 920.0).abs() < 1e-6);
        assert!(!camera.is_animating());
    }

    #[test]
    fn test_unzoomed_stays_pinned() {
        let settings = settings();
        let mut camera = VirtualCameraController::new(HD);
        for i in 0..10 {
            let rect = camera.tick(
                i as f64 * 16.0,
                CursorPosition::new(i as f64 * 100.0, 10.0),
                &hd_display(),
                &settings,
            );
            assert_eq!(rect, SourceRect::full(HD));
        }
    }

    #[test]
    fn test_zero_duration_snaps() {
        let settings = ZoomSettings {
            animation_duration_ms: 0.0,
            ..settings()
        };
        let cursor = CursorPosition::new(960.0, 540.0);
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 10.0);
        assert_eq!(
            camera.tick(10.0, cursor, &hd_display(), &settings),
            SourceRect::new(480.0, 270.0, 960.0, 540.0)
        );
    }

    #[test]
    fn test_crop_base_limits_camera() {
        let crop = SourceRect::new(200.0, 100.0, 800.0, 600.0);
        let settings = settings();
        let mut camera = VirtualCameraController::with_base(HD, crop);
        assert_eq!(camera.rect(), crop);

        let cursor = CursorPosition::new(1900.0, 1000.0);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 0.0);
        assert_eq!(
            camera.animation().unwrap().end_rect,
            SourceRect::new(600.0, 400.0, 400.0, 300.0)
        );

        camera.on_zoom_state_change(false, cursor, &hd_display(), &settings, 100.0);
        assert_eq!(camera.tick(600.0, cursor, &hd_display(), &settings), crop);
    }

    #[test]
    fn test_reset_returns_to_full_frame() {
        let settings = settings();
        let cursor = CursorPosition::new(100.0, 100.0);
        let mut camera = VirtualCameraController::new(HD);
        camera.on_zoom_state_change(true, cursor, &hd_display(), &settings, 0.0);
        camera.tick(100.0, cursor, &hd_display(), &settings);

        camera.reset();
        assert!(!camera.is_zoomed_in());
        assert!(!camera.is_animating());
        assert_eq!(camera.rect(), SourceRect::full(HD));
    }

    #[test]
    fn test_rect_stays_in_bounds_for_random_cursors() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let display = DisplayBounds::new(-1280.0, 0.0, 1280.0, 720.0);
        let bounds = SourceRect::full(HD);

        for _ in 0..50 {
            let settings = ZoomSettings {
                zoom_factor: rng.gen_range(1.0..6.0),
                animation_duration_ms: rng.gen_range(0.0..800.0),
                smoothing_factor: rng.gen_range(0.01..=1.0),
                ..Default::default()
            };
            let mut camera = VirtualCameraController::new(HD);
            let mut now = 0.0;

            for step in 0..300 {
                let cursor = CursorPosition::new(
                    rng.gen_range(-4000.0..4000.0),
                    rng.gen_range(-3000.0..3000.0),
                );
                if step % 37 == 0 {
                    let zoom_in = rng.gen_bool(0.7);
                    camera.on_zoom_state_change(zoom_in, cursor, &display, &settings, now);
                    if let Some(animation) = camera.animation() {
                        assert!(animation.end_rect.is_within(&bounds, 1e-9));
                    }
                }

                now += rng.gen_range(1.0..40.0);
                let rect = camera.tick(now, cursor, &display, &settings);
                assert!(rect.is_within(&bounds, 1e-9), "out of bounds: {:?}", rect);
            }
        }
    }
}
