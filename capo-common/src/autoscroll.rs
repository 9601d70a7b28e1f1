//! Tempo-linked auto-scroll controller
//!
//! Scrolls a lyrics viewport from the top to `max_offset` over a duration
//! inversely proportional to the tempo. The controller owns no timer: the
//! host calls [`ScrollController::frame`] with the handle it was given and
//! the current time (milliseconds on any monotonic clock) once per display
//! refresh. Cancelling invalidates the handle, so a late frame for a
//! cancelled handle is ignored.

use serde::Serialize;

/// Slowest selectable tempo
pub const MIN_TEMPO: u32 = 30;
/// Fastest selectable tempo
pub const MAX_TEMPO: u32 = 150;
/// Tempo slider increment
pub const TEMPO_STEP: u32 = 10;

/// Offsets this close to the end count as "at the end" when resuming
const END_TOLERANCE: f64 = 1.0;

/// Clamp a requested tempo into the selectable range
pub fn clamp_tempo(tempo: u32) -> u32 {
    tempo.clamp(MIN_TEMPO, MAX_TEMPO)
}

/// Milliseconds needed to scroll `max_offset` at `tempo`
///
/// `(max_offset / (tempo / 6)) * 200`. Non-positive inputs yield 0.
pub fn total_duration_ms(max_offset: f64, tempo: u32) -> f64 {
    if max_offset <= 0.0 || tempo == 0 {
        return 0.0;
    }
    (max_offset / (f64::from(tempo) / 6.0)) * 200.0
}

/// Token for one scheduled animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Result of starting or resuming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// First frame scheduled
    Scheduled(FrameHandle),
    /// Content fits the viewport; reading is already finished
    NothingToScroll,
}

/// Result of toggling play/pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Paused,
    Resumed(FrameHandle),
    NothingToScroll,
}

/// Result of running one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Offset advanced; run `next` on the following refresh
    Scrolled { offset: f64, next: FrameHandle },
    /// End reached; offset is back at 0 and the controller is idle
    Finished,
    /// Handle was cancelled or superseded; nothing happened
    Stale,
}

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSnapshot {
    pub offset: f64,
    pub max_offset: f64,
    pub progress: f64,
    pub tempo: u32,
    pub running: bool,
}

/// Auto-scroll state for one opened song
#[derive(Debug, Clone)]
pub struct ScrollController {
    max_offset: f64,
    tempo: u32,
    running: bool,
    /// Offset applied by the last frame
    offset: f64,
    /// Offset captured at pause, resumed from
    paused_offset: f64,
    elapsed_at_pause: f64,
    /// Start time back-dated by the elapsed time carried over
    reference_start: f64,
    total_duration: f64,
    frame: Option<FrameHandle>,
    next_handle: u64,
}

impl ScrollController {
    /// Controller for a viewport that can scroll by `max_offset`
    pub fn new(max_offset: f64, tempo: u32) -> Self {
        Self {
            max_offset: max_offset.max(0.0),
            tempo: clamp_tempo(tempo),
            running: false,
            offset: 0.0,
            paused_offset: 0.0,
            elapsed_at_pause: 0.0,
            reference_start: 0.0,
            total_duration: 0.0,
            frame: None,
            next_handle: 0,
        }
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn elapsed_at_pause(&self) -> f64 {
        self.elapsed_at_pause
    }

    pub fn progress(&self) -> f64 {
        if self.max_offset > 0.0 {
            self.offset / self.max_offset
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot {
            offset: self.offset,
            max_offset: self.max_offset,
            progress: self.progress(),
            tempo: self.tempo,
            running: self.running,
        }
    }

    fn schedule(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.frame = Some(handle);
        handle
    }

    /// Invalidate the scheduled frame, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.frame = None;
    }

    /// Begin scrolling at `offset` as if `elapsed_at_start` ms had already passed
    pub fn start(&mut self, offset: f64, elapsed_at_start: f64, now: f64) -> StartOutcome {
        self.cancel();

        let total_duration = total_duration_ms(self.max_offset, self.tempo);
        if self.max_offset <= 0.0 || total_duration <= 0.0 {
            self.running = false;
            return StartOutcome::NothingToScroll;
        }

        self.total_duration = total_duration;
        self.offset = offset.clamp(0.0, self.max_offset);
        self.reference_start = now - elapsed_at_start;
        self.running = true;
        StartOutcome::Scheduled(self.schedule())
    }

    /// Stop and remember where we were
    pub fn pause(&mut self, now: f64) {
        self.cancel();
        if self.running {
            self.running = false;
            self.paused_offset = self.offset;
            self.elapsed_at_pause = now - self.reference_start;
        }
    }

    /// Resume from the pause point, or from the top once the end was reached
    pub fn resume(&mut self, now: f64) -> StartOutcome {
        let at_end = self.paused_offset >= self.max_offset - END_TOLERANCE;
        if at_end {
            self.paused_offset = 0.0;
            self.elapsed_at_pause = 0.0;
            self.start(0.0, 0.0, now)
        } else {
            self.start(self.paused_offset, self.elapsed_at_pause, now)
        }
    }

    /// Play/pause
    pub fn toggle(&mut self, now: f64) -> ToggleOutcome {
        if self.running {
            self.pause(now);
            ToggleOutcome::Paused
        } else {
            match self.resume(now) {
                StartOutcome::Scheduled(handle) => ToggleOutcome::Resumed(handle),
                StartOutcome::NothingToScroll => ToggleOutcome::NothingToScroll,
            }
        }
    }

    /// Change pace without moving the viewport
    ///
    /// While running, the current fraction is kept and the animation restarts
    /// with the elapsed time that fraction represents at the new tempo.
    pub fn set_tempo(&mut self, tempo: u32, now: f64) -> Option<StartOutcome> {
        self.tempo = clamp_tempo(tempo);
        let new_duration = total_duration_ms(self.max_offset, self.tempo);

        if !self.running {
            if self.max_offset > 0.0 {
                self.elapsed_at_pause = (self.paused_offset / self.max_offset) * new_duration;
            }
            return None;
        }

        self.cancel();
        if self.max_offset <= 0.0 || new_duration <= 0.0 {
            self.reset();
            return Some(StartOutcome::NothingToScroll);
        }

        let progress = self.offset / self.max_offset;
        let elapsed = progress * new_duration;
        self.elapsed_at_pause = elapsed;
        Some(self.start(self.offset, elapsed, now))
    }

    /// Advance for the display refresh at `now`
    pub fn frame(&mut self, handle: FrameHandle, now: f64) -> FrameOutcome {
        if self.frame != Some(handle) || !self.running {
            return FrameOutcome::Stale;
        }

        let elapsed = now - self.reference_start;
        let progress = (elapsed / self.total_duration).clamp(0.0, 1.0);
        self.offset = self.max_offset * progress;

        if progress < 1.0 {
            FrameOutcome::Scrolled {
                offset: self.offset,
                next: self.schedule(),
            }
        } else {
            self.reset();
            FrameOutcome::Finished
        }
    }

    /// Back to the top, idle
    fn reset(&mut self) {
        self.cancel();
        self.running = false;
        self.offset = 0.0;
        self.paused_offset = 0.0;
        self.elapsed_at_pause = 0.0;
    }

    /// Discard state when the view closes or another song is opened
    pub fn teardown(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: f64 = 600.0;

    fn scheduled(outcome: StartOutcome) -> FrameHandle {
        match outcome {
            StartOutcome::Scheduled(handle) => handle,
            other => panic!("expected scheduled frame, got {:?}", other),
        }
    }

    fn scrolled(outcome: FrameOutcome) -> (f64, FrameHandle) {
        match outcome {
            FrameOutcome::Scrolled { offset, next } => (offset, next),
            other => panic!("expected scroll, got {:?}", other),
        }
    }

    #[test]
    fn test_total_duration_formula() {
        // 600 / (60 / 6) * 200 = 12_000 ms
        assert_eq!(total_duration_ms(600.0, 60), 12_000.0);
        assert_eq!(total_duration_ms(600.0, 120), 6_000.0);
        assert_eq!(total_duration_ms(0.0, 120), 0.0);
        assert_eq!(total_duration_ms(600.0, 0), 0.0);
    }

    #[test]
    fn test_tempo_is_clamped() {
        assert_eq!(ScrollController::new(MAX, 10).tempo(), MIN_TEMPO);
        assert_eq!(ScrollController::new(MAX, 400).tempo(), MAX_TEMPO);
    }

    #[test]
    fn test_nothing_to_scroll_when_content_fits() {
        let mut c = ScrollController::new(0.0, 60);
        assert_eq!(c.start(0.0, 0.0, 0.0), StartOutcome::NothingToScroll);
        assert!(!c.is_running());
        assert_eq!(c.toggle(0.0), ToggleOutcome::NothingToScroll);
    }

    #[test]
    fn test_offset_advances_linearly() {
        let mut c = ScrollController::new(MAX, 60); // 12 s
        let h = scheduled(c.start(0.0, 0.0, 1_000.0));

        let (offset, _) = scrolled(c.frame(h, 4_000.0));
        assert!((offset - 150.0).abs() < 1e-9);
        assert!((c.progress() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_completion_resets_and_resume_starts_from_top() {
        let mut c = ScrollController::new(MAX, 60);
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        let (_, h) = scrolled(c.frame(h, 6_000.0));

        assert_eq!(c.frame(h, 12_500.0), FrameOutcome::Finished);
        assert_eq!(c.offset(), 0.0);
        assert!(!c.is_running());
        assert_eq!(c.elapsed_at_pause(), 0.0);

        let h = match c.toggle(20_000.0) {
            ToggleOutcome::Resumed(h) => h,
            other => panic!("expected resume, got {:?}", other),
        };
        let (offset, _) = scrolled(c.frame(h, 20_000.0));
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_pause_at_forty_percent_resumes_from_forty_percent() {
        let mut c = ScrollController::new(MAX, 60); // 12 s
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        scrolled(c.frame(h, 4_800.0));
        assert!((c.progress() - 0.4).abs() < 1e-9);

        assert_eq!(c.toggle(4_800.0), ToggleOutcome::Paused);
        assert!(!c.is_running());

        // A long wait while paused changes nothing
        let h = match c.toggle(60_000.0) {
            ToggleOutcome::Resumed(h) => h,
            other => panic!("expected resume, got {:?}", other),
        };
        let (offset, h) = scrolled(c.frame(h, 60_000.0));
        assert!((offset / MAX - 0.4).abs() < 1e-9);

        // and keeps the original pace afterwards
        let (offset, _) = scrolled(c.frame(h, 61_200.0));
        assert!((offset / MAX - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_preserves_fraction() {
        for (t1, t2) in [(60, 120), (120, 30), (30, 150), (90, 90)] {
            let mut c = ScrollController::new(MAX, t1);
            let h = scheduled(c.start(0.0, 0.0, 0.0));
            let duration = total_duration_ms(MAX, t1);
            scrolled(c.frame(h, duration * 0.37));
            let before = c.progress();

            let h = scheduled(c.set_tempo(t2, duration * 0.37).unwrap());
            let (offset, _) = scrolled(c.frame(h, duration * 0.37));
            assert!(
                (offset / MAX - before).abs() < 1e-9,
                "tempo {} -> {} moved the viewport",
                t1,
                t2
            );
            assert_eq!(c.tempo(), t2);
        }
    }

    #[test]
    fn test_tempo_change_speeds_up_remaining_scroll() {
        let mut c = ScrollController::new(MAX, 60); // 12 s
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        scrolled(c.frame(h, 6_000.0)); // 50%

        let h = scheduled(c.set_tempo(120, 6_000.0).unwrap()); // 6 s total
        let (offset, _) = scrolled(c.frame(h, 7_500.0));
        assert!((offset / MAX - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_restart_invalidates_old_frame() {
        let mut c = ScrollController::new(MAX, 60);
        let old = scheduled(c.start(0.0, 0.0, 0.0));
        let new = scheduled(c.set_tempo(90, 100.0).unwrap());
        assert_ne!(old, new);
        assert_eq!(c.frame(old, 200.0), FrameOutcome::Stale);
        scrolled(c.frame(new, 200.0));
    }

    #[test]
    fn test_tempo_change_while_paused_keeps_position() {
        let mut c = ScrollController::new(MAX, 60);
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        scrolled(c.frame(h, 3_000.0)); // 25%
        c.pause(3_000.0);

        assert_eq!(c.set_tempo(120, 5_000.0), None);
        let h = scheduled(c.resume(10_000.0));
        let (offset, _) = scrolled(c.frame(h, 10_000.0));
        assert!((offset / MAX - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_is_idempotent_and_frames_go_stale() {
        let mut c = ScrollController::new(MAX, 60);
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        c.cancel();
        c.cancel();
        assert_eq!(c.frame(h, 100.0), FrameOutcome::Stale);
    }

    #[test]
    fn test_teardown_resets_state() {
        let mut c = ScrollController::new(MAX, 60);
        let h = scheduled(c.start(0.0, 0.0, 0.0));
        scrolled(c.frame(h, 3_000.0));
        c.teardown();
        c.teardown();

        assert!(!c.is_running());
        assert_eq!(c.offset(), 0.0);
        assert_eq!(c.frame(h, 4_000.0), FrameOutcome::Stale);
    }
}
