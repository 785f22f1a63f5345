use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const FPS_WINDOW: usize = 10;

/// Caps the frame rate and keeps recent frame times for the FPS readout.
#[derive(Debug)]
pub struct FrameClock {
    min_frame_time: Option<Duration>,
    last_tick: Instant,
    frame_times: VecDeque<Duration>,
}

impl FrameClock {
    pub fn new(max_fps: Option<u32>) -> Self {
        Self {
            min_frame_time: max_fps
                .filter(|&fps| fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            last_tick: Instant::now(),
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Sleeps out the rest of the frame budget, then returns the frame time.
    pub fn tick(&mut self) -> Duration {
        let mut elapsed = self.last_tick.elapsed();
        if let Some(min) = self.min_frame_time {
            if elapsed < min {
                std::thread::sleep(min - elapsed);
                elapsed = self.last_tick.elapsed();
            }
        }
        self.last_tick = Instant::now();
        self.record(elapsed);
        elapsed
    }

    fn record(&mut self, frame_time: Duration) {
        if self.frame_times.len() == FPS_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
    }

    pub fn fps(&self) -> f32 {
        let total: Duration = self.frame_times.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        self.frame_times.len() as f32 / total.as_secs_f32()
    }
}

/// Shader time. Freezes while paused.
#[derive(Debug)]
pub struct Timeline {
    start: Instant,
    paused_at: Option<Instant>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            paused_at: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        self.paused_at
            .unwrap_or(now)
            .saturating_duration_since(self.start)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    fn pause_at(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    fn resume_at(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.start += now.saturating_duration_since(paused_at);
        }
    }

    /// Returns `true` when the timeline is now paused.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
        self.is_paused()
    }

    /// Rewinds to zero, keeping the paused state.
    pub fn restart(&mut self) {
        self.restart_at(Instant::now());
    }

    fn restart_at(&mut self, now: Instant) {
        self.start = now;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fps_is_zero_before_first_frame() {
        let clock = FrameClock::new(None);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn fps_averages_last_frames() {
        let mut clock = FrameClock::new(None);
        for _ in 0..5 {
            clock.record(100 * MS);
        }
        for _ in 0..FPS_WINDOW {
            clock.record(20 * MS);
        }
        assert_eq!(clock.frame_times.len(), FPS_WINDOW);
        assert!((clock.fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn cap_limits_tick_rate() {
        let mut clock = FrameClock::new(Some(100));
        clock.tick();
        let frame_time = clock.tick();
        assert!(frame_time >= 10 * MS);
    }

    #[test]
    fn zero_cap_is_uncapped() {
        assert!(FrameClock::new(Some(0)).min_frame_time.is_none());
    }

    #[test]
    fn pause_freezes_time() {
        let t0 = Instant::now();
        let mut timeline = Timeline::starting_at(t0);
        assert_eq!(timeline.elapsed_at(t0 + 100 * MS), 100 * MS);

        timeline.pause_at(t0 + 100 * MS);
        assert_eq!(timeline.elapsed_at(t0 + 500 * MS), 100 * MS);

        timeline.resume_at(t0 + 500 * MS);
        assert_eq!(timeline.elapsed_at(t0 + 600 * MS), 200 * MS);
    }

    #[test]
    fn restart_rewinds() {
        let t0 = Instant::now();
        let mut timeline = Timeline::starting_at(t0);
        timeline.restart_at(t0 + 300 * MS);
        assert_eq!(timeline.elapsed_at(t0 + 300 * MS), Duration::ZERO);
        assert_eq!(timeline.elapsed_at(t0 + 350 * MS), 50 * MS);

        timeline.pause_at(t0 + 400 * MS);
        timeline.restart_at(t0 + 450 * MS);
        assert!(timeline.is_paused());
        assert_eq!(timeline.elapsed_at(t0 + 900 * MS), Duration::ZERO);
    }

    #[test]
    fn toggle_reports_state() {
        let mut timeline = Timeline::new();
        assert!(timeline.toggle_pause());
        assert!(!timeline.toggle_pause());
    }
}
