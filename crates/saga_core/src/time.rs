use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;

/// Frame clock driven by the game loop and, while a cutscene plays, by the
/// cutscene loop.
pub trait Clock {
    /// Advance one frame and return the delta since the previous tick.
    fn tick(&mut self) -> Duration;

    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;
}

/// Wall-clock implementation of [`Clock`] that caps the frame rate by
/// sleeping out whatever is left of the frame budget.
pub struct FrameClock {
    pub target_fps: u32,
    pub max_delta: Duration,
    pub real_dt: Duration,
    pub frame_count: u64,
    started: Instant,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    /// A `target_fps` of zero disables the cap.
    pub fn new(target_fps: u32) -> Self {
        let now = Instant::now();
        let nominal_dt = if target_fps > 0 {
            1.0 / f64::from(target_fps)
        } else {
            1.0 / 60.0
        };
        Self {
            target_fps,
            max_delta: Duration::from_millis(250),
            real_dt: Duration::ZERO,
            frame_count: 0,
            started: now,
            last_instant: now,
            fps_samples: [nominal_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / nominal_dt,
            smoothed_frame_time_ms: nominal_dt * 1000.0,
        }
    }

    fn frame_budget(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.target_fps)))
    }

    fn record_sample(&mut self, dt: Duration) {
        self.fps_samples[self.fps_sample_index] = dt.as_secs_f64();
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

impl Clock for FrameClock {
    fn tick(&mut self) -> Duration {
        if let Some(budget) = self.frame_budget() {
            let spent = self.last_instant.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }

        let now = Instant::now();
        let mut dt = now.duration_since(self.last_instant);
        self.last_instant = now;

        // Spiral-of-death cap. Also absorbs the gap left by a blocking cutscene.
        if dt > self.max_delta {
            log::warn!(
                "Frame took {:.1}ms, capping delta to {}ms",
                dt.as_secs_f64() * 1000.0,
                self.max_delta.as_millis()
            );
            dt = self.max_delta;
        }

        self.real_dt = dt;
        self.frame_count += 1;
        self.record_sample(dt);
        dt
    }

    fn now(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_waits_out_the_frame_budget() {
        let mut clock = FrameClock::new(200);
        let dt = clock.tick();
        assert!(dt >= Duration::from_millis(4));
        assert_eq!(clock.frame_count, 1);
    }

    #[test]
    fn tick_clamps_long_frames() {
        let mut clock = FrameClock::new(100);
        clock.max_delta = Duration::from_millis(1);
        let dt = clock.tick();
        assert_eq!(dt, Duration::from_millis(1));
        assert_eq!(clock.real_dt, Duration::from_millis(1));
    }

    #[test]
    fn now_is_monotonic() {
        let mut clock = FrameClock::new(500);
        let before = clock.now();
        clock.tick();
        assert!(clock.now() > before);
    }

    #[test]
    fn smoothed_fps_starts_at_target() {
        let clock = FrameClock::new(30);
        assert!((clock.smoothed_fps - 30.0).abs() < 0.001);
        assert!((clock.smoothed_frame_time_ms - 33.333).abs() < 0.01);
    }

    #[test]
    fn zero_target_disables_cap() {
        let clock = FrameClock::new(0);
        assert!(clock.frame_budget().is_none());
    }
}
