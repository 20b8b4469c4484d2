use super::{StageKind, TestMode};
use futures::stream::{self, Stream};
use rand::Rng;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Cadence at which a speed stage emits progress samples.
pub const TICK: Duration = Duration::from_millis(50);

/// Fluctuation amplitude as a fraction of the target speed.
const FLUCTUATION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub step: u32,
    pub ratio: f64,
    /// Animated speed in Mbps. Only download samples carry one.
    pub speed_mbps: Option<f64>,
}

/// One timed download or upload stage with its target speed already drawn.
#[derive(Debug, Clone, Copy)]
pub struct SpeedStage {
    kind: StageKind,
    duration: Duration,
    max_speed: f64,
    steps: u32,
}

impl SpeedStage {
    /// Returns `None` for stages the mode never runs (basic upload).
    pub fn new<R: Rng + ?Sized>(mode: TestMode, kind: StageKind, rng: &mut R) -> Option<Self> {
        let duration = mode.stage_duration(kind)?;
        let range = mode.speed_range(kind)?;
        Some(Self::with_target(kind, duration, rng.gen_range(range)))
    }

    pub fn with_target(kind: StageKind, duration: Duration, max_speed: f64) -> Self {
        let steps = (duration.as_millis() / TICK.as_millis()).max(1) as u32;
        Self {
            kind,
            duration,
            max_speed,
            steps,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// The authoritative stage result, regardless of what was animated.
    pub fn result_mbps(&self) -> u32 {
        self.max_speed.floor() as u32
    }

    pub fn sample(&self, step: u32) -> ProgressSample {
        let ratio = if step >= self.steps {
            1.0
        } else {
            step as f64 / self.steps as f64
        };

        let speed_mbps = match self.kind {
            StageKind::Download => Some(animated_speed(self.max_speed, ratio, step)),
            StageKind::Upload | StageKind::Ping => None,
        };

        ProgressSample {
            step,
            ratio,
            speed_mbps,
        }
    }

    /// Lazily yields one sample per tick. The ticker is dropped with the
    /// stream once the last step has been emitted.
    pub fn samples(self) -> impl Stream<Item = ProgressSample> {
        let ticker = time::interval_at(Instant::now() + TICK, TICK);

        stream::unfold((ticker, 0u32), move |(mut ticker, step)| async move {
            if step >= self.steps {
                return None;
            }
            ticker.tick().await;
            let step = step + 1;
            Some((self.sample(step), (ticker, step)))
        })
    }
}

pub fn ease_out_cubic(x: f64) -> f64 {
    1.0 - (1.0 - x).powi(3)
}

fn animated_speed(max_speed: f64, ratio: f64, step: u32) -> f64 {
    let current = (ease_out_cubic(ratio) * max_speed).floor();
    let fluctuation = max_speed * FLUCTUATION * (step as f64 * 0.5).sin();
    (current + fluctuation).max(0.0).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.5), 0.875);
    }

    #[test]
    fn test_basic_upload_is_never_built() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(SpeedStage::new(TestMode::Basic, StageKind::Upload, &mut rng).is_none());
    }

    #[test]
    fn test_result_ignores_last_fluctuation() {
        let stage = SpeedStage::with_target(StageKind::Download, Duration::from_millis(4000), 500.7);
        let last = stage.sample(stage.steps());

        assert_eq!(stage.result_mbps(), 500);
        assert_eq!(last.ratio, 1.0);
        assert_eq!(last.speed_mbps, Some(537.0));
    }

    #[test]
    fn test_speed_never_negative() {
        let stage = SpeedStage::with_target(StageKind::Download, Duration::from_millis(2500), 30.0);
        for step in 1..=stage.steps() {
            assert!(stage.sample(step).speed_mbps.unwrap() >= 0.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_advanced_download_emits_eighty_samples() {
        let mut rng = StdRng::seed_from_u64(42);
        let stage = SpeedStage::new(TestMode::Advanced, StageKind::Download, &mut rng).unwrap();
        assert!((100.0..1000.0).contains(&stage.max_speed()));
        assert_eq!(stage.duration(), Duration::from_millis(4000));

        let start = Instant::now();
        let mut last_at = start;
        let samples: Vec<ProgressSample> = stage
            .samples()
            .inspect(|_| {
                let now = Instant::now();
                assert_eq!(now - last_at, TICK);
                last_at = now;
            })
            .collect()
            .await;

        assert_eq!(samples.len(), 80);
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
        assert!(samples.windows(2).all(|w| w[0].ratio <= w[1].ratio));
        assert_eq!(samples.last().unwrap().ratio, 1.0);
        assert!(samples.iter().all(|s| s.speed_mbps.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detailed_upload_has_no_live_speed() {
        let mut rng = StdRng::seed_from_u64(9);
        let stage = SpeedStage::new(TestMode::Detailed, StageKind::Upload, &mut rng).unwrap();
        assert!((10.0..90.0).contains(&stage.max_speed()));

        let start = Instant::now();
        let samples: Vec<ProgressSample> = stage.samples().collect().await;

        assert_eq!(start.elapsed(), Duration::from_millis(2500));
        assert_eq!(samples.len(), 50);
        assert!(samples.iter().all(|s| s.speed_mbps.is_none()));
        assert_eq!(samples.last().unwrap().ratio, 1.0);
    }
}
