use super::TestMode;
use rand::Rng;

pub struct PingTest {
    mode: TestMode,
}

impl PingTest {
    pub fn new(mode: TestMode) -> Self {
        Self { mode }
    }

    /// Waits out the mode's simulated round trip, then draws the result.
    pub async fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> PingResult {
        tokio::time::sleep(self.mode.ping_delay()).await;
        self.sample(rng)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PingResult {
        let ping_ms = rng.gen_range(self.mode.ping_range());
        let jitter_ms = jitter_for(ping_ms, rng.gen::<f64>() * 5.0);
        let packet_loss_pct = packet_loss_for(ping_ms, rng.gen::<f64>());

        PingResult {
            ping_ms,
            jitter_ms,
            packet_loss_pct,
        }
    }
}

fn jitter_for(ping_ms: u32, noise: f64) -> u32 {
    ((ping_ms as f64 * 0.15 + noise).floor() as u32).max(1)
}

/// Loss grows with latency, capped at 2% and kept to one decimal.
fn packet_loss_for(ping_ms: u32, roll: f64) -> f64 {
    let loss = (ping_ms as f64 / 100.0 * roll).min(2.0);
    (loss * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingResult {
    pub ping_ms: u32,
    pub jitter_ms: u32,
    pub packet_loss_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    #[test]
    fn test_jitter_floor_is_one() {
        assert_eq!(jitter_for(5, 0.0), 1);
        assert_eq!(jitter_for(20, 0.9), 3);
        assert_eq!(jitter_for(84, 4.99), 17);
    }

    #[test]
    fn test_packet_loss_rounding() {
        assert_eq!(packet_loss_for(84, 0.0), 0.0);
        assert_eq!(packet_loss_for(50, 0.5), 0.3);
        assert_eq!(packet_loss_for(84, 0.999), 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advanced_waits_one_second() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = tokio::time::Instant::now();
        let result = PingTest::new(TestMode::Advanced).run(&mut rng).await;

        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert!((5..35).contains(&result.ping_ms));
    }

    #[tokio::test(start_paused = true)]
    async fn test_basic_waits_longer() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = tokio::time::Instant::now();
        let result = PingTest::new(TestMode::Basic).run(&mut rng).await;

        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        assert!((15..85).contains(&result.ping_ms));
    }

    proptest! {
        #[test]
        fn test_ping_within_mode_range(seed in any::<u64>(), mode_idx in 0usize..3) {
            let mode = TestMode::ALL[mode_idx];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = PingTest::new(mode).sample(&mut rng);

            prop_assert!(mode.ping_range().contains(&result.ping_ms));
            prop_assert!(result.jitter_ms >= 1);
            prop_assert!((0.0..=2.0).contains(&result.packet_loss_pct));
            let tenths = result.packet_loss_pct * 10.0;
            prop_assert!((tenths - tenths.round()).abs() < 1e-9);
        }
    }
}
