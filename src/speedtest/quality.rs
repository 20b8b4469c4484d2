//! Percentage gauges shown in the detailed report.

pub fn download_quality(mbps: u32) -> f64 {
    (mbps as f64 / 10.0).min(100.0)
}

pub fn upload_quality(mbps: u32) -> f64 {
    (mbps as f64 / 5.0).min(100.0)
}

pub fn stability(ping_ms: u32, jitter_ms: u32) -> f64 {
    (100.0 - ping_ms as f64 / 2.0 - jitter_ms as f64 * 2.0).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTier {
    Poor,
    Fair,
    Good,
    Fast,
}

impl SpeedTier {
    pub fn of(mbps: f64) -> Self {
        if mbps < 20.0 {
            SpeedTier::Poor
        } else if mbps < 50.0 {
            SpeedTier::Fair
        } else if mbps < 100.0 {
            SpeedTier::Good
        } else {
            SpeedTier::Fast
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_caps_at_hundred() {
        assert_eq!(download_quality(250), 25.0);
        assert_eq!(download_quality(1500), 100.0);
        assert_eq!(upload_quality(40), 8.0);
        assert_eq!(upload_quality(900), 100.0);
    }

    #[test]
    fn test_stability_floor() {
        assert_eq!(stability(20, 3), 84.0);
        assert_eq!(stability(84, 40), 0.0);
    }

    #[test]
    fn test_speed_tiers() {
        assert_eq!(SpeedTier::of(0.0), SpeedTier::Poor);
        assert_eq!(SpeedTier::of(20.0), SpeedTier::Fair);
        assert_eq!(SpeedTier::of(99.9), SpeedTier::Good);
        assert_eq!(SpeedTier::of(100.0), SpeedTier::Fast);
    }
}
