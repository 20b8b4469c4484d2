use crate::speedtest::TestMode;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "speedsim", version)]
#[command(about = "A terminal dashboard for a simulated internet speed test")]
pub struct Settings {
    /// Preset used for the first test
    #[arg(long, value_enum, default_value_t = TestMode::Basic)]
    pub mode: TestMode,

    /// Seed for the random source, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write logs to this file (the terminal is taken by the dashboard)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: TestMode::Basic,
            seed: None,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["speedsim"]).unwrap();
        assert_eq!(settings.mode, TestMode::Basic);
        assert_eq!(settings.seed, None);
        assert!(settings.log_file.is_none());
    }

    #[test]
    fn test_parse_mode_and_seed() {
        let settings =
            Settings::try_parse_from(["speedsim", "--mode", "advanced", "--seed", "12"]).unwrap();
        assert_eq!(settings.mode, TestMode::Advanced);
        assert_eq!(settings.seed, Some(12));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Settings::try_parse_from(["speedsim", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let settings = Settings {
            seed: Some(8),
            ..Settings::default()
        };
        let a: u64 = settings.rng().gen();
        let b: u64 = settings.rng().gen();
        assert_eq!(a, b);
    }
}
