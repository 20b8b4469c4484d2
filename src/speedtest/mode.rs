use super::StageKind;
use clap::ValueEnum;
use std::fmt;
use std::ops::Range;
use std::time::Duration;

/// Preset controlling stage timing, value ranges and whether upload runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TestMode {
    #[default]
    Basic,
    Detailed,
    Advanced,
}

impl TestMode {
    pub const ALL: [TestMode; 3] = [TestMode::Basic, TestMode::Detailed, TestMode::Advanced];

    pub fn next(self) -> Self {
        match self {
            TestMode::Basic => TestMode::Detailed,
            TestMode::Detailed => TestMode::Advanced,
            TestMode::Advanced => TestMode::Basic,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            TestMode::Basic => TestMode::Advanced,
            TestMode::Detailed => TestMode::Basic,
            TestMode::Advanced => TestMode::Detailed,
        }
    }

    pub fn runs_upload(self) -> bool {
        self != TestMode::Basic
    }

    pub fn ping_delay(self) -> Duration {
        match self {
            TestMode::Advanced => Duration::from_millis(1000),
            _ => Duration::from_millis(1500),
        }
    }

    pub fn ping_range(self) -> Range<u32> {
        match self {
            TestMode::Advanced => 5..35,
            TestMode::Detailed => 10..60,
            TestMode::Basic => 15..85,
        }
    }

    /// Duration of a speed stage, or `None` when the mode never runs it.
    pub fn stage_duration(self, kind: StageKind) -> Option<Duration> {
        let ms = match (kind, self) {
            (StageKind::Download, TestMode::Advanced) => 4000,
            (StageKind::Download, TestMode::Detailed) => 3000,
            (StageKind::Download, TestMode::Basic) => 2500,
            (StageKind::Upload, TestMode::Advanced) => 3500,
            (StageKind::Upload, TestMode::Detailed) => 2500,
            (StageKind::Upload, TestMode::Basic) | (StageKind::Ping, _) => return None,
        };
        Some(Duration::from_millis(ms))
    }

    /// Range the stage's target maximum speed (Mbps) is drawn from.
    pub fn speed_range(self, kind: StageKind) -> Option<Range<f64>> {
        match (kind, self) {
            (StageKind::Download, TestMode::Advanced) => Some(100.0..1000.0),
            (StageKind::Download, TestMode::Detailed) => Some(50.0..750.0),
            (StageKind::Download, TestMode::Basic) => Some(30.0..530.0),
            (StageKind::Upload, TestMode::Advanced) => Some(20.0..120.0),
            (StageKind::Upload, TestMode::Detailed) => Some(10.0..90.0),
            (StageKind::Upload, TestMode::Basic) | (StageKind::Ping, _) => None,
        }
    }

    pub fn stages(self) -> &'static [StageKind] {
        if self.runs_upload() {
            &[StageKind::Ping, StageKind::Download, StageKind::Upload]
        } else {
            &[StageKind::Ping, StageKind::Download]
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestMode::Basic => "basic",
            TestMode::Detailed => "detailed",
            TestMode::Advanced => "advanced",
        };
        f.write_str(name)
    }
}
