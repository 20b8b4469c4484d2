pub mod catalog;
pub mod mode;
pub mod ping;
pub mod quality;
pub mod sequencer;
pub mod stage;

pub use mode::TestMode;

use std::fmt;

/// The three kinds of stage a sequence can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Ping,
    Download,
    Upload,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Ping => "ping",
            StageKind::Download => "download",
            StageKind::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// Upload outcome. Basic mode never runs the upload stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSpeed {
    Measured(u32),
    NotApplicable,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedTestResult {
    pub ping_ms: Option<u32>,
    pub jitter_ms: Option<u32>,
    pub packet_loss_pct: Option<f64>,
    pub download_mbps: Option<u32>,
    pub upload: Option<UploadSpeed>,
    pub server: Option<&'static str>,
}

impl SpeedTestResult {
    pub fn upload_mbps(&self) -> Option<u32> {
        match self.upload {
            Some(UploadSpeed::Measured(mbps)) => Some(mbps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Ping,
    Download,
    Upload,
    Complete,
}
