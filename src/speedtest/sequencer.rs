use super::catalog::pick_server;
use super::ping::{PingResult, PingTest};
use super::stage::SpeedStage;
use super::{SpeedTestResult, StageKind, TestMode, UploadSpeed};
use futures::{pin_mut, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageOutcome {
    Ping(PingResult),
    Download(u32),
    Upload(u32),
}

impl StageOutcome {
    pub fn kind(&self) -> StageKind {
        match self {
            StageOutcome::Ping(_) => StageKind::Ping,
            StageOutcome::Download(_) => StageKind::Download,
            StageOutcome::Upload(_) => StageKind::Upload,
        }
    }
}

/// Notifications sent to the presentation layer while a sequence runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    StageProgress {
        kind: StageKind,
        ratio: f64,
        speed_mbps: Option<f64>,
    },
    StageComplete(StageOutcome),
    SequenceComplete { server: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running { mode: TestMode, stage_index: usize },
}

/// Owns the selected mode and the single in-flight sequence, if any.
pub struct Sequencer {
    mode: TestMode,
    state: SequencerState,
}

impl Sequencer {
    pub fn new(mode: TestMode) -> Self {
        Self {
            mode,
            state: SequencerState::Idle,
        }
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SequencerState::Running { .. })
    }

    /// Takes effect on the next sequence; a running one keeps its mode.
    pub fn set_mode(&mut self, mode: TestMode) {
        self.mode = mode;
    }

    /// The stage currently in flight.
    pub fn current_stage(&self) -> Option<StageKind> {
        match self.state {
            SequencerState::Running { mode, stage_index } => mode.stages().get(stage_index).copied(),
            SequencerState::Idle => None,
        }
    }

    /// Spawns a sequence for the current mode. Returns `None` without side
    /// effects when one is already running.
    pub fn start<R>(
        &mut self,
        rng: R,
        events: mpsc::Sender<SequenceEvent>,
    ) -> Option<JoinHandle<SpeedTestResult>>
    where
        R: Rng + Send + 'static,
    {
        if self.is_running() {
            debug!(state = ?self.state, "sequence already running, ignoring start");
            return None;
        }

        let mode = self.mode;
        self.state = SequencerState::Running {
            mode,
            stage_index: 0,
        };

        Some(tokio::spawn(async move {
            let mut rng = rng;
            run_sequence(mode, &mut rng, &events).await
        }))
    }

    /// Advances the state machine from an event produced by the running task.
    pub fn observe(&mut self, event: &SequenceEvent) {
        match event {
            SequenceEvent::StageComplete(outcome) => {
                debug!(stage = %outcome.kind(), "stage finished");
                if let SequencerState::Running { stage_index, .. } = &mut self.state {
                    *stage_index += 1;
                }
            }
            SequenceEvent::SequenceComplete { .. } => self.finish(),
            SequenceEvent::StageProgress { .. } => {}
        }
    }

    pub fn finish(&mut self) {
        self.state = SequencerState::Idle;
    }
}

/// Runs ping, download and (outside basic mode) upload strictly in order.
pub async fn run_sequence<R: Rng + ?Sized>(
    mode: TestMode,
    rng: &mut R,
    events: &mpsc::Sender<SequenceEvent>,
) -> SpeedTestResult {
    info!(%mode, "starting sequence");
    let mut result = SpeedTestResult::default();

    let ping = PingTest::new(mode).run(rng).await;
    info!(ping_ms = ping.ping_ms, jitter_ms = ping.jitter_ms, loss = ping.packet_loss_pct, "ping complete");
    result.ping_ms = Some(ping.ping_ms);
    result.jitter_ms = Some(ping.jitter_ms);
    result.packet_loss_pct = Some(ping.packet_loss_pct);
    let _ = events.send(SequenceEvent::StageComplete(StageOutcome::Ping(ping))).await;

    if let Some(stage) = SpeedStage::new(mode, StageKind::Download, rng) {
        let mbps = run_speed_stage(stage, events).await;
        result.download_mbps = Some(mbps);
        let _ = events.send(SequenceEvent::StageComplete(StageOutcome::Download(mbps))).await;
    }

    result.upload = match SpeedStage::new(mode, StageKind::Upload, rng) {
        Some(stage) => {
            let mbps = run_speed_stage(stage, events).await;
            let _ = events.send(SequenceEvent::StageComplete(StageOutcome::Upload(mbps))).await;
            Some(UploadSpeed::Measured(mbps))
        }
        None => Some(UploadSpeed::NotApplicable),
    };

    let server = pick_server(rng);
    result.server = Some(server);
    info!(server, "sequence complete");
    let _ = events.send(SequenceEvent::SequenceComplete { server }).await;

    result
}

async fn run_speed_stage(stage: SpeedStage, events: &mpsc::Sender<SequenceEvent>) -> u32 {
    let kind = stage.kind();
    debug!(
        %kind,
        steps = stage.steps(),
        duration_ms = stage.duration().as_millis() as u64,
        target = stage.max_speed(),
        "stage started"
    );

    let samples = stage.samples();
    pin_mut!(samples);

    while let Some(sample) = samples.next().await {
        trace!(%kind, step = sample.step, ratio = sample.ratio, "progress");
        let _ = events
            .send(SequenceEvent::StageProgress {
                kind,
                ratio: sample.ratio,
                speed_mbps: sample.speed_mbps,
            })
            .await;
    }

    let mbps = stage.result_mbps();
    info!(%kind, mbps, "stage complete");
    mbps
}
