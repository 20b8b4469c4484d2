use crate::settings::Settings;
use crate::speedtest::{
    catalog::ConnectionInfo,
    sequencer::{SequenceEvent, Sequencer, StageOutcome},
    SpeedTestResult, StageKind, TestMode, TestPhase, UploadSpeed,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_SAMPLES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Main,
    ModePicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Download,
    Upload,
    Ping,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Panel::Download => Panel::Upload,
            Panel::Upload => Panel::Ping,
            Panel::Ping => Panel::Download,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Panel::Download => Panel::Ping,
            Panel::Upload => Panel::Download,
            Panel::Ping => Panel::Upload,
        }
    }
}

pub struct App {
    pub phase: TestPhase,
    pub result: SpeedTestResult,
    pub should_quit: bool,

    // UI state
    pub view: AppView,
    pub selected_panel: Panel,
    pub expanded: bool,

    // Mode picker cursor
    pub picker_mode: TestMode,

    pub sequencer: Sequencer,
    pub connection: ConnectionInfo,

    // Progress tracking
    pub download_progress: f64,
    pub upload_progress: f64,

    // Animated download speeds for the chart
    pub download_samples: Vec<f64>,

    rng: StdRng,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        let mut rng = settings.rng();
        let connection = ConnectionInfo::generate(&mut rng);

        Self {
            phase: TestPhase::Idle,
            result: SpeedTestResult::default(),
            should_quit: false,
            view: AppView::Main,
            selected_panel: Panel::Download,
            expanded: false,
            picker_mode: settings.mode,
            sequencer: Sequencer::new(settings.mode),
            connection,
            download_progress: 0.0,
            upload_progress: 0.0,
            download_samples: Vec::new(),
            rng,
        }
    }

    pub fn mode(&self) -> TestMode {
        self.sequencer.mode()
    }

    pub fn is_testing(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn status_text(&self) -> String {
        match self.phase {
            TestPhase::Idle => format!("Ready for {} analysis", self.mode()),
            TestPhase::Ping => "Testing ping...".to_string(),
            TestPhase::Download => "Testing download speed...".to_string(),
            TestPhase::Upload => "Testing upload speed...".to_string(),
            TestPhase::Complete => "Analysis complete".to_string(),
        }
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.view {
            AppView::Main => self.handle_main_key(key),
            AppView::ModePicker => self.handle_picker_key(key),
        }
    }

    fn handle_main_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Char('m') => {
                if !self.is_testing() {
                    self.picker_mode = self.mode();
                    self.view = AppView::ModePicker;
                }
                None
            }
            KeyCode::Char(c @ '1'..='3') => {
                let idx = c as usize - '1' as usize;
                self.change_mode(TestMode::ALL[idx]);
                None
            }
            KeyCode::Enter => {
                if self.expanded {
                    self.expanded = false;
                    None
                } else {
                    Some(AppAction::StartTest)
                }
            }
            KeyCode::Esc => {
                self.expanded = false;
                None
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('j') => {
                if !self.expanded {
                    self.selected_panel = self.selected_panel.next();
                }
                None
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('k') => {
                if !self.expanded {
                    self.selected_panel = self.selected_panel.prev();
                }
                None
            }
            KeyCode::Char(' ') => {
                self.expanded = !self.expanded;
                None
            }
            _ => None,
        }
    }

    fn handle_picker_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.view = AppView::Main;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker_mode = self.picker_mode.prev();
                None
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.picker_mode = self.picker_mode.next();
                None
            }
            KeyCode::Enter => {
                self.change_mode(self.picker_mode);
                self.view = AppView::Main;
                None
            }
            _ => None,
        }
    }

    /// Mode changes are only accepted between tests.
    fn change_mode(&mut self, mode: TestMode) {
        if self.is_testing() {
            return;
        }
        self.sequencer.set_mode(mode);
        if self.phase == TestPhase::Complete {
            self.reset_for_new_test();
        }
    }

    pub fn reset_for_new_test(&mut self) {
        self.phase = TestPhase::Idle;
        self.result = SpeedTestResult::default();
        self.download_progress = 0.0;
        self.upload_progress = 0.0;
        self.download_samples.clear();
        self.expanded = false;
    }

    /// Starts a sequence unless one is already in flight.
    pub fn start_test(
        &mut self,
        events: mpsc::Sender<SequenceEvent>,
    ) -> Option<JoinHandle<SpeedTestResult>> {
        if self.is_testing() {
            return None;
        }

        let rng = StdRng::seed_from_u64(self.rng.gen());
        let handle = self.sequencer.start(rng, events)?;
        self.reset_for_new_test();
        self.phase = TestPhase::Ping;
        Some(handle)
    }

    pub fn apply_event(&mut self, event: SequenceEvent) {
        self.sequencer.observe(&event);

        match event {
            SequenceEvent::StageProgress {
                kind: StageKind::Download,
                ratio,
                speed_mbps,
            } => {
                self.download_progress = ratio;
                if let Some(speed) = speed_mbps {
                    self.download_samples.push(speed);
                    if self.download_samples.len() > MAX_SAMPLES {
                        self.download_samples.remove(0);
                    }
                }
            }
            SequenceEvent::StageProgress {
                kind: StageKind::Upload,
                ratio,
                ..
            } => {
                self.upload_progress = ratio;
            }
            SequenceEvent::StageProgress { .. } => {}
            SequenceEvent::StageComplete(StageOutcome::Ping(ping)) => {
                self.result.ping_ms = Some(ping.ping_ms);
                self.result.jitter_ms = Some(ping.jitter_ms);
                self.result.packet_loss_pct = Some(ping.packet_loss_pct);
                self.phase = TestPhase::Download;
            }
            SequenceEvent::StageComplete(StageOutcome::Download(mbps)) => {
                self.result.download_mbps = Some(mbps);
                self.download_progress = 1.0;
                if self.sequencer.current_stage() == Some(StageKind::Upload) {
                    self.phase = TestPhase::Upload;
                } else {
                    self.result.upload = Some(UploadSpeed::NotApplicable);
                }
            }
            SequenceEvent::StageComplete(StageOutcome::Upload(mbps)) => {
                self.result.upload = Some(UploadSpeed::Measured(mbps));
                self.upload_progress = 1.0;
            }
            SequenceEvent::SequenceComplete { server } => {
                self.result.server = Some(server);
                self.complete_test();
            }
        }
    }

    pub fn complete_test(&mut self) {
        self.sequencer.finish();
        self.phase = TestPhase::Complete;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AppAction {
    Quit,
    StartTest,
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::ping::PingResult;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn app(mode: TestMode) -> App {
        App::new(&Settings {
            mode,
            seed: Some(1),
            log_file: None,
        })
    }

    fn press(app: &mut App, code: KeyCode) -> Option<AppAction> {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ping_done() -> SequenceEvent {
        SequenceEvent::StageComplete(StageOutcome::Ping(PingResult {
            ping_ms: 20,
            jitter_ms: 3,
            packet_loss_pct: 0.1,
        }))
    }

    #[test]
    fn test_status_names_mode() {
        assert_eq!(app(TestMode::Detailed).status_text(), "Ready for detailed analysis");
    }

    #[test]
    fn test_panel_cycling() {
        let mut app = app(TestMode::Basic);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selected_panel, Panel::Upload);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.selected_panel, Panel::Ping);
    }

    #[test]
    fn test_mode_picker_changes_mode() {
        let mut app = app(TestMode::Basic);
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.view, AppView::ModePicker);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, AppView::Main);
        assert_eq!(app.mode(), TestMode::Advanced);

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.mode(), TestMode::Detailed);
    }

    #[test]
    fn test_enter_requests_start() {
        let mut app = app(TestMode::Basic);
        assert!(matches!(press(&mut app, KeyCode::Enter), Some(AppAction::StartTest)));
        assert!(matches!(press(&mut app, KeyCode::Char('q')), Some(AppAction::Quit)));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_ignored() {
        let mut app = app(TestMode::Basic);
        let (tx, mut rx) = mpsc::channel(512);

        let handle = app.start_test(tx.clone()).expect("first start");
        assert_eq!(app.phase, TestPhase::Ping);
        assert!(app.start_test(tx.clone()).is_none());

        // Neither the picker nor the number keys touch a running test.
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.mode(), TestMode::Basic);
        assert_eq!(app.view, AppView::Main);

        let result = handle.await.unwrap();
        while let Ok(event) = rx.try_recv() {
            app.apply_event(event);
        }

        assert_eq!(app.phase, TestPhase::Complete);
        assert!(!app.is_testing());
        assert_eq!(app.result, result);
        assert_eq!(app.download_samples.len(), 50);
        assert_eq!(app.download_progress, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_basic_download_marks_upload_not_applicable() {
        let mut app = app(TestMode::Basic);
        let (tx, _rx) = mpsc::channel(1);
        let _handle = app.start_test(tx).expect("start");

        app.apply_event(ping_done());
        assert_eq!(app.phase, TestPhase::Download);
        app.apply_event(SequenceEvent::StageComplete(StageOutcome::Download(120)));

        assert_eq!(app.result.download_mbps, Some(120));
        assert_eq!(app.result.upload, Some(UploadSpeed::NotApplicable));
        assert_eq!(app.phase, TestPhase::Download);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detailed_download_moves_to_upload() {
        let mut app = app(TestMode::Detailed);
        let (tx, _rx) = mpsc::channel(1);
        let _handle = app.start_test(tx).expect("start");

        app.apply_event(ping_done());
        app.apply_event(SequenceEvent::StageComplete(StageOutcome::Download(300)));
        assert_eq!(app.phase, TestPhase::Upload);
        assert_eq!(app.result.upload, None);

        app.apply_event(SequenceEvent::StageProgress {
            kind: StageKind::Upload,
            ratio: 0.5,
            speed_mbps: None,
        });
        assert_eq!(app.upload_progress, 0.5);

        app.apply_event(SequenceEvent::StageComplete(StageOutcome::Upload(40)));
        app.apply_event(SequenceEvent::SequenceComplete { server: "Tokyo, Japan" });
        assert_eq!(app.result.upload, Some(UploadSpeed::Measured(40)));
        assert_eq!(app.result.server, Some("Tokyo, Japan"));
        assert_eq!(app.phase, TestPhase::Complete);
        assert_eq!(app.status_text(), "Analysis complete");
    }
}
