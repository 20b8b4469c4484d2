use crate::app::{App, AppView, Panel};
use crate::speedtest::quality::{self, SpeedTier};
use crate::speedtest::{StageKind, TestMode, TestPhase, UploadSpeed};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

// Color Palette - Elegant & Minimal
const ACCENT: Color = Color::Rgb(100, 149, 237);      // Cornflower blue
const SUCCESS: Color = Color::Rgb(134, 194, 156);     // Soft green
const SUCCESS_DIM: Color = Color::Rgb(80, 120, 90);
const INFO: Color = Color::Rgb(147, 180, 220);        // Soft blue
const INFO_DIM: Color = Color::Rgb(90, 110, 140);
const WARN: Color = Color::Rgb(220, 180, 130);        // Soft amber
const WARN_DIM: Color = Color::Rgb(130, 110, 80);
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BORDER_ACTIVE: Color = Color::Rgb(100, 100, 110);

// Speed tiers
const TIER_POOR: Color = Color::Rgb(239, 68, 68);
const TIER_FAIR: Color = Color::Rgb(245, 158, 11);
const TIER_GOOD: Color = Color::Rgb(16, 185, 129);

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.view {
        AppView::Main => {
            if app.expanded {
                draw_expanded_view(frame, area, app);
            } else {
                draw_normal_view(frame, area, app);
            }
        }
        AppView::ModePicker => {
            draw_mode_picker(frame, area, app);
        }
    }
}

fn draw_normal_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);

    let panels = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(chunks[1]);

    draw_download_panel(frame, panels[0], app, app.selected_panel == Panel::Download);
    draw_upload_panel(frame, panels[1], app, app.selected_panel == Panel::Upload);
    draw_ping_panel(frame, panels[2], app, app.selected_panel == Panel::Ping);

    draw_help(frame, chunks[2], app);
}

fn draw_expanded_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);

    let body = Layout::horizontal([Constraint::Min(30), Constraint::Length(36)]).split(chunks[1]);

    match app.selected_panel {
        Panel::Download => draw_download_expanded(frame, body[0], app),
        Panel::Upload => draw_upload_panel(frame, body[0], app, true),
        Panel::Ping => draw_ping_panel(frame, body[0], app, true),
    }
    draw_report(frame, body[1], app);

    draw_help(frame, chunks[2], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(22),
        Constraint::Min(10),
        Constraint::Length(20),
    ])
    .split(inner);

    // Title and mode
    let title = Line::from(vec![
        Span::styled("speedsim", Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", app.mode()), Style::default().fg(TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    // Status
    let color = match app.phase {
        TestPhase::Idle => TEXT_MUTED,
        TestPhase::Ping => WARN,
        TestPhase::Download => SUCCESS,
        TestPhase::Upload => INFO,
        TestPhase::Complete => ACCENT,
    };

    let status_text = Paragraph::new(app.status_text())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(status_text, chunks[1]);

    // Phase indicator
    let phase_text = create_phase_text(app.phase, app.mode());
    frame.render_widget(
        Paragraph::new(phase_text).alignment(Alignment::Right),
        chunks[2],
    );
}

fn create_phase_text(phase: TestPhase, mode: TestMode) -> Line<'static> {
    let stages = mode.stages();

    let mut spans = Vec::new();

    for (i, kind) in stages.iter().enumerate() {
        let (p, label) = match kind {
            StageKind::Ping => (TestPhase::Ping, "ping"),
            StageKind::Download => (TestPhase::Download, "down"),
            StageKind::Upload => (TestPhase::Upload, "up"),
        };

        let is_active = phase == p;
        let is_complete = match phase {
            TestPhase::Download => p == TestPhase::Ping,
            TestPhase::Upload => p == TestPhase::Ping || p == TestPhase::Download,
            TestPhase::Complete => true,
            _ => false,
        };

        let style = if is_active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else if is_complete {
            Style::default().fg(TEXT_SECONDARY)
        } else {
            Style::default().fg(TEXT_MUTED)
        };

        spans.push(Span::styled(label, style));

        if i < stages.len() - 1 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
    }

    Line::from(spans)
}

// Panels
fn draw_download_panel(frame: &mut Frame, area: Rect, app: &App, selected: bool) {
    let inner = panel_block(frame, area, "Download", SUCCESS, selected);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .split(inner);

    let speed = get_current_download_speed(app);
    frame.render_widget(
        Paragraph::new(format_speed(speed))
            .style(Style::default().fg(tier_color(speed)).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[0],
    );

    draw_progress_bar(frame, chunks[1], calculate_download_progress(app), SUCCESS, SUCCESS_DIM);

    if !app.download_samples.is_empty() {
        draw_sparkline(frame, chunks[2], &app.download_samples, SUCCESS);
    }
}

fn draw_upload_panel(frame: &mut Frame, area: Rect, app: &App, selected: bool) {
    let inner = panel_block(frame, area, "Upload", INFO, selected);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(inner);

    // Upload shows no live speed, only the final figure
    let value = match app.result.upload {
        Some(UploadSpeed::Measured(mbps)) => format_speed(mbps as f64),
        Some(UploadSpeed::NotApplicable) => "N/A".to_string(),
        None if app.phase == TestPhase::Upload => "measuring".to_string(),
        None => "—".to_string(),
    };
    frame.render_widget(
        Paragraph::new(value)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[0],
    );

    draw_progress_bar(frame, chunks[1], calculate_upload_progress(app), INFO, INFO_DIM);

    if !app.mode().runs_upload() {
        frame.render_widget(
            Paragraph::new("not tested in basic mode")
                .style(Style::default().fg(TEXT_MUTED))
                .alignment(Alignment::Center),
            chunks[2],
        );
    }
}

fn draw_ping_panel(frame: &mut Frame, area: Rect, app: &App, selected: bool) {
    let inner = panel_block(frame, area, "Latency", WARN, selected);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(inner);

    let value = match app.result.ping_ms {
        Some(ping) => format!("{} ms", ping),
        None => "—".to_string(),
    };

    frame.render_widget(
        Paragraph::new(value)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let jitter = match app.result.jitter_ms {
        Some(jitter) => format!("jitter {} ms", jitter),
        None => "jitter —".to_string(),
    };
    frame.render_widget(
        Paragraph::new(jitter)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        chunks[1],
    );

    let loss = match app.result.packet_loss_pct {
        Some(loss) => format!("loss {:.1}%", loss),
        None => "loss —".to_string(),
    };
    frame.render_widget(
        Paragraph::new(loss)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn panel_block(frame: &mut Frame, area: Rect, title: &str, color: Color, selected: bool) -> Rect {
    let border_color = if selected { BORDER_ACTIVE } else { BORDER };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(if selected { color } else { TEXT_SECONDARY }),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn draw_progress_bar(frame: &mut Frame, area: Rect, ratio: f64, color: Color, dim_color: Color) {
    if area.width < 4 {
        return;
    }

    let width = (area.width - 2) as usize;
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);

    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("━".repeat(filled), Style::default().fg(color)),
        Span::styled("━".repeat(empty), Style::default().fg(dim_color)),
        Span::raw(" "),
    ]);

    frame.render_widget(Paragraph::new(bar), area);
}

fn draw_sparkline(frame: &mut Frame, area: Rect, data: &[f64], color: Color) {
    if data.is_empty() || area.width < 4 || area.height < 2 {
        return;
    }

    let (min_val, max_val) = get_data_range(data);
    let range = (max_val - min_val).max(1.0);

    let points: Vec<(f64, f64)> = data
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .x_axis(Axis::default().bounds([0.0, data.len() as f64]))
        .y_axis(Axis::default().bounds([min_val - range * 0.1, max_val + range * 0.1]));

    frame.render_widget(chart, area);
}

// Expanded views
fn draw_download_expanded(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(" Download ", Style::default().fg(SUCCESS)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(4),
    ])
    .split(inner);

    // Stats line
    let speed = get_current_download_speed(app);
    let (avg, max, min) = get_stats(&app.download_samples);
    let stats = Line::from(vec![
        Span::styled(
            format_speed(speed),
            Style::default().fg(tier_color(speed)).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ·  ", Style::default().fg(TEXT_MUTED)),
        Span::styled(format!("avg {}", format_speed(avg)), Style::default().fg(TEXT_MUTED)),
        Span::styled("  ·  ", Style::default().fg(TEXT_MUTED)),
        Span::styled(format!("max {}", format_speed(max)), Style::default().fg(TEXT_MUTED)),
        Span::styled("  ·  ", Style::default().fg(TEXT_MUTED)),
        Span::styled(format!("min {}", format_speed(min)), Style::default().fg(TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(stats).alignment(Alignment::Center), chunks[0]);

    draw_progress_bar(frame, chunks[1], calculate_download_progress(app), SUCCESS, SUCCESS_DIM);

    draw_detailed_chart(frame, chunks[2], &app.download_samples, SUCCESS, "Mbps");
}

fn draw_detailed_chart(frame: &mut Frame, area: Rect, data: &[f64], color: Color, unit: &str) {
    if data.is_empty() || area.width < 10 || area.height < 3 {
        return;
    }

    let (min_val, max_val) = get_data_range(data);
    let range = (max_val - min_val).max(0.1);
    let y_min = (min_val - range * 0.1).max(0.0);
    let y_max = max_val + range * 0.1;

    let points: Vec<(f64, f64)> = data
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let y_labels = vec![
        Span::styled(format!("{:.0}", y_min), Style::default().fg(TEXT_MUTED)),
        Span::styled(format!("{:.0} {}", y_max, unit), Style::default().fg(TEXT_MUTED)),
    ];

    let chart = Chart::new(vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)])
    .x_axis(
        Axis::default()
            .style(Style::default().fg(BORDER))
            .bounds([0.0, data.len() as f64]),
    )
    .y_axis(
        Axis::default()
            .style(Style::default().fg(BORDER))
            .bounds([y_min, y_max])
            .labels(y_labels),
    );

    frame.render_widget(chart, area);
}

/// Connection details and quality gauges.
fn draw_report(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Report ", Style::default().fg(ACCENT)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .split(inner);

    let server = app.result.server.unwrap_or("—");
    let ip = app.connection.ip.to_string();
    let fields = [
        ("Server", server),
        ("IP", ip.as_str()),
        ("ISP", app.connection.isp),
        ("Protocol", app.connection.protocol),
    ];
    for (row, (label, value)) in rows.iter().zip(fields) {
        draw_report_row(frame, *row, label, value);
    }

    let download = app.result.download_mbps.map(quality::download_quality).unwrap_or(0.0);
    let upload = app.result.upload_mbps().map(quality::upload_quality).unwrap_or(0.0);
    let stability = match (app.result.ping_ms, app.result.jitter_ms) {
        (Some(ping), Some(jitter)) => quality::stability(ping, jitter),
        _ => 0.0,
    };

    draw_gauge(frame, rows[5], "Download quality", download, SUCCESS, SUCCESS_DIM);
    draw_gauge(frame, rows[6], "Upload quality", upload, INFO, INFO_DIM);
    draw_gauge(frame, rows[7], "Stability", stability, WARN, WARN_DIM);
}

fn draw_report_row(frame: &mut Frame, area: Rect, label: &str, value: &str) {
    let line = Line::from(vec![
        Span::styled(format!(" {:<10}", label), Style::default().fg(TEXT_MUTED)),
        Span::styled(value.to_string(), Style::default().fg(TEXT_PRIMARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_gauge(frame: &mut Frame, area: Rect, label: &str, percent: f64, color: Color, dim: Color) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);
    frame.render_widget(
        Paragraph::new(format!(" {} {:.0}%", label, percent)).style(Style::default().fg(TEXT_SECONDARY)),
        chunks[0],
    );
    draw_progress_bar(frame, chunks[1], percent / 100.0, color, dim);
}

// Mode picker
fn draw_mode_picker(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .split(area);

    // Header
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));
    let header_inner = header_block.inner(chunks[0]);
    frame.render_widget(header_block, chunks[0]);

    frame.render_widget(
        Paragraph::new("Test mode")
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        header_inner,
    );

    let content_area = Layout::horizontal([
        Constraint::Length(2),
        Constraint::Min(30),
        Constraint::Length(2),
    ])
    .split(chunks[1])[1];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(content_area);
    frame.render_widget(block, content_area);

    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(inner);

    for (row, mode) in rows.iter().zip(TestMode::ALL) {
        draw_mode_row(frame, *row, mode, app.picker_mode == mode, app.mode() == mode);
    }

    let help = "↑↓ select · enter apply · esc back";
    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_mode_row(frame: &mut Frame, area: Rect, mode: TestMode, selected: bool, active: bool) {
    let chunks = Layout::horizontal([
        Constraint::Length(16),
        Constraint::Min(10),
    ])
    .split(area);

    let label_style = if selected {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(TEXT_SECONDARY)
    };

    let marker = if active { "●" } else { " " };
    frame.render_widget(
        Paragraph::new(format!(" {} {}", marker, mode)).style(label_style),
        chunks[0],
    );

    let value_style = if selected {
        Style::default().fg(TEXT_PRIMARY)
    } else {
        Style::default().fg(TEXT_MUTED)
    };

    frame.render_widget(
        Paragraph::new(describe_mode(mode)).style(value_style),
        chunks[1],
    );
}

fn describe_mode(mode: TestMode) -> String {
    mode.stages()
        .iter()
        .map(|kind| match mode.stage_duration(*kind) {
            Some(d) => format!("{} {:.1}s", kind, d.as_secs_f64()),
            None => format!("{} {:.1}s", kind, mode.ping_delay().as_secs_f64()),
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.expanded {
        "esc close · q quit"
    } else if app.is_testing() {
        "tab select · space details · q quit"
    } else {
        "enter start · m mode · 1-3 preset · tab select · space details · q quit"
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

// Helpers
fn get_current_download_speed(app: &App) -> f64 {
    match app.result.download_mbps {
        Some(mbps) => mbps as f64,
        None => app.download_samples.last().copied().unwrap_or(0.0),
    }
}

fn get_data_range(data: &[f64]) -> (f64, f64) {
    let min = data.iter().cloned().fold(f64::MAX, f64::min);
    let max = data.iter().cloned().fold(f64::MIN, f64::max);
    (if min == f64::MAX { 0.0 } else { min }, if max == f64::MIN { 0.0 } else { max })
}

fn get_stats(data: &[f64]) -> (f64, f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let avg = data.iter().sum::<f64>() / data.len() as f64;
    let (min, max) = get_data_range(data);
    (avg, max, min)
}

fn calculate_download_progress(app: &App) -> f64 {
    match app.phase {
        TestPhase::Download => app.download_progress,
        TestPhase::Upload | TestPhase::Complete => 1.0,
        _ => 0.0,
    }
}

fn calculate_upload_progress(app: &App) -> f64 {
    match app.phase {
        TestPhase::Upload => app.upload_progress,
        TestPhase::Complete if app.result.upload_mbps().is_some() => 1.0,
        _ => 0.0,
    }
}

fn tier_color(mbps: f64) -> Color {
    match SpeedTier::of(mbps) {
        SpeedTier::Poor => TIER_POOR,
        SpeedTier::Fair => TIER_FAIR,
        SpeedTier::Good => TIER_GOOD,
        SpeedTier::Fast => TEXT_PRIMARY,
    }
}

fn format_speed(mbps: f64) -> String {
    if mbps >= 1000.0 {
        format!("{:.1} Gbps", mbps / 1000.0)
    } else if mbps >= 1.0 {
        format!("{:.0} Mbps", mbps)
    } else {
        "—".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw_ui(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app(mode: TestMode) -> App {
        App::new(&Settings {
            mode,
            seed: Some(3),
            log_file: None,
        })
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0.0), "—");
        assert_eq!(format_speed(87.0), "87 Mbps");
        assert_eq!(format_speed(1260.0), "1.3 Gbps");
    }

    #[test]
    fn test_describe_mode() {
        assert_eq!(describe_mode(TestMode::Basic), "ping 1.5s → download 2.5s");
        assert_eq!(
            describe_mode(TestMode::Advanced),
            "ping 1.0s → download 4.0s → upload 3.5s"
        );
    }

    #[test]
    fn test_idle_screen_shows_ready_status() {
        let screen = render(&app(TestMode::Detailed));
        assert!(screen.contains("Ready for detailed analysis"));
        assert!(screen.contains("ping / down / up"));
    }

    #[test]
    fn test_basic_upload_renders_not_applicable() {
        let mut app = app(TestMode::Basic);
        app.result.upload = Some(UploadSpeed::NotApplicable);
        app.phase = TestPhase::Complete;

        let screen = render(&app);
        assert!(screen.contains("N/A"));
        assert!(screen.contains("Analysis complete"));
    }

    #[test]
    fn test_report_lists_connection() {
        let mut app = app(TestMode::Advanced);
        app.expanded = true;

        let screen = render(&app);
        assert!(screen.contains(app.connection.isp));
        assert!(screen.contains(app.connection.protocol));
        assert!(screen.contains("Stability 0%"));
    }

    #[test]
    fn test_mode_picker_lists_presets() {
        let mut app = app(TestMode::Basic);
        app.view = AppView::ModePicker;

        let screen = render(&app);
        for mode in TestMode::ALL {
            assert!(screen.contains(&mode.to_string()));
        }
    }
}
