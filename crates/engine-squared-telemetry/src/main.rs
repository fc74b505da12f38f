//! engine-squared-telemetry — TUI dashboard for a running EngineSquared core.
//!
//! Listens for the JSON snapshots the `diagnostics` feature sends over UDP
//! and renders them as a live terminal dashboard using ratatui.
//!
//! Start this first with `cargo run -p engine-squared-telemetry`, then run a
//! program that adds `DiagnosticsPlugin` to its core.

use std::collections::VecDeque;
use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline};
use serde::Deserialize;

const LISTEN_ADDR: &str = "127.0.0.1:9100";

// ── Wire types (must match engine_squared::diag) ────────────────────────

#[derive(Deserialize, Clone, Default)]
struct DiagSnapshot {
    fps: f32,
    delta_ms: f32,
    frame_count: u64,
    elapsed_secs: f32,
    entity_count: usize,
    archetype_count: usize,
    #[serde(default)]
    entity_pool: EntityPoolInfo,
    #[serde(default)]
    archetypes: Vec<ArchetypeInfo>,
    #[serde(default)]
    schedulers: Vec<SchedulerTimingInfo>,
    #[serde(default)]
    plugins: Vec<String>,
    #[serde(default)]
    logs: Vec<LogEntryInfo>,
}

#[derive(Deserialize, Clone, Default)]
struct EntityPoolInfo {
    total_slots: u32,
    free_count: usize,
    alive_count: usize,
    fragmentation_pct: f32,
}

#[derive(Deserialize, Clone, Default)]
struct ArchetypeInfo {
    entity_count: usize,
    component_names: Vec<String>,
}

#[derive(Deserialize, Clone, Default)]
struct SchedulerTimingInfo {
    name: String,
    passes: usize,
    duration_us: f64,
    #[serde(default)]
    systems: Vec<SystemTimingInfo>,
}

#[derive(Deserialize, Clone, Default)]
struct SystemTimingInfo {
    name: String,
    duration_us: f64,
}

#[derive(Deserialize, Clone, Default)]
struct LogEntryInfo {
    level: String,
    target: String,
    message: String,
    timestamp_secs: f32,
}

// ── Tabs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Overview,
    Schedulers,
    Logs,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Schedulers, Tab::Logs];

    fn next(self) -> Self {
        match self {
            Tab::Overview => Tab::Schedulers,
            Tab::Schedulers => Tab::Logs,
            Tab::Logs => Tab::Overview,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Overview => Tab::Logs,
            Tab::Schedulers => Tab::Overview,
            Tab::Logs => Tab::Schedulers,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Schedulers => "Schedulers",
            Tab::Logs => "Logs",
        }
    }
}

// ── Log level filter ────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogFilter {
    All,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogFilter {
    fn next(self) -> Self {
        match self {
            LogFilter::All => LogFilter::Debug,
            LogFilter::Debug => LogFilter::Info,
            LogFilter::Info => LogFilter::Warn,
            LogFilter::Warn => LogFilter::Error,
            LogFilter::Error => LogFilter::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogFilter::All => "ALL",
            LogFilter::Debug => "DEBUG+",
            LogFilter::Info => "INFO+",
            LogFilter::Warn => "WARN+",
            LogFilter::Error => "ERROR",
        }
    }

    fn passes(self, level: &str) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Debug => level != "TRACE",
            LogFilter::Info => matches!(level, "INFO" | "WARN" | "ERROR"),
            LogFilter::Warn => matches!(level, "WARN" | "ERROR"),
            LogFilter::Error => level == "ERROR",
        }
    }
}

// ── App state ────────────────────────────────────────────────────────────

const HISTORY_CAP: usize = 1200;
const LOG_CAP: usize = 2000;
const FRAME_TARGET_MS: f64 = 16.6;

struct App {
    latest: DiagSnapshot,
    fps_history: VecDeque<u64>,
    delta_history: VecDeque<u64>,
    active_tab: Tab,
    paused: bool,
    connected: bool,

    // Schedulers tab
    show_systems: bool,

    // Logs tab
    log_entries: Vec<LogEntryInfo>,
    log_filter: LogFilter,
    log_auto_scroll: bool,
    log_scroll_offset: usize,
}

impl App {
    fn new() -> Self {
        Self {
            latest: DiagSnapshot::default(),
            fps_history: VecDeque::with_capacity(HISTORY_CAP),
            delta_history: VecDeque::with_capacity(HISTORY_CAP),
            active_tab: Tab::Overview,
            paused: false,
            connected: false,
            show_systems: true,
            log_entries: Vec::new(),
            log_filter: LogFilter::Info,
            log_auto_scroll: true,
            log_scroll_offset: 0,
        }
    }

    fn push_snapshot(&mut self, mut snap: DiagSnapshot) {
        if self.paused {
            return;
        }

        if self.fps_history.len() >= HISTORY_CAP {
            self.fps_history.pop_front();
        }
        self.fps_history.push_back(snap.fps.round().max(0.0) as u64);

        if self.delta_history.len() >= HISTORY_CAP {
            self.delta_history.pop_front();
        }
        self.delta_history
            .push_back((snap.delta_ms * 1000.0).round().max(0.0) as u64);

        // Logs arrive once; keep them across snapshots.
        self.log_entries.append(&mut snap.logs);
        if self.log_entries.len() > LOG_CAP {
            let excess = self.log_entries.len() - LOG_CAP;
            self.log_entries.drain(..excess);
        }

        self.latest = snap;
        self.connected = true;
    }

    fn log_counts(&self) -> (usize, usize, usize, usize, usize) {
        let (mut t, mut d, mut i, mut w, mut e) = (0, 0, 0, 0, 0);
        for log in &self.log_entries {
            match log.level.as_str() {
                "TRACE" => t += 1,
                "DEBUG" => d += 1,
                "INFO" => i += 1,
                "WARN" => w += 1,
                "ERROR" => e += 1,
                _ => {}
            }
        }
        (t, d, i, w, e)
    }

    fn filtered_logs(&self) -> Vec<&LogEntryInfo> {
        self.log_entries
            .iter()
            .filter(|e| self.log_filter.passes(&e.level))
            .collect()
    }

    /// Total time spent in schedulers last frame, in microseconds.
    fn frame_work_us(&self) -> f64 {
        self.latest.schedulers.iter().map(|s| s.duration_us).sum()
    }
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let socket = UdpSocket::bind(LISTEN_ADDR).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to bind {LISTEN_ADDR} (is another engine-squared-telemetry running?): {e}"),
        )
    })?;
    socket.set_nonblocking(true)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &socket);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    socket: &UdpSocket,
) -> io::Result<()> {
    let mut app = App::new();
    let mut buf = [0u8; 65536];

    loop {
        // Drain all pending datagrams.
        while let Ok(n) = socket.recv(&mut buf) {
            if let Ok(snap) = serde_json::from_slice::<DiagSnapshot>(&buf[..n]) {
                app.push_snapshot(snap);
            }
        }

        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(&mut app, key) {
                    return Ok(());
                }
            }
        }
    }
}

// ── Key handling ─────────────────────────────────────────────────────────

/// Returns `true` if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('p') => app.paused = !app.paused,

        KeyCode::Char('1') => app.active_tab = Tab::Overview,
        KeyCode::Char('2') => app.active_tab = Tab::Schedulers,
        KeyCode::Char('3') => app.active_tab = Tab::Logs,

        KeyCode::Tab => {
            app.active_tab = if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_tab.prev()
            } else {
                app.active_tab.next()
            };
        }
        KeyCode::BackTab => app.active_tab = app.active_tab.prev(),

        // Schedulers tab keys.
        KeyCode::Char('s') if app.active_tab == Tab::Schedulers => {
            app.show_systems = !app.show_systems;
        }

        // Logs tab keys.
        KeyCode::Char('f') if app.active_tab == Tab::Logs => {
            app.log_filter = app.log_filter.next();
        }
        KeyCode::Char('g') if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = !app.log_auto_scroll;
        }
        KeyCode::Up if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = false;
            app.log_scroll_offset = app.log_scroll_offset.saturating_sub(1);
        }
        KeyCode::Down if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = false;
            app.log_scroll_offset += 1;
        }

        _ => {}
    }
    false
}

// ── UI rendering ─────────────────────────────────────────────────────────

fn ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // tab content
            Constraint::Length(1), // help bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);

    match app.active_tab {
        Tab::Overview => draw_overview_tab(f, app, chunks[2]),
        Tab::Schedulers => draw_schedulers_tab(f, app, chunks[2]),
        Tab::Logs => draw_logs_tab(f, app, chunks[2]),
    }

    draw_help_bar(f, app, chunks[3]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let (status, status_color) = if app.paused {
        ("PAUSED", Color::Yellow)
    } else if app.connected {
        ("LIVE", Color::Green)
    } else {
        ("WAITING", Color::DarkGray)
    };

    let text = Line::from(vec![
        Span::styled(
            format!(" {status} "),
            Style::default().bg(status_color).fg(Color::Black),
        ),
        Span::raw("  "),
        Span::styled("FPS: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.1}", s.fps),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("Frame: ", Style::default().fg(Color::DarkGray)),
        Span::styled(s.frame_count.to_string(), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled("\u{0394}: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.1}ms", s.delta_ms), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled("Up: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format_uptime(s.elapsed_secs), Style::default().fg(Color::White)),
    ]);

    let block = Block::default()
        .title(" engine-squared-telemetry ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_tab_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let num = format!(" {} ", i + 1);
        let label = format!("{} ", tab.label());
        if *tab == app.active_tab {
            spans.push(Span::styled(
                num,
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                label,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(num, Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Overview Tab ─────────────────────────────────────────────────────────

fn draw_overview_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // sparklines
            Constraint::Length(1), // entity pool line
            Constraint::Min(4),    // archetypes + plugins
        ])
        .split(area);

    draw_sparklines(f, app, chunks[0]);
    draw_entity_pool_line(f, app, chunks[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[2]);
    draw_archetypes(f, app, bottom[0]);
    draw_plugins(f, app, bottom[1]);
}

fn draw_sparklines(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let fps_data: Vec<u64> = app.fps_history.iter().copied().collect();
    let (lo, avg, hi) = stats(&fps_data);
    draw_history(
        f,
        chunks[0],
        " FPS History ",
        &fps_data,
        Color::Green,
        format!("min: {lo:.0}  avg: {avg:.0}  max: {hi:.0}"),
    );

    // Deltas are kept in microseconds.
    let delta_data: Vec<u64> = app.delta_history.iter().copied().collect();
    let (lo, avg, hi) = stats(&delta_data);
    draw_history(
        f,
        chunks[1],
        " Delta Time ",
        &delta_data,
        Color::Yellow,
        format!(
            "min: {:.1}ms  avg: {:.1}ms  max: {:.1}ms",
            lo / 1000.0,
            avg / 1000.0,
            hi / 1000.0
        ),
    );
}

fn draw_history(
    f: &mut ratatui::Frame,
    area: Rect,
    title: &str,
    data: &[u64],
    color: Color,
    summary: String,
) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let spark_area = Rect {
        height: inner.height - 1,
        ..inner
    };
    let stats_area = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    f.render_widget(
        Sparkline::default().data(data).style(Style::default().fg(color)),
        spark_area,
    );
    f.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(Color::DarkGray))),
        stats_area,
    );
}

fn draw_entity_pool_line(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let pool = &app.latest.entity_pool;
    let frag = pool.fragmentation_pct;
    let frag_color = if frag < 25.0 {
        Color::Green
    } else if frag < 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let bar_width: usize = 16;
    let filled = if pool.total_slots > 0 {
        ((pool.alive_count as f32 / pool.total_slots as f32) * bar_width as f32).round() as usize
    } else {
        0
    };
    let bar = format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(bar_width.saturating_sub(filled))
    );

    let spans = vec![
        Span::styled("  Entities: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.latest.entity_count.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Pool: ", Style::default().fg(Color::DarkGray)),
        Span::styled(pool.total_slots.to_string(), Style::default().fg(Color::White)),
        Span::styled(" slots  Free: ", Style::default().fg(Color::DarkGray)),
        Span::styled(pool.free_count.to_string(), Style::default().fg(Color::White)),
        Span::styled("  Frag: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{frag:.0}%"), Style::default().fg(frag_color)),
        Span::raw("  "),
        Span::styled(bar, Style::default().fg(frag_color)),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_archetypes(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Archetypes ({}) ", app.latest.archetype_count))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut sorted: Vec<&ArchetypeInfo> = app
        .latest
        .archetypes
        .iter()
        .filter(|a| a.entity_count > 0)
        .collect();
    if sorted.is_empty() {
        let text = Span::styled("  No populated archetypes", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text), inner);
        return;
    }
    sorted.sort_by(|a, b| b.entity_count.cmp(&a.entity_count));

    let lines: Vec<Line> = sorted
        .iter()
        .take(inner.height as usize)
        .map(|arch| {
            let components = if arch.component_names.is_empty() {
                "(empty)".to_string()
            } else {
                arch.component_names.join(", ")
            };
            Line::from(vec![
                Span::styled(
                    format!("  {:>6} ", arch.entity_count),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(components, Style::default().fg(Color::White)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_plugins(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Plugins ({}) ", app.latest.plugins.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let lines: Vec<Line> = app
        .latest
        .plugins
        .iter()
        .map(|name| Line::from(Span::styled(format!(" {name}"), Style::default().fg(Color::White))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Schedulers Tab ───────────────────────────────────────────────────────

fn draw_schedulers_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    draw_frame_budget(f, app, chunks[0]);
    draw_scheduler_timings(f, app, chunks[1]);
}

fn draw_frame_budget(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Frame Budget ({FRAME_TARGET_MS}ms target) "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.latest.schedulers.is_empty() {
        let text = Span::styled(
            "  Waiting for scheduler timings...",
            Style::default().fg(Color::DarkGray),
        );
        f.render_widget(Paragraph::new(text), inner);
        return;
    }

    let total_ms = app.frame_work_us() / 1000.0;
    let pct = total_ms / FRAME_TARGET_MS;
    let bar_color = budget_color(pct);

    let bar_width = inner.width.saturating_sub(24) as usize;
    let filled = ((pct.min(1.5) / 1.5) * bar_width as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(bar_width.saturating_sub(filled))
    );

    let text = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{total_ms:.2}ms "),
            Style::default().fg(bar_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({:.0}%) ", pct * 100.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(bar, Style::default().fg(bar_color)),
    ]);
    f.render_widget(Paragraph::new(text), inner);
}

fn draw_scheduler_timings(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Schedulers (run order) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let schedulers = &app.latest.schedulers;
    if schedulers.is_empty() {
        let text = Span::styled("  No scheduler timing data", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text), inner);
        return;
    }

    let max_dur = schedulers
        .iter()
        .map(|s| s.duration_us)
        .fold(1.0_f64, f64::max);
    let name_width = schedulers
        .iter()
        .flat_map(|s| {
            std::iter::once(s.name.len())
                .chain(s.systems.iter().map(|sys| sys.name.len() + 2))
        })
        .max()
        .unwrap_or(10)
        .min(32);
    let bar_max_width = inner.width.saturating_sub(name_width as u16 + 20) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for sched in schedulers {
        let ms = sched.duration_us / 1000.0;
        let bar_len = ((sched.duration_us / max_dur) * bar_max_width as f64).round() as usize;
        let pass_color = if sched.passes == 0 {
            Color::DarkGray
        } else {
            Color::White
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:width$}", sched.name, width = name_width),
                Style::default().fg(pass_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" x{:<3}", sched.passes), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{ms:>7.2}ms "), Style::default().fg(Color::DarkGray)),
            Span::styled(
                "\u{2588}".repeat(bar_len),
                Style::default().fg(timing_color(ms)),
            ),
        ]));

        if !app.show_systems {
            continue;
        }
        let mut systems: Vec<&SystemTimingInfo> = sched.systems.iter().collect();
        systems.sort_by(|a, b| b.duration_us.total_cmp(&a.duration_us));
        for sys in systems {
            let ms = sys.duration_us / 1000.0;
            let bar_len = ((sys.duration_us / max_dur) * bar_max_width as f64).round() as usize;
            lines.push(Line::from(vec![
                Span::styled(
                    format!("    {:width$}", sys.name, width = name_width.saturating_sub(2)),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw("     "),
                Span::styled(format!("{ms:>7.2}ms "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    "\u{2584}".repeat(bar_len),
                    Style::default().fg(timing_color(ms)),
                ),
            ]));
        }
    }

    lines.truncate(inner.height as usize);
    f.render_widget(Paragraph::new(lines), inner);
}

// ── Logs Tab ─────────────────────────────────────────────────────────────

fn draw_logs_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let (t, d, i, w, e) = app.log_counts();
    let scroll_label = if app.log_auto_scroll { "auto" } else { "manual" };

    let block = Block::default()
        .title(format!(
            " Logs [{}]  T:{t} D:{d} I:{i} W:{w} E:{e}  scroll:{scroll_label} ",
            app.log_filter.label(),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let filtered = app.filtered_logs();
    if filtered.is_empty() {
        let text = Span::styled("  No log messages", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text), inner);
        return;
    }

    let visible = inner.height as usize;
    let total = filtered.len();
    let offset = if app.log_auto_scroll {
        total.saturating_sub(visible)
    } else {
        app.log_scroll_offset.min(total.saturating_sub(visible))
    };

    let lines: Vec<Line> = filtered
        .iter()
        .skip(offset)
        .take(visible)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "TRACE" => Color::DarkGray,
                "DEBUG" => Color::Gray,
                "INFO" => Color::Cyan,
                "WARN" => Color::Yellow,
                "ERROR" => Color::Red,
                _ => Color::White,
            };
            Line::from(vec![
                Span::styled(
                    format!("  [{:>6.1}s] ", entry.timestamp_secs),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<5} ", entry.level),
                    Style::default().fg(level_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} ", entry.target), Style::default().fg(Color::DarkGray)),
                Span::styled(entry.message.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

// ── Help bar ─────────────────────────────────────────────────────────────

fn draw_help_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
    let mut spans = vec![
        key(" [1-3]"),
        Span::raw(" tab  "),
        key("[Tab]"),
        Span::raw(" next  "),
    ];

    match app.active_tab {
        Tab::Overview => {}
        Tab::Schedulers => {
            spans.push(key("[s]"));
            spans.push(Span::raw(if app.show_systems {
                " hide systems  "
            } else {
                " show systems  "
            }));
        }
        Tab::Logs => {
            spans.push(key("[f]"));
            spans.push(Span::raw(" filter  "));
            spans.push(key("[g]"));
            spans.push(Span::raw(" auto-scroll  "));
            spans.push(key("[\u{2191}\u{2193}]"));
            spans.push(Span::raw(" scroll  "));
        }
    }

    spans.push(key("[p]"));
    spans.push(Span::raw(" pause  "));
    spans.push(key("[q]"));
    spans.push(Span::raw(" quit"));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn stats(data: &[u64]) -> (f64, f64, f64) {
    let (Some(min), Some(max)) = (data.iter().min(), data.iter().max()) else {
        return (0.0, 0.0, 0.0);
    };
    let avg = data.iter().sum::<u64>() as f64 / data.len() as f64;
    (*min as f64, avg, *max as f64)
}

fn budget_color(fraction: f64) -> Color {
    if fraction < 0.8 {
        Color::Green
    } else if fraction <= 1.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn timing_color(ms: f64) -> Color {
    if ms < 2.0 {
        Color::Green
    } else if ms < 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn format_uptime(secs: f32) -> String {
    let total = secs as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{secs:.1}s")
    }
}
