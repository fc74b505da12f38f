//! Diagnostics sender — ships frame metrics to `engine-squared-telemetry`
//! over UDP.
//!
//! Enabled by the `diagnostics` feature flag. [`DiagnosticsPlugin`] inserts a
//! [`DiagSender`] resource and registers [`send_diagnostics`] on `Update`,
//! which serializes a JSON [`DiagSnapshot`] at most ten times a second and
//! sends it to `127.0.0.1:9100`.
//!
//! [`init_logger`] installs an env_logger-backed logger that also captures
//! records into a ring buffer, so the dashboard can show them.

use std::collections::VecDeque;
use std::io;
use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use log::Log;
use serde::Serialize;

use crate::core::Core;
use crate::plugin::Plugin;
use crate::scheduler::Update;
use crate::time::Time;

pub const DIAG_ADDR: &str = "127.0.0.1:9100";
pub const SEND_INTERVAL: Duration = Duration::from_millis(100);

const LOG_CAPACITY: usize = 500;
const LOGS_PER_SNAPSHOT: usize = 100;

// ── Timings ──────────────────────────────────────────────────────────────

/// Time spent in one scheduler during a frame, recorded by the core.
#[derive(Clone, Debug, Serialize)]
pub struct SchedulerTiming {
    pub name: String,
    pub passes: usize,
    pub duration_us: f64,
    pub systems: Vec<SystemTiming>,
}

/// Time spent in one system, summed over every pass of its scheduler.
#[derive(Clone, Debug, Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

impl SchedulerTiming {
    pub(crate) fn new(name: &str, passes: usize) -> Self {
        Self {
            name: name.to_owned(),
            passes,
            duration_us: 0.0,
            systems: Vec::new(),
        }
    }

    pub(crate) fn record_system(&mut self, index: usize, name: &str, elapsed: Duration) {
        let us = elapsed.as_secs_f64() * 1_000_000.0;
        self.duration_us += us;
        match self.systems.get_mut(index) {
            Some(timing) => timing.duration_us += us,
            None => self.systems.push(SystemTiming {
                name: name.to_owned(),
                duration_us: us,
            }),
        }
    }
}

// ── Snapshot (wire format) ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DiagSnapshot {
    pub fps: f32,
    pub delta_ms: f32,
    pub frame_count: u64,
    pub elapsed_secs: f32,
    pub entity_count: usize,
    pub archetype_count: usize,
    pub entity_pool: EntityPoolSnapshot,
    pub archetypes: Vec<ArchetypeInfo>,
    pub schedulers: Vec<SchedulerTiming>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntrySnapshot>,
}

#[derive(Debug, Serialize)]
pub struct EntityPoolSnapshot {
    pub total_slots: u32,
    pub free_count: usize,
    pub alive_count: usize,
    pub fragmentation_pct: f32,
}

#[derive(Debug, Serialize)]
pub struct ArchetypeInfo {
    pub entity_count: usize,
    pub component_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LogEntrySnapshot {
    pub level: String,
    pub target: String,
    pub message: String,
    pub timestamp_secs: f32,
}

impl DiagSnapshot {
    /// Everything but the logs, read from `core`.
    pub fn capture(core: &Core) -> Self {
        let (fps, delta_ms, frame_count, elapsed_secs) = core
            .get_resource::<Time>()
            .map(|time| {
                (
                    time.fps(),
                    time.delta_secs() * 1000.0,
                    time.frame_count(),
                    time.elapsed_secs(),
                )
            })
            .unwrap_or_default();

        let registry = core.registry();
        let pool = registry.pool_stats();
        let fragmentation_pct = if pool.total_slots > 0 {
            pool.free_count as f32 / pool.total_slots as f32 * 100.0
        } else {
            0.0
        };
        let archetypes: Vec<ArchetypeInfo> = registry
            .archetype_summaries()
            .into_iter()
            .map(|(entity_count, names)| ArchetypeInfo {
                entity_count,
                component_names: names.into_iter().map(short_component_name).collect(),
            })
            .collect();

        Self {
            fps,
            delta_ms,
            frame_count,
            elapsed_secs,
            entity_count: registry.entity_count(),
            archetype_count: archetypes.len(),
            entity_pool: EntityPoolSnapshot {
                total_slots: pool.total_slots,
                free_count: pool.free_count,
                alive_count: pool.alive_count,
                fragmentation_pct,
            },
            archetypes,
            schedulers: core.frame_timings().to_vec(),
            plugins: core
                .plugin_names()
                .iter()
                .map(|name| short_component_name(name))
                .collect(),
            logs: Vec::new(),
        }
    }
}

/// `engine_squared::plugins::object::Transform` → `Transform`, keeping
/// generic arguments readable.
fn short_component_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    // Start of the path currently being written; `::` cuts back to it.
    let mut path_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(path_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                path_start = out.len();
            }
        }
    }
    out
}

// ── DiagSender ───────────────────────────────────────────────────────────

/// Resource that owns the outbound UDP socket and throttling state.
pub struct DiagSender {
    socket: UdpSocket,
    last_send: Option<Instant>,
}

impl DiagSender {
    /// Bind an ephemeral local port and target [`DIAG_ADDR`].
    pub fn new() -> io::Result<Self> {
        Self::connect(DIAG_ADDR)
    }

    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        socket.connect(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            last_send: None,
        })
    }

    /// True at most once per [`SEND_INTERVAL`].
    fn due(&mut self, now: Instant) -> bool {
        if self
            .last_send
            .is_some_and(|last| now.duration_since(last) < SEND_INTERVAL)
        {
            return false;
        }
        self.last_send = Some(now);
        true
    }

    pub fn send(&self, snapshot: &DiagSnapshot) -> io::Result<()> {
        let json = serde_json::to_vec(snapshot).map_err(io::Error::other)?;
        self.socket.send(&json)?;
        Ok(())
    }
}

// ── Log Capture ──────────────────────────────────────────────────────────

struct CapturedLog {
    level: log::Level,
    target: String,
    message: String,
    timestamp_secs: f32,
}

static LOG_RING: Mutex<VecDeque<CapturedLog>> = Mutex::new(VecDeque::new());
static LOG_START: OnceLock<Instant> = OnceLock::new();
static DIAG_LOGGER: OnceLock<DiagLogger> = OnceLock::new();

/// Delegates to env_logger for stderr output and captures every record at
/// info or above into [`LOG_RING`].
struct DiagLogger {
    inner: env_logger::Logger,
}

impl log::Log for DiagLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp_secs = LOG_START
            .get()
            .map_or(0.0, |start| start.elapsed().as_secs_f32());
        let entry = CapturedLog {
            level: record.level(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
            timestamp_secs,
        };
        let mut ring = LOG_RING.lock().unwrap_or_else(PoisonError::into_inner);
        if ring.len() >= LOG_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the capturing logger. Later calls do nothing.
///
/// Call this early (before any log messages) to capture everything.
pub fn init_logger() {
    if DIAG_LOGGER.get().is_some() {
        return;
    }
    LOG_START.get_or_init(Instant::now);

    let inner = env_logger::Builder::new().parse_default_env().build();
    let max_level = inner.filter();
    let logger = DIAG_LOGGER.get_or_init(|| DiagLogger { inner });

    if log::set_logger(logger).is_err() {
        eprintln!("[engine-squared] a logger is already set, log capture disabled");
        return;
    }
    log::set_max_level(max_level.max(log::LevelFilter::Info));
}

fn drain_captured_logs(max: usize) -> Vec<LogEntrySnapshot> {
    let mut ring = LOG_RING.lock().unwrap_or_else(PoisonError::into_inner);
    let n = ring.len().min(max);
    ring.drain(..n)
        .map(|entry| LogEntrySnapshot {
            level: entry.level.to_string(),
            target: entry.target,
            message: entry.message,
            timestamp_secs: entry.timestamp_secs,
        })
        .collect()
}

// ── send_diagnostics ─────────────────────────────────────────────────────

/// Throttled to [`SEND_INTERVAL`]. Send errors are ignored: nobody may be
/// listening.
pub fn send_diagnostics(core: &mut Core) {
    let due = core
        .get_resource_mut::<DiagSender>()
        .is_some_and(|sender| sender.due(Instant::now()));
    if !due {
        return;
    }

    let mut snapshot = DiagSnapshot::capture(core);
    snapshot.logs = drain_captured_logs(LOGS_PER_SNAPSHOT);
    if let Some(sender) = core.get_resource::<DiagSender>() {
        let _ = sender.send(&snapshot);
    }
}

/// Installs the capturing logger, the [`DiagSender`] and
/// [`send_diagnostics`].
#[derive(Default)]
pub struct DiagnosticsPlugin;

impl Plugin for DiagnosticsPlugin {
    fn bind(&self, core: &mut Core) {
        init_logger();
        match DiagSender::new() {
            Ok(sender) => {
                core.register_resource(sender);
            }
            Err(err) => log::warn!("Diagnostics disabled: {err}"),
        }
        core.systems::<Update>().add(send_diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct Position;
    struct Velocity;

    #[test]
    fn system_timings_sum_over_passes() {
        let mut timing = SchedulerTiming::new("FixedTimeUpdate", 2);
        timing.record_system(0, "physics", Duration::from_micros(10));
        timing.record_system(1, "ai", Duration::from_micros(5));
        timing.record_system(0, "physics", Duration::from_micros(10));
        assert_eq!(timing.systems.len(), 2);
        assert!((timing.systems[0].duration_us - 20.0).abs() < 1e-6);
        assert!((timing.duration_us - 25.0).abs() < 1e-6);
    }

    #[test]
    fn short_names_keep_generics() {
        assert_eq!(short_component_name("a::b::Transform"), "Transform");
        assert_eq!(
            short_component_name("a::Input<winit::keyboard::KeyCode>"),
            "Input<KeyCode>"
        );
        assert_eq!(short_component_name("(u32, a::B)"), "(u32, B)");
    }

    #[test]
    fn snapshot_describes_the_core() {
        let mut core = Core::new();
        core.registry_mut().spawn((Position, Velocity));
        core.registry_mut().spawn((Position,));
        let dead = core.create_entity();
        core.kill_entity(dead);
        core.run_systems().unwrap();

        let snapshot = DiagSnapshot::capture(&core);
        assert_eq!(snapshot.entity_count, 2);
        assert_eq!(snapshot.archetype_count, 2);
        assert_eq!(snapshot.entity_pool.free_count, 1);
        assert_eq!(snapshot.frame_count, 1);
        assert!(snapshot.schedulers.iter().any(|s| s.name == "Update"));

        let json: Value = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("logs").is_none());
        assert_eq!(json["entity_pool"]["total_slots"], 3);
    }

    #[test]
    fn snapshots_reach_a_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut core = Core::new();
        core.register_resource(DiagSender::connect(listener.local_addr().unwrap()).unwrap());
        core.register_system(send_diagnostics);
        core.run_systems().unwrap();
        core.run_systems().unwrap();

        let mut buf = vec![0u8; 65_536];
        let n = listener.recv(&mut buf).unwrap();
        let json: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert!(json["schedulers"].is_array());
        assert!(
            listener
                .set_nonblocking(true)
                .and_then(|_| listener.recv(&mut buf))
                .is_err(),
            "second frame inside the interval must not send"
        );
    }
}
