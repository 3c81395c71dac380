use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Debug topics understood by the filter
pub const TOPICS: [&str; 3] = ["vm", "world", "instructions"];

// Custom logger structure
#[derive(Debug)]
struct KarelLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl KarelLogger {
    fn topic_enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() > self.level {
            return false;
        }
        // Debug filters only narrow DEBUG/TRACE; warnings and errors always pass
        match &self.debug_filters {
            Some(filters) if metadata.level() >= log::Level::Debug => {
                filters.contains(metadata.target())
                    || filters.iter().any(|f| metadata.target().starts_with(f.as_str()))
            }
            _ => true,
        }
    }
}

fn level_color(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "\x1B[31m", // Red
        log::Level::Warn => "\x1B[33m",  // Yellow
        log::Level::Info => "\x1B[32m",  // Green
        log::Level::Debug => "\x1B[36m", // Cyan
        log::Level::Trace => "\x1B[35m", // Magenta
    }
}

fn format_record(record: &Record) -> String {
    let reset = "\x1B[0m";
    let timestamp = Local::now().format("%H:%M:%S%.3f");

    let mut output = format!(
        "{timestamp} {color}{level:5}{reset} {target}: {message}",
        color = level_color(record.level()),
        level = record.level(),
        target = record.target(),
        message = record.args()
    );

    // Module path only when it adds information
    if let Some(module_path) = record.module_path() {
        if module_path != record.target() {
            output.push_str(&format!(" [{}]", module_path));
        }
    }
    output
}

impl log::Log for KarelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.topic_enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // stdout carries documents; diagnostics stay on stderr
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", format_record(record));
        let _ = stderr.flush();
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<KarelLogger> = OnceLock::new();

fn parse_filters(filter: &str) -> HashSet<String> {
    filter
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Initialize the logger with optional debug filters
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| KarelLogger {
        level,
        debug_filters: debug_filter.as_deref().map(parse_filters),
    });

    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Helper macros for specific debug topics
//
// The `at pc, ic =>` form prefixes the message with the program counter and the
// instruction count of the running VM.
#[macro_export]
macro_rules! debug_vm {
    (at $pc:expr, $ic:expr => $($arg:tt)*) => {
        log::debug!(target: "vm", "[PC{:04}][IC{:06}] {}", $pc, $ic, format_args!($($arg)*))
    };
    ($($arg:tt)*) => {
        log::debug!(target: "vm", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_world {
    ($($arg:tt)*) => {
        log::debug!(target: "world", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_instructions {
    (at $pc:expr, $ic:expr => $($arg:tt)*) => {
        log::debug!(target: "instructions", "[PC{:04}][IC{:06}] {}", $pc, $ic, format_args!($($arg)*))
    };
    ($($arg:tt)*) => {
        log::debug!(target: "instructions", "{}", format_args!($($arg)*))
    }
}
