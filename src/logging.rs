//! agamepack logging
//!
//! Console logging with an optional per-run log file carrying a system
//! information header. Until [`init_logger`] is called the logger only
//! writes to the console, so library users never get stray log files.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

static LOGGER: OnceLock<Mutex<PackLogger>> = OnceLock::new();

// ============================================================================
// System Information Detection
// ============================================================================

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub app_version: String,
    pub distro: String,
    pub kernel: String,
    pub desktop_env: String,
    pub disk_space_free: String,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            distro: detect_distro(),
            kernel: detect_kernel(),
            desktop_env: detect_desktop_env(),
            disk_space_free: detect_disk_space(),
        }
    }

    pub fn to_log_header(&self) -> String {
        format!(
r#"================================================================================
agamepack Log - {}
================================================================================
Application:   agamepack v{}
System Info:
  Distro:      {}
  Kernel:      {}
  Desktop:     {}
  Disk Free:   {}
================================================================================
"#,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.app_version,
            self.distro,
            self.kernel,
            self.desktop_env,
            self.disk_space_free
        )
    }
}

fn detect_distro() -> String {
    if let Ok(file) = File::open("/etc/os-release") {
        let reader = BufReader::new(file);
        for line in reader.lines().map_while(Result::ok) {
            if line.starts_with("PRETTY_NAME=") {
                return line
                    .trim_start_matches("PRETTY_NAME=")
                    .trim_matches('"')
                    .to_string();
            }
        }
    }
    "Unknown".to_string()
}

fn detect_kernel() -> String {
    if let Ok(output) = Command::new("uname").arg("-r").output() {
        if output.status.success() {
            return String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
    }
    "Unknown".to_string()
}

fn detect_desktop_env() -> String {
    for var in ["XDG_CURRENT_DESKTOP", "DESKTOP_SESSION", "XDG_SESSION_DESKTOP"] {
        if let Ok(de) = std::env::var(var) {
            return de;
        }
    }
    "Unknown".to_string()
}

fn detect_disk_space() -> String {
    // Free space where the package is built (the working directory)
    if let Ok(output) = Command::new("df").arg("-h").arg(".").output() {
        if output.status.success() {
            let out = String::from_utf8_lossy(&output.stdout);
            if let Some(line) = out.lines().nth(1) {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 6 {
                    return format!("{} (on {})", parts[3], parts[5]);
                }
            }
        }
    }
    "Unknown".to_string()
}

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Action, // Pipeline steps
    Link,
    Build,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Action => "[ACTION]",
            LogLevel::Link => "[LINK]",
            LogLevel::Build => "[BUILD]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }

    fn is_diagnostic(&self) -> bool {
        matches!(self, LogLevel::Warning | LogLevel::Error)
    }
}

// ============================================================================
// Logger
// ============================================================================

pub struct PackLogger {
    log_file: Option<File>,
}

impl PackLogger {
    /// Logger that only writes to the console.
    pub fn console_only() -> Self {
        Self { log_file: None }
    }

    /// Logger that also appends to a timestamped file in `<tool home>/logs`.
    pub fn with_log_file() -> Self {
        let log_dir: PathBuf = crate::agamepack_path!("logs");
        let _ = fs::create_dir_all(&log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("agamepack_{}.log", timestamp));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok();

        let mut logger = Self { log_file };
        let header = SystemInfo::detect().to_log_header();
        logger.write_file(&header);
        logger
    }

    fn write_file(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_file(&formatted);

        if level.is_diagnostic() {
            eprintln!("{}", formatted);
        } else {
            println!("{}", formatted);
        }
    }
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the file-backed global logger (call once at startup).
///
/// Has no effect if something was already logged, since the console-only
/// logger is installed on first use.
pub fn init_logger() {
    LOGGER.get_or_init(|| Mutex::new(PackLogger::with_log_file()));
}

fn logger() -> &'static Mutex<PackLogger> {
    LOGGER.get_or_init(|| Mutex::new(PackLogger::console_only()))
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    logger().lock().log(LogLevel::Info, message);
}

pub fn log_action(message: &str) {
    logger().lock().log(LogLevel::Action, message);
}

pub fn log_link(message: &str) {
    logger().lock().log(LogLevel::Link, message);
}

pub fn log_build(message: &str) {
    logger().lock().log(LogLevel::Build, message);
}

pub fn log_warning(message: &str) {
    logger().lock().log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    logger().lock().log(LogLevel::Error, message);
}
