//! Launcher Logging System
//!
//! Every line goes to the console and to a per-run log file under the
//! launcher's data directory, preceded by a short system information header.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::sync::{Arc, OnceLock};

static LOGGER: OnceLock<Arc<Mutex<LauncherLogger>>> = OnceLock::new();

// ============================================================================
// System Information
// ============================================================================

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub app_version: String,
    pub os: String,
    pub arch: String,
    pub working_dir: String,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "Unknown".to_string()),
        }
    }

    pub fn to_log_header(&self) -> String {
        format!(
r#"================================================================================
ShipThat Launcher Log - {}
================================================================================
Launcher:      v{}
System Info:
  OS:          {}
  Arch:        {}
  Working Dir: {}
================================================================================
"#,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.app_version,
            self.os,
            self.arch,
            self.working_dir
        )
    }
}

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Check, // Release feed queries and selection
    Download,
    Install,
    Launch,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Check => "[CHECK]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Install => "[INSTALL]",
            LogLevel::Launch => "[LAUNCH]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// Launcher Logger
// ============================================================================

pub struct LauncherLogger {
    log_file: Option<File>,
}

impl LauncherLogger {
    pub fn new() -> Self {
        // Unit tests log to the console only
        let log_file = if cfg!(test) { None } else { open_log_file() };

        let mut logger = Self { log_file };

        let header = SystemInfo::detect().to_log_header();
        logger.write_raw(&header);

        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }

        println!("{}", msg);
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        self.write_raw(&format_line(level, message));
    }
}

impl Default for LauncherLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn open_log_file() -> Option<File> {
    let log_dir = crate::data_path!("logs");
    let _ = fs::create_dir_all(&log_dir);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("launcher_{}.log", timestamp));

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()
}

fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S");
    format!("[{}] {} {}", timestamp, level.prefix(), message)
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup)
pub fn init_logger() {
    logger();
}

fn logger() -> Arc<Mutex<LauncherLogger>> {
    LOGGER
        .get_or_init(|| Arc::new(Mutex::new(LauncherLogger::new())))
        .clone()
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    logger().lock().log(LogLevel::Info, message);
}

pub fn log_check(message: &str) {
    logger().lock().log(LogLevel::Check, message);
}

pub fn log_download(message: &str) {
    logger().lock().log(LogLevel::Download, message);
}

pub fn log_install(message: &str) {
    logger().lock().log(LogLevel::Install, message);
}

pub fn log_launch(message: &str) {
    logger().lock().log(LogLevel::Launch, message);
}

pub fn log_warning(message: &str) {
    logger().lock().log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    logger().lock().log(LogLevel::Error, message);
}
