//! Centralized logging configuration for the console.
//!
//! # Architecture
//!
//! - **LogConfig**: thread-safe global configuration using atomic operations
//! - **LogLevel**: hierarchical log levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: the three components that actually log (Cpu, Bus, Tia)
//!
//! # Usage
//!
//! ```rust
//! use atari2600_core::logging::{LogConfig, LogLevel, LogCategory};
//!
//! LogConfig::global().set_level(LogCategory::Cpu, LogLevel::Debug);
//!
//! if LogConfig::global().should_log(LogCategory::Cpu, LogLevel::Info) {
//!     eprintln!("cpu: something happened");
//! }
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Log level for controlling verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse a log level from a string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the console's three logging components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// CPU execution: invalid opcodes, instruction faults.
    Cpu,
    /// Bus/memory access and ROM/palette loading.
    Bus,
    /// TIA beam/rendering: forced auto-VSync, settings commits.
    Tia,
}

/// Global logging configuration.
pub struct LogConfig {
    global_level: AtomicU8,
    cpu_level: AtomicU8,
    bus_level: AtomicU8,
    tia_level: AtomicU8,
}

impl LogConfig {
    const fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            cpu_level: AtomicU8::new(LogLevel::Off as u8),
            bus_level: AtomicU8::new(LogLevel::Off as u8),
            tia_level: AtomicU8::new(LogLevel::Off as u8),
        }
    }

    /// Get the global singleton instance.
    pub fn global() -> &'static Self {
        static INSTANCE: LogConfig = LogConfig::new();
        &INSTANCE
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    fn atomic_for(&self, category: LogCategory) -> &AtomicU8 {
        match category {
            LogCategory::Cpu => &self.cpu_level,
            LogCategory::Bus => &self.bus_level,
            LogCategory::Tia => &self.tia_level,
        }
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.atomic_for(category).store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.atomic_for(category).load(Ordering::Relaxed))
    }

    /// A message logs if the category's own level is set and covers it, or
    /// (when the category has no override) if the global level covers it.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off.
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        self.set_level(LogCategory::Cpu, LogLevel::Off);
        self.set_level(LogCategory::Bus, LogLevel::Off);
        self.set_level(LogCategory::Tia, LogLevel::Off);
    }
}

/// Convenience macro for logging.
#[macro_export]
macro_rules! log {
    ($category:expr, $level:expr, $($arg:tt)*) => {
        if $crate::logging::LogConfig::global().should_log($category, $level) {
            eprintln!($($arg)*);
        }
    };
}
