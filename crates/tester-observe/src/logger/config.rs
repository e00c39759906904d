use std::io::IsTerminal;

use crate::logger::{format::LoggerFormat, level::LoggerLevel};

/// Subscriber settings for [`logger_init`](crate::logger_init).
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    /// Print the module path of each event.
    pub with_targets: bool,
    /// ANSI colours; only honoured by the text format.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    /// Text at `info`, coloured only when stdout is a terminal.
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}
