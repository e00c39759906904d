use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Where and how log events are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerFormat {
    /// Human-readable lines on stdout.
    #[default]
    Text,
    /// One JSON object per event on stdout.
    Json,
    /// Native journald records. Linux only, behind the `journald` feature.
    Journald,
}

/// Accepted spellings, matched case-insensitively.
const NAMES: [(&str, LoggerFormat); 4] = [
    ("text", LoggerFormat::Text),
    ("json", LoggerFormat::Json),
    ("journald", LoggerFormat::Journald),
    ("journal", LoggerFormat::Journald),
];

impl LoggerFormat {
    /// Whether this build can emit journald records.
    pub const JOURNALD_AVAILABLE: bool = cfg!(all(target_os = "linux", feature = "journald"));

    pub fn as_str(self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let format = NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, format)| *format)
            .ok_or_else(|| LoggerError::InvalidFormat(s.to_string()))?;

        if format == LoggerFormat::Journald && !Self::JOURNALD_AVAILABLE {
            return Err(LoggerError::JournaldNotSupported);
        }
        Ok(format)
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("text".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
        assert_eq!(" JSON ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
        assert_eq!(LoggerFormat::default(), LoggerFormat::Text);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for format in [LoggerFormat::Text, LoggerFormat::Json] {
            assert_eq!(format.to_string().parse::<LoggerFormat>().unwrap(), format);
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(s) if s == "yaml"));
    }

    #[test]
    fn journald_depends_on_build() {
        let parsed = "Journal".parse::<LoggerFormat>();
        if LoggerFormat::JOURNALD_AVAILABLE {
            assert_eq!(parsed.unwrap(), LoggerFormat::Journald);
        } else {
            assert!(matches!(parsed, Err(LoggerError::JournaldNotSupported)));
        }
    }
}
