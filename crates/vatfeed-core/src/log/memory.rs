use std::fmt::Arguments;
use std::sync::Mutex;

use super::{LogLevel, Logger};

/// Logger that keeps every formatted line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines in emission order.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(line_level, line)| *line_level == level && line.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, args.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_formatted_lines_with_level() {
        let logger = MemoryLogger::new();
        logger.debug(format_args!("loaded {} rows", 3));
        logger.warn(format_args!("fallback"));

        assert_eq!(
            logger.lines(),
            vec![
                (LogLevel::Debug, String::from("loaded 3 rows")),
                (LogLevel::Warn, String::from("fallback")),
            ]
        );
        assert!(logger.contains(LogLevel::Warn, "fall"));
        assert!(!logger.contains(LogLevel::Error, "fall"));
    }
}
