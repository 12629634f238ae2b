use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

use logdeck_types::{LogLevel, LogRecord};

/// A local state change that was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("At least one log level must remain selected ({0} is the last one)")]
    LastLevel(LogLevel),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
}

/// Set of selected log levels; never empty
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelFilter {
    selected: BTreeSet<LogLevel>,
}

impl LevelFilter {
    /// Build from a comma-separated configured default, e.g. "INFO, debug,WARN"
    ///
    /// Unknown tokens are ignored. Falls back to INFO when nothing valid remains.
    pub fn from_config(levels: Option<&str>) -> Self {
        let selected: BTreeSet<LogLevel> = levels
            .unwrap_or_default()
            .split(',')
            .filter_map(LogLevel::parse)
            .collect();

        if selected.is_empty() {
            Self::default()
        } else {
            Self { selected }
        }
    }

    pub fn is_selected(&self, level: LogLevel) -> bool {
        self.selected.contains(&level)
    }

    /// Selected levels in display order
    pub fn selected(&self) -> Vec<LogLevel> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flip a level; returns its new selection state
    pub fn toggle(&mut self, level: LogLevel) -> Result<bool, FilterError> {
        if self.selected.contains(&level) {
            if self.selected.len() == 1 {
                return Err(FilterError::LastLevel(level));
            }
            self.selected.remove(&level);
            Ok(false)
        } else {
            self.selected.insert(level);
            Ok(true)
        }
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self {
            selected: BTreeSet::from([LogLevel::Info]),
        }
    }
}

/// Compiled text search over fetched records
#[derive(Clone)]
pub struct SearchFilter {
    regex: Regex,

    /// Original pattern string
    pattern: String,

    case_insensitive: bool,
}

impl SearchFilter {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, FilterError> {
        let source = if case_insensitive {
            format!("(?i){}", pattern)
        } else {
            pattern.to_string()
        };
        let regex = Regex::new(&source).map_err(|e| FilterError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            case_insensitive,
        })
    }

    /// Match against message, location, name and affected id
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.regex.is_match(&record.short_message)
            || self.regex.is_match(&record.location)
            || self.regex.is_match(&record.name)
            || record
                .affected_id
                .as_deref()
                .is_some_and(|id| self.regex.is_match(id))
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl std::fmt::Debug for SearchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchFilter")
            .field("pattern", &self.pattern)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}
