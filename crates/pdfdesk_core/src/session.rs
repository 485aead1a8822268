use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// The processing tools offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Compress,
    Merge,
    Split,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Compress, Tool::Merge, Tool::Split];

    /// Compress runs as soon as a file is present; merge and split wait for submit.
    pub fn auto_runs(self) -> bool {
        matches!(self, Tool::Compress)
    }

    /// Merge keeps a list of files; the other tools hold a single file.
    pub fn is_multi_file(self) -> bool {
        matches!(self, Tool::Merge)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Compress => "compress",
            Tool::Merge => "merge",
            Tool::Split => "split",
        }
    }

    /// Fallback failure text when the service gives no detail.
    pub fn failure_message(self) -> &'static str {
        match self {
            Tool::Compress => "Failed to compress PDF",
            Tool::Merge => "Failed to merge PDFs",
            Tool::Split => "Failed to split PDF",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compress" => Ok(Tool::Compress),
            "merge" => Ok(Tool::Merge),
            "split" => Ok(Tool::Split),
            other => Err(format!("unknown tool '{other}' (expected compress, merge or split)")),
        }
    }
}

/// Compression strength accepted by the service, 1 (light) to 4 (maximum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const LIGHT: CompressionLevel = CompressionLevel(1);
    pub const MEDIUM: CompressionLevel = CompressionLevel(2);
    pub const HIGH: CompressionLevel = CompressionLevel(3);
    pub const MAXIMUM: CompressionLevel = CompressionLevel(4);

    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if (1..=4).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::CompressionLevelOutOfRange(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Light",
            2 => "Medium",
            3 => "High",
            _ => "Maximum",
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::MEDIUM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplitMode {
    /// Every page becomes its own document.
    #[default]
    All,
    /// Only the pages named by the range string.
    Range,
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SplitMode::All),
            "range" => Ok(SplitMode::Range),
            other => Err(format!("unknown split mode '{other}' (expected all or range)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOptions {
    pub compression_level: CompressionLevel,
    pub split_mode: SplitMode,
    /// Comma separated pages and inclusive ranges, e.g. `1,3,5-9,12`.
    pub page_range: String,
}

impl ToolOptions {
    pub(crate) fn apply(&mut self, change: OptionChange) {
        match change {
            OptionChange::CompressionLevel(level) => self.compression_level = level,
            OptionChange::SplitMode(mode) => self.split_mode = mode,
            OptionChange::PageRange(range) => self.page_range = range,
        }
    }
}

/// One option edit coming from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    CompressionLevel(CompressionLevel),
    SplitMode(SplitMode),
    PageRange(String),
}

impl OptionChange {
    /// Only compression level edits trigger an automatic re-run (of compress).
    pub(crate) fn reruns(&self, tool: Tool) -> bool {
        tool == Tool::Compress && matches!(self, OptionChange::CompressionLevel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_level_bounds() {
        assert!(CompressionLevel::new(0).is_err());
        assert_eq!(CompressionLevel::new(4).unwrap(), CompressionLevel::MAXIMUM);
        assert_eq!(
            CompressionLevel::new(5),
            Err(ValidationError::CompressionLevelOutOfRange(5))
        );
        assert_eq!(CompressionLevel::default().get(), 2);
    }

    #[test]
    fn tool_parses_case_insensitively() {
        assert_eq!(" Merge ".parse::<Tool>().unwrap(), Tool::Merge);
        assert!("convert".parse::<Tool>().is_err());
    }

    #[test]
    fn only_level_change_reruns_compress() {
        let level = OptionChange::CompressionLevel(CompressionLevel::HIGH);
        assert!(level.reruns(Tool::Compress));
        assert!(!level.reruns(Tool::Merge));
        assert!(!OptionChange::SplitMode(SplitMode::Range).reruns(Tool::Compress));
    }
}
