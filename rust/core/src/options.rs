// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parse options, loadable from environment variables.

/// Default number of bytes scanned for the `ISO-10303-21;` marker
pub const DEFAULT_HEADER_SCAN_LIMIT: usize = 64 * 1024;

/// How the DATA section bodies are tokenized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    /// Every parameter becomes its own token
    Tokens,
    /// Each entity parameter list is captured as one opaque raw token
    #[default]
    RawCapture,
}

impl LexMode {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tokens" | "token" | "fine" => Some(LexMode::Tokens),
            "raw" | "raw-capture" | "raw_capture" => Some(LexMode::RawCapture),
            _ => None,
        }
    }
}

/// Options shared by tree mode and index mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Case-fold lower/mixed-case standard keywords instead of rejecting them
    pub compatibility_mode: bool,
    /// Bytes scanned for the opening marker before giving up
    pub header_scan_limit: usize,
    /// DATA section tokenization used by index mode
    pub lex_mode: LexMode,
    /// Skip malformed entity instances instead of failing the parse
    pub resync: bool,
    /// Abort when more than this many instances were skipped
    pub max_resync_warnings: Option<usize>,
    /// Input without an `ISO-10303-21;` marker yields an empty result
    pub allow_empty: bool,
    /// Extract cross-references while indexing
    pub extract_xrefs: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            compatibility_mode: false,
            header_scan_limit: DEFAULT_HEADER_SCAN_LIMIT,
            lex_mode: LexMode::default(),
            resync: true,
            max_resync_warnings: None,
            allow_empty: false,
            extract_xrefs: true,
        }
    }
}

impl ParseOptions {
    /// Load options from `STEP21_*` environment variables.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            compatibility_mode: lookup("STEP21_COMPATIBILITY_MODE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.compatibility_mode),
            header_scan_limit: lookup("STEP21_HEADER_SCAN_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.header_scan_limit),
            lex_mode: lookup("STEP21_LEX_MODE")
                .and_then(|v| LexMode::from_name(&v))
                .unwrap_or(defaults.lex_mode),
            resync: lookup("STEP21_RESYNC")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.resync),
            max_resync_warnings: lookup("STEP21_MAX_RESYNC_WARNINGS")
                .and_then(|v| v.trim().parse().ok())
                .or(defaults.max_resync_warnings),
            allow_empty: lookup("STEP21_ALLOW_EMPTY")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.allow_empty),
            extract_xrefs: defaults.extract_xrefs,
        }
    }

    pub fn with_compatibility_mode(mut self, enabled: bool) -> Self {
        self.compatibility_mode = enabled;
        self
    }

    pub fn with_header_scan_limit(mut self, bytes: usize) -> Self {
        self.header_scan_limit = bytes;
        self
    }

    pub fn with_lex_mode(mut self, mode: LexMode) -> Self {
        self.lex_mode = mode;
        self
    }

    pub fn with_resync(mut self, enabled: bool) -> Self {
        self.resync = enabled;
        self
    }

    pub fn with_max_resync_warnings(mut self, limit: Option<usize>) -> Self {
        self.max_resync_warnings = limit;
        self
    }

    pub fn with_allow_empty(mut self, enabled: bool) -> Self {
        self.allow_empty = enabled;
        self
    }

    pub fn with_extract_xrefs(mut self, enabled: bool) -> Self {
        self.extract_xrefs = enabled;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(!options.compatibility_mode);
        assert!(options.resync);
        assert_eq!(options.header_scan_limit, DEFAULT_HEADER_SCAN_LIMIT);
        assert_eq!(options.lex_mode, LexMode::RawCapture);
        assert_eq!(options.max_resync_warnings, None);
    }

    #[test]
    fn test_from_lookup() {
        let options = ParseOptions::from_lookup(lookup_from(&[
            ("STEP21_COMPATIBILITY_MODE", "yes"),
            ("STEP21_HEADER_SCAN_LIMIT", "1024"),
            ("STEP21_LEX_MODE", "tokens"),
            ("STEP21_RESYNC", "off"),
            ("STEP21_MAX_RESYNC_WARNINGS", "3"),
        ]));
        assert!(options.compatibility_mode);
        assert_eq!(options.header_scan_limit, 1024);
        assert_eq!(options.lex_mode, LexMode::Tokens);
        assert!(!options.resync);
        assert_eq!(options.max_resync_warnings, Some(3));
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let options = ParseOptions::from_lookup(lookup_from(&[
            ("STEP21_HEADER_SCAN_LIMIT", "lots"),
            ("STEP21_RESYNC", "maybe"),
        ]));
        assert_eq!(options, ParseOptions::default());
    }
}
