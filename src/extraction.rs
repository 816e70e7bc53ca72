//! Extraction of tagged card blocks from assistant text
//!
//! The assistant embeds structured data in its replies as delimiter-bounded
//! JSON, for example:
//!
//! ```text
//! Xin chào @@<WEATHER_DATA>{"location":"Hà Nội", ...}</WEATHER_DATA>
//! ```
//!
//! Extraction always runs over the complete text received so far. Every kind
//! is an independent pass that honours only its first closed span, so nested
//! or overlapping blocks of different kinds are not supported.

use crate::cards::{ParseError, ParsedPayload, TaggedBlockKind, OPEN_MARKER, TRIPLE_MARKER};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Which delimiter markers are recognized around a block.
///
/// The double form is `@@<TAG>...</TAG>`, the triple form is
/// `@@@<TAG>...</TAG>@@@`. In the triple form the trailing marker is
/// optional so a block is usable as soon as its close tag arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarkerConvention {
    Double,
    Triple,
    #[default]
    Both,
}

impl MarkerConvention {
    fn open_pattern(&self) -> &'static str {
        match self {
            MarkerConvention::Double => "@@",
            MarkerConvention::Triple => "@@@",
            MarkerConvention::Both => "@@@?",
        }
    }

    fn trailing_pattern(&self) -> &'static str {
        match self {
            MarkerConvention::Double => "",
            MarkerConvention::Triple | MarkerConvention::Both => "(?:@@@)?",
        }
    }

    /// Literal open markers that may start a block under this convention
    fn open_markers(&self) -> &'static [&'static str] {
        match self {
            MarkerConvention::Double => &[OPEN_MARKER],
            MarkerConvention::Triple => &[TRIPLE_MARKER],
            MarkerConvention::Both => &[OPEN_MARKER, TRIPLE_MARKER],
        }
    }
}

/// Result of running extraction once over a message
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractionResult {
    /// Successfully parsed blocks, iterated in priority order
    pub blocks: BTreeMap<TaggedBlockKind, ParsedPayload>,
    /// Text with every extracted span removed, trimmed
    pub display_text: String,
    /// An open delimiter exists without a close delimiter after it
    pub has_partial_block: bool,
    /// Kinds whose open delimiter is still waiting for its close
    pub partial_kinds: Vec<TaggedBlockKind>,
    /// Closed blocks that failed to parse; their text stays in `display_text`
    pub errors: Vec<ParseError>,
}

impl ExtractionResult {
    pub fn has_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[derive(Debug)]
struct KindPattern {
    kind: TaggedBlockKind,
    /// Open delimiter, content (group 1), close delimiter, non-greedy
    span: Regex,
    open: Regex,
    close: String,
}

/// Compiled block patterns for one marker convention
#[derive(Debug)]
pub struct Extractor {
    convention: MarkerConvention,
    patterns: Vec<KindPattern>,
}

impl Extractor {
    pub fn new(convention: MarkerConvention) -> Self {
        let patterns = TaggedBlockKind::ALL
            .into_iter()
            .map(|kind| {
                let tag = regex::escape(kind.tag_name());
                let open = format!("{}<{tag}>", convention.open_pattern());
                let close = format!("</{tag}>{}", convention.trailing_pattern());
                KindPattern {
                    kind,
                    span: Regex::new(&format!("(?s){open}(.*?){close}"))
                        .expect("block span pattern is valid"),
                    open: Regex::new(&open).expect("block open pattern is valid"),
                    close: kind.close_delimiter(),
                }
            })
            .collect();

        Self {
            convention,
            patterns,
        }
    }

    pub fn convention(&self) -> MarkerConvention {
        self.convention
    }

    /// Extract all recognized blocks from the text received so far
    pub fn extract(&self, raw_text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let mut working = raw_text.to_string();

        for pattern in &self.patterns {
            if let Some(captures) = pattern.span.captures(raw_text) {
                let span = captures.get(0).map_or("", |m| m.as_str());
                let content = captures.get(1).map_or("", |m| m.as_str());

                match ParsedPayload::parse(pattern.kind, content) {
                    Ok(payload) => {
                        result.blocks.insert(pattern.kind, payload);
                        working = working.replacen(span, "", 1);
                    }
                    Err(e) => {
                        warn!("Keeping {} block as plain text: {}", pattern.kind, e);
                        result.errors.push(e);
                    }
                }
            }

            if self.unclosed_open_of(pattern, raw_text).is_some() {
                result.partial_kinds.push(pattern.kind);
            }
        }

        result.has_partial_block = !result.partial_kinds.is_empty();
        result.display_text = working.trim().to_string();

        debug!(
            "Extracted {} block(s), partial: {:?}, errors: {}",
            result.blocks.len(),
            result.partial_kinds,
            result.errors.len()
        );

        result
    }

    /// Byte offset of the earliest open delimiter that has no close after it
    pub fn unclosed_block_start(&self, text: &str) -> Option<usize> {
        self.patterns
            .iter()
            .filter_map(|pattern| self.unclosed_open_of(pattern, text))
            .min()
    }

    /// Byte offset where a trailing, not yet complete open delimiter begins.
    ///
    /// Text ending in `"@@<WEAT"` could become a block once more text
    /// arrives, so it must not be shown yet. A complete open delimiter is
    /// not reported here; see [`Extractor::unclosed_block_start`].
    pub fn pending_marker_start(&self, text: &str) -> Option<usize> {
        let mut longest = 0;

        for kind in TaggedBlockKind::ALL {
            for marker in self.convention.open_markers() {
                let delimiter = format!("{marker}<{}>", kind.tag_name());
                // Proper prefixes only, longest first
                for len in (1..delimiter.len()).rev() {
                    if len <= longest {
                        break;
                    }
                    if text.ends_with(&delimiter[..len]) {
                        longest = len;
                        break;
                    }
                }
            }
        }

        (longest > 0).then(|| text.len() - longest)
    }

    fn unclosed_open_of(&self, pattern: &KindPattern, text: &str) -> Option<usize> {
        pattern
            .open
            .find_iter(text)
            .find(|m| !text[m.end()..].contains(&pattern.close))
            .map(|m| m.start())
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MarkerConvention::default())
    }
}

static DEFAULT_EXTRACTOR: OnceLock<Extractor> = OnceLock::new();

/// Extract blocks using the default marker convention
pub fn extract(raw_text: &str) -> ExtractionResult {
    DEFAULT_EXTRACTOR.get_or_init(Extractor::default).extract(raw_text)
}
