// src/blocks/parser.rs

//! Block definition scanner.
//!
//! The definition file is a sequence of blocks:
//!
//! ```text
//! dev {
//!   $ echo starting
//!   % python -m http.server
//!   @ npm run watch
//! }
//! ```
//!
//! Scanning rules:
//! - A header is a top-level line made of an identifier (`[A-Za-z0-9_]+`),
//!   optional whitespace and `{`. Anything after the `{` on the header line is
//!   treated as the first body line.
//! - Inside a body, a non-command line ending in `{` opens a nested level and
//!   a line that is exactly `}` (after trimming) closes one. The block ends
//!   when the depth returns to zero. Nested text is kept verbatim in the body.
//! - A header whose block never closes is recorded as unterminated; since it
//!   swallows the rest of the file it is always the last entry.
//! - Text outside blocks is ignored.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::blocks::classify::{LineClass, classify};
use crate::errors::{BlockrunError, Result};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)\s*\{(.*)$").expect("block header pattern is valid")
});

/// One closed block as found in the definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    pub name: String,
    /// 1-based line number of the header.
    pub line: usize,
    /// Body lines exactly as written (untrimmed), excluding the closing `}`.
    pub body: Vec<String>,
}

impl BlockDefinition {
    /// The verbatim body text between the header and the closing brace.
    pub fn body_text(&self) -> String {
        self.body.join("\n")
    }

    /// Classify every non-blank body line, in source order.
    pub fn lines(&self) -> impl Iterator<Item = LineClass> + '_ {
        self.body
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(classify)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEntry {
    Closed(BlockDefinition),
    Unterminated { name: String, line: usize },
}

impl BlockEntry {
    pub fn name(&self) -> &str {
        match self {
            BlockEntry::Closed(block) => &block.name,
            BlockEntry::Unterminated { name, .. } => name,
        }
    }
}

/// Parsed definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionFile {
    entries: Vec<BlockEntry>,
}

impl DefinitionFile {
    pub fn parse(source: &str) -> Self {
        let mut scanner = Scanner::default();
        for (idx, raw) in source.lines().enumerate() {
            scanner.feed(idx + 1, raw);
        }
        scanner.finish()
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Every top-level header name in source order. Duplicate headers are
    /// listed as often as they appear.
    pub fn block_names(&self) -> Vec<&str> {
        self.entries.iter().map(BlockEntry::name).collect()
    }

    /// The first block with the given name.
    pub fn find(&self, name: &str) -> Result<&BlockDefinition> {
        match self.entries.iter().find(|entry| entry.name() == name) {
            Some(BlockEntry::Closed(block)) => Ok(block),
            Some(BlockEntry::Unterminated { name, line }) => Err(BlockrunError::UnterminatedBlock {
                name: name.clone(),
                line: *line,
            }),
            None => Err(BlockrunError::BlockNotFound(name.to_string())),
        }
    }
}

/// Command lines may end in `{` (`$ awk '{`) without opening a level.
fn is_command(trimmed: &str) -> bool {
    matches!(classify(trimmed), LineClass::Command(_))
}

struct OpenBlock {
    block: BlockDefinition,
    depth: usize,
}

#[derive(Default)]
struct Scanner {
    entries: Vec<BlockEntry>,
    open: Option<OpenBlock>,
}

impl Scanner {
    fn feed(&mut self, line_no: usize, raw: &str) {
        let trimmed = raw.trim();

        if self.open.is_none() {
            self.scan_top_level(line_no, trimmed);
            return;
        }
        let Some(open) = self.open.as_mut() else {
            return;
        };

        if trimmed == "}" {
            open.depth -= 1;
            if open.depth == 0 {
                if let Some(done) = self.open.take() {
                    debug!(block = %done.block.name, lines = done.block.body.len(), "parsed block");
                    self.entries.push(BlockEntry::Closed(done.block));
                }
                return;
            }
        } else if trimmed.ends_with('{') && !is_command(trimmed) {
            open.depth += 1;
        }

        open.block.body.push(raw.to_string());
    }

    fn scan_top_level(&mut self, line_no: usize, trimmed: &str) {
        let Some(caps) = HEADER.captures(trimmed) else {
            if !trimmed.is_empty() {
                debug!(line = line_no, "ignoring text outside of any block");
            }
            return;
        };

        let mut block = BlockDefinition {
            name: caps[1].to_string(),
            line: line_no,
            body: Vec::new(),
        };
        let rest = caps[2].trim();
        if !rest.is_empty() {
            block.body.push(rest.to_string());
        }

        self.open = Some(OpenBlock { block, depth: 1 });
    }

    fn finish(mut self) -> DefinitionFile {
        if let Some(open) = self.open.take() {
            self.entries.push(BlockEntry::Unterminated {
                name: open.block.name,
                line: open.block.line,
            });
        }
        DefinitionFile {
            entries: self.entries,
        }
    }
}
