//! Directive ("magic") parsing and classification.
//!
//! A cell submission is split into a maximal leading run of `%`-prefixed
//! directive lines and a trailing payload. Directive lines are partitioned
//! into two disjoint ordered groups: state magics that act on the graph
//! store, and config magics that act on the remote query configuration.
//! Anything whose leading token is not a known state magic goes to the
//! config group, where unrecognized names surface as a non-fatal
//! notification.

use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};

/// Sigil that introduces a directive line.
pub const MAGIC_SIGIL: char = '%';

/// Closed enumeration of graph-state directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StateMagicKind {
    Data,
    Shapes,
    Validate,
    Clear,
    Show,
    Help,
}

/// A parsed state directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMagic {
    pub kind: StateMagicKind,
    pub args: Vec<String>,
    /// The original line, kept for diagnostics.
    pub raw: String,
}

/// Result of splitting one cell into directives and payload.
#[derive(Debug, Clone, Default)]
pub struct MagicBlock {
    /// State directives, original relative order.
    pub state: Vec<StateMagic>,
    /// Raw config directive lines, original relative order.
    pub config: Vec<String>,
    /// Everything after the directive block, comment lines removed.
    pub payload: String,
    /// True when the cell contained no effective lines at all.
    empty: bool,
}

impl MagicBlock {
    /// Split a raw cell into the directive block and the payload.
    ///
    /// The directive block is the maximal leading run of `%`-lines; if the
    /// first effective line is not a directive the block is empty and the
    /// whole cell is payload. Line order is never changed.
    pub fn parse(code: &str) -> Self {
        let lines = split_lines(code);
        if lines.is_empty() {
            return Self {
                empty: true,
                ..Self::default()
            };
        }

        let mut state = Vec::new();
        let mut config = Vec::new();
        let mut consumed = 0;
        for line in &lines {
            if !line.starts_with(MAGIC_SIGIL) {
                break;
            }
            consumed += 1;
            match parse_state_line(line) {
                Some(magic) => state.push(magic),
                None => config.push((*line).to_string()),
            }
        }

        Self {
            state,
            config,
            payload: lines[consumed..].join("\n"),
            empty: false,
        }
    }

    /// True when the cell held nothing but blank lines and comments.
    pub fn is_empty_input(&self) -> bool {
        self.empty
    }
}

/// Split into effective lines: trimmed, with blank lines and `#` comments
/// removed, order preserved.
pub fn split_lines(code: &str) -> Vec<&str> {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn parse_state_line(line: &str) -> Option<StateMagic> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next()?;
    let name = head.strip_prefix(MAGIC_SIGIL)?;
    let kind = StateMagicKind::from_str(name).ok()?;
    Some(StateMagic {
        kind,
        args: tokens.map(str::to_string).collect(),
        raw: line.to_string(),
    })
}

/// All state magic names, sigil included, in declaration order.
pub fn state_magic_names() -> Vec<String> {
    use strum::IntoEnumIterator;
    StateMagicKind::iter()
        .map(|kind| format!("{MAGIC_SIGIL}{kind}"))
        .collect()
}
