//! Tab completion and contextual help over the static vocabulary.
//!
//! Pure functions over the cell text and a cursor offset; no session
//! state is consulted.

use crate::magic::{MAGIC_SIGIL, state_magic_names};
use crate::model::{CompleteReply, InspectReply};
use crate::router::help_text;
use crate::sparql::{KEYWORD_HELP, MAGICS, SPARQL_KEYWORDS};

/// Extract the token under the cursor: the contiguous alphabetic run
/// around `pos`, plus one leading `%` when present. Returns the token and
/// its byte offset. A cursor inside a multi-byte character snaps back to
/// its start.
pub fn token_at_cursor(code: &str, pos: usize) -> (&str, usize) {
    let bytes = code.as_bytes();
    let len = bytes.len();
    let mut pos = pos.min(len);
    while pos > 0 && !code.is_char_boundary(pos) {
        pos -= 1;
    }

    let mut end = pos;
    while end < len && bytes[end].is_ascii_alphabetic() {
        end += 1;
    }
    let mut start = pos;
    while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] == MAGIC_SIGIL as u8 {
        start -= 1;
    }
    (&code[start..end], start)
}

/// A token is a magic when it carries the sigil and sits at the start of
/// a line.
fn is_magic(token: &str, start: usize, code: &str) -> bool {
    token.starts_with(MAGIC_SIGIL)
        && (start == 0 || code.as_bytes()[start - 1] == b'\n')
}

/// Candidate names for the token under the cursor, discovery order:
/// magic names when the token is a magic, SPARQL keywords otherwise.
pub fn complete(code: &str, pos: usize) -> CompleteReply {
    let (token, start) = token_at_cursor(code, pos);
    let lower = token.to_lowercase();

    let matches: Vec<String> = if is_magic(token, start, code) {
        state_magic_names()
            .into_iter()
            .chain(MAGICS.keys().map(|name| (*name).to_string()))
            .filter(|name| name.starts_with(&lower))
            .collect()
    } else {
        SPARQL_KEYWORDS
            .iter()
            .filter(|keyword| keyword.to_lowercase().starts_with(&lower))
            .map(|keyword| (*keyword).to_string())
            .collect()
    };

    if matches.is_empty() {
        CompleteReply {
            matches,
            cursor_start: pos,
            cursor_end: pos,
        }
    } else {
        CompleteReply {
            matches,
            cursor_start: start,
            cursor_end: pos,
        }
    }
}

/// Contextual help for the token under the cursor.
///
/// Keywords are looked up upper-cased; a bare `%` yields the full help
/// text; magics fall back from the config table to the state magic
/// descriptions. A miss reports `found = false` with a placeholder.
pub fn inspect(code: &str, pos: usize) -> InspectReply {
    let (token, start) = token_at_cursor(code, pos);

    let info: Option<String> = if !is_magic(token, start, code) {
        KEYWORD_HELP
            .get(token.to_uppercase().as_str())
            .map(|help| (*help).to_string())
    } else if token == "%" {
        Some(help_text())
    } else {
        MAGICS
            .get(token)
            .map(|(args, help)| format!("{token} {args}\n\n{help}"))
            .or_else(|| state_magic_help(token).map(str::to_string))
    };

    match info {
        Some(text) => InspectReply { found: true, text },
        None => InspectReply {
            found: false,
            text: "No help available".to_string(),
        },
    }
}

fn state_magic_help(token: &str) -> Option<&'static str> {
    match token {
        "%data" => Some("Load data graph in Turtle format"),
        "%shapes" => Some("Load shapes graph in Turtle format"),
        "%validate" => Some("Validate data against shapes"),
        "%show" => Some("Show current graphs"),
        "%clear" => Some("Clear all graphs"),
        "%help" => Some("Show comprehensive help"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_spans_alphabetic_run() {
        let code = "SELECT * WHERE { ?s ?p ?o }";
        assert_eq!(token_at_cursor(code, 3), ("SELECT", 0));
        assert_eq!(token_at_cursor(code, 11), ("WHERE", 9));
    }

    #[test]
    fn cursor_inside_multibyte_character_snaps_back() {
        assert_eq!(token_at_cursor("é", 1), ("", 0));
        // "café" is 5 bytes; offset 4 sits inside the final character.
        assert_eq!(token_at_cursor("caf\u{e9}", 4), ("caf", 0));
        let reply = complete("ex:caf\u{e9} ", 7);
        assert_eq!(reply.cursor_start, reply.cursor_end);
        let reply = inspect("\"h\u{e9}llo\"@fr", 3);
        assert!(!reply.found);
    }

    #[test]
    fn token_picks_up_leading_sigil() {
        assert_eq!(token_at_cursor("%data", 3), ("%data", 0));
        assert_eq!(token_at_cursor("x %data", 5), ("%data", 2));
    }

    #[test]
    fn magic_prefix_completes_magic_names() {
        let reply = complete("%da", 3);
        assert_eq!(reply.matches, vec!["%data".to_string()]);
        assert_eq!(reply.cursor_start, 0);
        assert_eq!(reply.cursor_end, 3);
    }

    #[test]
    fn magic_completion_requires_line_start() {
        let reply = complete("x %da", 5);
        assert!(reply.matches.is_empty());
        let reply = complete("x\n%da", 5);
        assert_eq!(reply.matches, vec!["%data".to_string()]);
    }

    #[test]
    fn keyword_completion_is_case_insensitive() {
        let reply = complete("sel", 3);
        assert_eq!(reply.matches, vec!["SELECT".to_string()]);
    }

    #[test]
    fn no_match_collapses_cursor_range() {
        let reply = complete("zzz", 3);
        assert!(reply.matches.is_empty());
        assert_eq!(reply.cursor_start, 3);
        assert_eq!(reply.cursor_end, 3);
    }

    #[test]
    fn inspect_finds_keyword_help() {
        let reply = inspect("select", 3);
        assert!(reply.found);
        assert!(reply.text.contains("SELECT"));
    }

    #[test]
    fn inspect_finds_magic_help() {
        let reply = inspect("%endpoint", 4);
        assert!(reply.found);
        assert!(reply.text.starts_with("%endpoint <url>"));

        let reply = inspect("%validate", 4);
        assert!(reply.found);
        assert_eq!(reply.text, "Validate data against shapes");
    }

    #[test]
    fn inspect_miss_reports_not_found() {
        let reply = inspect("zzzz", 2);
        assert!(!reply.found);
        assert_eq!(reply.text, "No help available");
    }
}
