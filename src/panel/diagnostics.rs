//! Error line location in interpreter diagnostics.
//!
//! Best effort: interpreter messages are free text, so this reads the common
//! `"<message> in <where> on line <N>"` shape and otherwise only notices that
//! something went wrong.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::types::ErrorMarker;

/// `<message> ... on line <N>`, case-insensitive
static LINE_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:PHP\s+)?(?P<message>.*?)\s+on\s+line\s+(?P<line>\d+)")
        .expect("Invalid line reference regex")
});

/// Location suffix the interpreter appends to a message
static LOCATION_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+in\s+(?:script|standard input code|command line code)\b.*$")
        .expect("Invalid location suffix regex")
});

static ERROR_KEYWORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:error|exception)\b").expect("Invalid error keyword regex")
});

/// Marker for the first line reference in `stderr`.
///
/// Falls back to line 1 when an error is reported without a line, and to `None`
/// when there is no error signal at all.
pub fn locate_error(stderr: &str) -> Option<ErrorMarker> {
    for line in stderr.lines() {
        let Some(caps) = LINE_REFERENCE_REGEX.captures(line) else {
            continue;
        };
        let Ok(number) = caps["line"].parse::<u32>() else {
            continue;
        };
        let message = LOCATION_SUFFIX_REGEX.replace(&caps["message"], "");
        return Some(ErrorMarker {
            line: number.max(1),
            message: message.trim().to_string(),
        });
    }

    if ERROR_KEYWORD_REGEX.is_match(stderr) {
        let message = stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default();
        return Some(ErrorMarker {
            line: 1,
            message: message.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_line_reference() {
        let marker = locate_error("Parse error: syntax error, unexpected token on line 7").unwrap();
        assert_eq!(marker.line, 7);
        assert_eq!(marker.message, "Parse error: syntax error, unexpected token");
    }

    #[test]
    fn cuts_location_suffix() {
        let marker = locate_error(
            "PHP Fatal error:  Uncaught Error: Call to undefined function foo() in script on line 3",
        )
        .unwrap();
        assert_eq!(marker.line, 3);
        assert_eq!(
            marker.message,
            "Fatal error:  Uncaught Error: Call to undefined function foo()"
        );

        let marker =
            locate_error("Warning: Undefined variable $x in Command line code on line 12").unwrap();
        assert_eq!(marker.line, 12);
        assert_eq!(marker.message, "Warning: Undefined variable $x");
    }

    #[test]
    fn matches_case_insensitively() {
        let marker = locate_error("parse ERROR: unexpected end of file ON LINE 2").unwrap();
        assert_eq!(marker.line, 2);
    }

    #[test]
    fn keyword_without_line_marks_first_line() {
        let marker = locate_error("\nUncaught Exception: nope\n").unwrap();
        assert_eq!(marker.line, 1);
        assert_eq!(marker.message, "Uncaught Exception: nope");
    }

    #[test]
    fn no_signal_means_no_marker() {
        assert_eq!(locate_error(""), None);
        assert_eq!(locate_error("Deprecated: something old"), None);
    }
}
