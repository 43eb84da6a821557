//! SMTP reply line parsing.
//!
//! Replies are one or more lines of the form `<code><sep><text>`:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
//!
//! Only the code and the separator matter to the session. Both functions
//! here accept arbitrary input without panicking.

use crate::types::ReplyCode;

/// Minimum length of a well-formed reply line (code plus separator).
const MIN_LINE_LEN: usize = 4;

/// Extracts the reply code from the first three characters of a line.
///
/// Lines shorter than four characters, or whose first three characters are
/// not all ASCII digits, yield [`ReplyCode::NONE`].
#[must_use]
pub fn parse_code(line: &str) -> ReplyCode {
    let bytes = line.as_bytes();
    if bytes.len() < MIN_LINE_LEN {
        return ReplyCode::NONE;
    }

    let digits = &bytes[..3];
    if !digits.iter().all(u8::is_ascii_digit) {
        return ReplyCode::NONE;
    }

    let code = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    ReplyCode::new(code)
}

/// Checks if a line is the last line of a reply.
///
/// The fourth character is a space on the final line and a dash on
/// continuation lines. Short lines are never final.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() >= MIN_LINE_LEN && line.as_bytes()[3] == b' '
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_line_code() {
        assert_eq!(parse_code("250 OK"), ReplyCode::OK);
        assert_eq!(parse_code("220 smtp.example.com ESMTP ready").as_u16(), 220);
    }

    #[test]
    fn test_parse_continuation_code() {
        assert_eq!(parse_code("250-PIPELINING"), ReplyCode::OK);
    }

    #[test]
    fn test_parse_non_numeric() {
        assert_eq!(parse_code("ABC OK"), ReplyCode::NONE);
        assert_eq!(parse_code("2x0 OK"), ReplyCode::NONE);
        assert_eq!(parse_code(" 25 OK"), ReplyCode::NONE);
    }

    #[test]
    fn test_parse_short_lines() {
        assert_eq!(parse_code(""), ReplyCode::NONE);
        assert_eq!(parse_code("25"), ReplyCode::NONE);
        assert_eq!(parse_code("250"), ReplyCode::NONE);
    }

    #[test]
    fn test_parse_multibyte_prefix() {
        assert_eq!(parse_code("é50 OK"), ReplyCode::NONE);
        assert!(!is_last_reply_line("éé"));
    }

    #[test]
    fn test_is_last_reply_line() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("250 "));
        assert!(!is_last_reply_line("250-Continuing"));
        assert!(!is_last_reply_line("250"));
        assert!(!is_last_reply_line(""));
    }

    proptest! {
        /// Arbitrary input never panics and short input is never final
        #[test]
        fn prop_arbitrary_lines_are_safe(line in ".{0,16}") {
            let code = parse_code(&line);
            let last = is_last_reply_line(&line);
            if line.len() < 4 {
                prop_assert_eq!(code, ReplyCode::NONE);
                prop_assert!(!last);
            }
        }

        /// Well-formed lines yield their code and separator
        #[test]
        fn prop_well_formed_lines(code in 100u16..600, last in any::<bool>(), text in "[ -~]{0,32}") {
            let sep = if last { ' ' } else { '-' };
            let line = format!("{code}{sep}{text}");
            prop_assert_eq!(parse_code(&line).as_u16(), code);
            prop_assert_eq!(is_last_reply_line(&line), last);
        }
    }
}
