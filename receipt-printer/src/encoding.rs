//! Text encoding utilities for receipt printers
//!
//! Receipt printers sold with POS kits default to a single-byte code page.
//! Text is laid out in characters and converted to PC858 at build time:
//! - every character occupies one column, except `₹` which prints as `Rs.`
//! - ASCII bytes (and therefore ESC/POS commands) pass through untouched

use tracing::instrument;

/// ESC t 19 - select code page PC858 (Latin-1 + Euro)
const SELECT_PC858: [u8; 3] = [0x1B, 0x74, 19];

/// Printed width of a string in columns
pub fn text_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c {
        '₹' => 3,
        _ => 1,
    }
}

/// Truncate a string to fit within a column width
pub fn truncate_text(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let w = char_width(c);
        if width + w > max_width {
            break;
        }
        result.push(c);
        width += w;
    }
    result
}

/// Pad a string to a specific column width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current_width = text_width(s);
    if current_width >= width {
        return truncate_text(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Word-wrap text into lines of at most `width` columns
///
/// Words longer than a full line are hard-split.
pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in s.split_whitespace() {
        let mut word = word.to_string();
        while text_width(&word) > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head = truncate_text(&word, width);
            word = word[head.len()..].to_string();
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word;
        } else if text_width(&current) + 1 + text_width(&word) <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to PC858
///
/// ASCII bytes are copied as is, which keeps ESC/POS commands intact.
/// Non-ASCII characters are mapped to their PC858 byte, `₹` becomes `Rs.`
/// and anything without a mapping prints as `?`.
#[instrument(skip(bytes))]
pub fn encode_pc858(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + SELECT_PC858.len());
    result.extend_from_slice(&SELECT_PC858);

    let text = String::from_utf8_lossy(bytes);
    let mut i = 0;
    let raw = text.as_bytes();
    while i < raw.len() {
        let b = raw[i];
        if b == 0x1B && raw.get(i + 1) == Some(&0x40) {
            // ESC @ resets the code page, select it again
            result.extend_from_slice(&[0x1B, 0x40]);
            result.extend_from_slice(&SELECT_PC858);
            i += 2;
            continue;
        }
        if b < 0x80 {
            result.push(b);
            i += 1;
            continue;
        }
        // Start of a multi-byte UTF-8 sequence
        let c = text[i..].chars().next().unwrap_or('?');
        match c {
            '₹' => result.extend_from_slice(b"Rs."),
            other => result.push(pc858_byte(other)),
        }
        i += c.len_utf8();
    }
    result
}

fn pc858_byte(c: char) -> u8 {
    match c {
        'Ç' => 0x80,
        'ü' => 0x81,
        'é' => 0x82,
        'â' => 0x83,
        'ä' => 0x84,
        'à' => 0x85,
        'ç' => 0x87,
        'ê' => 0x88,
        'è' => 0x8A,
        'ï' => 0x8B,
        'î' => 0x8C,
        'Ä' => 0x8E,
        'É' => 0x90,
        'ô' => 0x93,
        'ö' => 0x94,
        'û' => 0x96,
        'ù' => 0x97,
        'Ö' => 0x99,
        'Ü' => 0x9A,
        '£' => 0x9C,
        'á' => 0xA0,
        'í' => 0xA1,
        'ó' => 0xA2,
        'ú' => 0xA3,
        'ñ' => 0xA4,
        'Ñ' => 0xA5,
        '€' => 0xD5,
        '°' => 0xF8,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("hello"), 5);
        assert_eq!(text_width("₹100"), 6);
        assert_eq!(text_width("café"), 4);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello world", 5), "hello");
        assert_eq!(truncate_text("₹₹", 4), "₹");
    }

    #[test]
    fn test_pad_text() {
        assert_eq!(pad_text("hi", 5, false), "hi   ");
        assert_eq!(pad_text("hi", 5, true), "   hi");
        assert_eq!(pad_text("hello world", 5, false), "hello");
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("12 Market Road, Near Bus Stand, Pune 411001", 20);
        assert_eq!(lines, vec!["12 Market Road, Near", "Bus Stand, Pune", "411001"]);
        assert!(lines.iter().all(|l| text_width(l) <= 20));

        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_encode_pc858() {
        let out = encode_pc858("Total ₹5 café".as_bytes());
        assert_eq!(&out[..3], &SELECT_PC858);
        assert_eq!(&out[3..], b"Total Rs.5 caf\x82");
    }

    #[test]
    fn test_encode_reselects_after_init() {
        let out = encode_pc858(&[0x1B, 0x40, b'A']);
        assert_eq!(
            out,
            vec![0x1B, 0x74, 19, 0x1B, 0x40, 0x1B, 0x74, 19, b'A']
        );
    }
}
