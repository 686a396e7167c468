//! RFC 5545 §3.1 line folding and TEXT escaping.

/// Line break followed by a single space: the fold sequence.
pub const FOLD: &str = "\r\n ";

/// Maximum length of a description segment, in characters.
const DESCRIPTION_SEGMENT: usize = 75;

/// Maximum length of a content line, in octets.
const CONTENT_LINE_OCTETS: usize = 75;

/// Fold an invite description.
///
/// Descriptions of at most 75 characters are returned unmodified. Longer
/// ones get each embedded newline replaced by the fold sequence and are then
/// cut into 75-character segments joined by the fold sequence; the last
/// segment is appended as is. A replaced newline counts as one character of
/// its segment.
pub fn fold_description(description: &str) -> String {
    let normalized = description.replace("\r\n", "\n");
    if normalized.chars().count() <= DESCRIPTION_SEGMENT {
        return description.to_string();
    }

    let mut folded = String::with_capacity(normalized.len() + normalized.len() / 25);

    for (i, ch) in normalized.chars().enumerate() {
        if i > 0 && i % DESCRIPTION_SEGMENT == 0 {
            folded.push_str(FOLD);
        }
        if ch == '\n' {
            folded.push_str(FOLD);
        } else {
            folded.push(ch);
        }
    }

    folded
}

/// Fold a complete content line so no physical line exceeds 75 octets.
/// Never splits a UTF-8 sequence.
pub fn fold_content_line(line: &str) -> String {
    if line.len() <= CONTENT_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / 24);
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > CONTENT_LINE_OCTETS {
            folded.push_str(FOLD);
            // the leading space of the continuation line
            used = 1;
        }
        folded.push(ch);
        used += width;
    }

    folded
}

/// Escape a TEXT value (backslash, semicolon, comma, newline).
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escape an already folded description, leaving the fold sequences intact.
pub fn escape_folded(folded: &str) -> String {
    folded
        .split(FOLD)
        .map(escape_text)
        .collect::<Vec<_>>()
        .join(FOLD)
}
