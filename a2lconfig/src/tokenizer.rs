/// One cleaned line of input
///
/// `text` has been stripped of comments, whitespace runs are collapsed to single spaces and
/// one layer of enclosing double quotes has been removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineToken<'a> {
    pub(crate) text: String,
    pub(crate) raw: &'a str,
    pub(crate) line: u32,
}

/// Reads tokens line by line
///
/// Every line of the input yields at most one token. Lines that are empty after comment
/// stripping do not yield a token. The reader cannot be restarted.
pub(crate) struct TokenReader<'a, S: AsRef<str>> {
    lines: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> TokenReader<'a, S> {
    pub(crate) fn new(lines: &'a [S]) -> Self {
        Self { lines, pos: 0 }
    }

    /// the line number of the most recently consumed line
    pub(crate) fn line(&self) -> u32 {
        u32::try_from(self.pos).unwrap_or(u32::MAX)
    }

    /// get the next token, skipping all lines that contain no data
    pub(crate) fn next_token(&mut self) -> Option<LineToken<'a>> {
        while let Some(raw) = self.next_line() {
            if let Some(text) = clean_line(raw) {
                return Some(LineToken {
                    text,
                    raw,
                    line: self.line(),
                });
            }
        }
        None
    }

    /// discard the next line, even if it only contains a block comment
    ///
    /// Blank lines and lines that start with a line comment are skipped first, because they
    /// are not considered part of the content.
    /// Returns false if the end of the input was reached.
    pub(crate) fn skip_line(&mut self) -> bool {
        while let Some(raw) = self.next_line() {
            if strip_comments(raw).is_some() {
                return true;
            }
        }
        false
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let raw = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(raw.as_ref())
    }
}

impl<'a, S: AsRef<str>> Iterator for TokenReader<'a, S> {
    type Item = LineToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// split text into lines at any unicode line break
///
/// "\r\n" counts as a single line break. A trailing line break produces a final empty line.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::with_capacity(text.len() / 32);
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let is_break = matches!(
            c,
            '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
        );
        if is_break {
            lines.push(&text[start..pos]);
            let mut next_start = pos + c.len_utf8();
            if c == '\r' {
                if let Some((_, '\n')) = chars.peek() {
                    chars.next();
                    next_start += 1;
                }
            }
            start = next_start;
        }
    }
    lines.push(&text[start..]);

    lines
}

// strip_comments()
// Returns None for lines that are not considered to be content at all: blank lines, lines
// starting with a line comment and lines starting with an unclosed block comment.
// A line that contained only a closed block comment returns an empty string.
fn strip_comments(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return None;
    }

    let mut value = trimmed;
    if let Some(after_opener) = value.strip_prefix("/*") {
        // only a closing marker on the same line is recognized
        let endpos = after_opener.find("*/")?;
        value = after_opener[endpos + 2..].trim();
    }
    if let Some(pos) = value.find("/*") {
        value = value[..pos].trim();
    }
    if let Some(pos) = value.find("//") {
        value = value[..pos].trim();
    }

    Some(value)
}

// the token text of a line, if the line has any content after comment stripping.
// Note that a line containing only "" yields an empty token.
fn clean_line(raw: &str) -> Option<String> {
    let value = strip_comments(raw)?;
    if value.is_empty() {
        None
    } else {
        Some(unquote(&normalize_spaces(value)).to_string())
    }
}

fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// remove exactly one layer of enclosing double quotes
pub(crate) fn unquote(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
