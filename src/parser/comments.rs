//! Comment groups of a Rust source file and positional comment association.
//!
//! The syntax tree drops plain comments, so they are recovered from the raw
//! text with a small lexer that knows enough Rust to not mistake the inside of
//! a string, raw string, char literal or lifetime for a comment.
//!
//! Inner doc comments (`//!`, `/*! */`) document the enclosing module and are
//! never part of a group.

use crate::types::Pos;

/// Consecutive comments with no blank line or code between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub start: Pos,
    /// Position just past the last comment character.
    pub end: Pos,
    raw: Vec<String>,
}

impl CommentGroup {
    /// The comment text without markers, joined with `\n`.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for raw in &self.raw {
            if let Some(body) = raw.strip_prefix("/*") {
                let body = body.strip_suffix("*/").unwrap_or(body);
                let body = body.strip_prefix('*').unwrap_or(body);
                for (i, line) in body.lines().enumerate() {
                    let line = if i == 0 {
                        line
                    } else {
                        let trimmed = line.trim_start();
                        trimmed.strip_prefix('*').unwrap_or(trimmed)
                    };
                    lines.push(strip_one_space(line).trim_end().to_string());
                }
            } else {
                let body = match raw.strip_prefix("///") {
                    Some(doc) if !doc.starts_with('/') => doc,
                    _ => raw.strip_prefix("//").unwrap_or(raw),
                };
                lines.push(strip_one_space(body).trim_end().to_string());
            }
        }

        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        match (first, last) {
            (Some(first), Some(last)) => lines[first..=last].join("\n"),
            _ => String::new(),
        }
    }
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

struct Cursor {
    chars: Vec<char>,
    i: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            i: 0,
            line: 1,
            column: 0,
        }
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek(0)?;
        self.i += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    /// Skip an escape-aware quoted literal whose opening quote is current.
    fn skip_quoted(&mut self, quote: char) {
        self.bump();
        while let Some(ch) = self.bump() {
            match ch {
                '\\' => {
                    self.bump();
                }
                c if c == quote => break,
                _ => {}
            }
        }
    }

    /// Skip `r#*"..."#*`; the cursor is on the opening `"`.
    fn skip_raw(&mut self, hashes: usize) {
        self.bump();
        while let Some(ch) = self.bump() {
            if ch == '"' && (0..hashes).all(|k| self.peek(k) == Some('#')) {
                self.bump_n(hashes);
                break;
            }
        }
    }

    fn take_line_comment(&mut self) -> String {
        let mut raw = String::new();
        while let Some(ch) = self.peek(0) {
            if ch == '\n' {
                break;
            }
            raw.push(ch);
            self.bump();
        }
        raw.trim_end_matches('\r').to_string()
    }

    /// Block comments nest in Rust.
    fn take_block_comment(&mut self) -> String {
        let mut raw = String::new();
        let mut depth = 0usize;
        while let Some(ch) = self.peek(0) {
            if ch == '/' && self.peek(1) == Some('*') {
                depth += 1;
                raw.push_str("/*");
                self.bump_n(2);
            } else if ch == '*' && self.peek(1) == Some('/') {
                depth = depth.saturating_sub(1);
                raw.push_str("*/");
                self.bump_n(2);
                if depth == 0 {
                    break;
                }
            } else {
                raw.push(ch);
                self.bump();
            }
        }
        raw
    }

    /// Length of a string-literal prefix (`b`, `c`, `r`, `br`, `cr` plus
    /// hashes) at the cursor, the number of hashes, and whether it is raw.
    fn literal_prefix(&self) -> Option<(usize, usize, bool)> {
        let mut k = 0;
        if matches!(self.peek(0), Some('b' | 'c')) {
            k += 1;
        }
        let raw = self.peek(k) == Some('r');
        if raw {
            k += 1;
        }
        if k == 0 {
            return None;
        }
        let mut hashes = 0;
        if raw {
            while self.peek(k) == Some('#') {
                hashes += 1;
                k += 1;
            }
        }
        match self.peek(k) {
            Some('"') => Some((k, hashes, raw)),
            Some('\'') if !raw && k == 1 && self.peek(0) == Some('b') => Some((k, 0, false)),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Grouper {
    groups: Vec<CommentGroup>,
    current: Option<CommentGroup>,
    newlines: usize,
    code: bool,
}

impl Grouper {
    fn push(&mut self, start: Pos, end: Pos, raw: String) {
        match self.current.as_mut() {
            Some(group) if !self.code && self.newlines <= 1 => {
                group.end = end;
                group.raw.push(raw);
            }
            _ => {
                self.flush();
                self.current = Some(CommentGroup {
                    start,
                    end,
                    raw: vec![raw],
                });
            }
        }
        self.newlines = 0;
        self.code = false;
    }

    fn flush(&mut self) {
        if let Some(group) = self.current.take() {
            self.groups.push(group);
        }
    }

    fn finish(mut self) -> Vec<CommentGroup> {
        self.flush();
        self.groups
    }
}

/// Collect the comment groups of `source` in source order.
pub fn collect_comments(source: &str) -> Vec<CommentGroup> {
    let mut cur = Cursor::new(source);
    let mut grouper = Grouper::default();
    let mut prev: Option<char> = None;

    while let Some(ch) = cur.peek(0) {
        let after_ident = prev.is_some_and(|c| c.is_alphanumeric() || c == '_');
        match ch {
            '/' if cur.peek(1) == Some('/') => {
                let start = cur.pos();
                let raw = cur.take_line_comment();
                if raw.starts_with("//!") {
                    grouper.code = true;
                } else {
                    grouper.push(start, cur.pos(), raw);
                }
                prev = None;
                continue;
            }
            '/' if cur.peek(1) == Some('*') => {
                let start = cur.pos();
                let raw = cur.take_block_comment();
                if raw.starts_with("/*!") {
                    grouper.code = true;
                } else {
                    grouper.push(start, cur.pos(), raw);
                }
                prev = None;
                continue;
            }
            '"' => cur.skip_quoted('"'),
            'b' | 'c' | 'r' if !after_ident => match cur.literal_prefix() {
                Some((k, hashes, raw)) => {
                    cur.bump_n(k);
                    match (raw, cur.peek(0)) {
                        (true, _) => cur.skip_raw(hashes),
                        (false, Some(quote)) => cur.skip_quoted(quote),
                        (false, None) => {}
                    }
                }
                None => {
                    cur.bump();
                    prev = Some(ch);
                    grouper.code = true;
                    continue;
                }
            },
            '\'' => {
                if cur.peek(1) == Some('\\') {
                    cur.skip_quoted('\'');
                } else if cur.peek(2) == Some('\'') {
                    cur.bump_n(3);
                } else {
                    // lifetime or label
                    cur.bump();
                }
            }
            '\n' => {
                cur.bump();
                grouper.newlines += 1;
                prev = None;
                continue;
            }
            c if c.is_whitespace() => {
                cur.bump();
                prev = None;
                continue;
            }
            _ => {
                cur.bump();
            }
        }
        grouper.code = true;
        prev = Some(ch);
    }

    grouper.finish()
}

/// Index of the comment group documenting the declaration at `pos`.
///
/// `boundaries` are the sorted end positions of declarations and the open
/// braces of bodies. The group must end before `pos` and start after the
/// closest boundary before `pos`, on a later line than that boundary.
pub fn search_comment(comments: &[CommentGroup], boundaries: &[Pos], pos: Pos) -> Option<usize> {
    let idx = comments.partition_point(|c| c.end <= pos);
    let candidate = idx.checked_sub(1)?;
    let group = &comments[candidate];

    let below = boundaries.partition_point(|b| *b < pos);
    if let Some(lower) = below.checked_sub(1).map(|i| boundaries[i]) {
        if group.start <= lower || group.start.line == lower.line {
            return None;
        }
    }
    Some(candidate)
}
