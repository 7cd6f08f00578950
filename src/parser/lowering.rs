//! Rewrites Apex-only syntax into shapes the Java grammar accepts.
//!
//! Every rewrite keeps the byte length and every newline of the input, so
//! node positions in the tree built from the lowered text are positions in
//! the original source. Node text is always read from the original.
//!
//! Rewrites, in order:
//!
//! - inline SOQL/SOSL `[SELECT ...]` becomes a parenthesized `null`
//! - property accessor blocks `{ get; set; }` close the field with `;`
//! - `override`, `virtual`, `global`, `webservice`, `testMethod` and the
//!   sharing clauses are blanked
//! - DML statement keywords (`insert acc;`) are blanked
//! - `switch on x {` becomes `switch (x){` and its arms `when 1 {` /
//!   `when else {` become `case 1:{` / `default  :{`
//!
//! Keywords match case-insensitively. Comments and string literals are
//! never touched.

/// Blanked modifier keywords.
const MODIFIERS: &[&str] = &["override", "virtual", "global", "webservice", "testmethod"];

/// Keywords that may precede `sharing`.
const SHARING_PREFIXES: &[&str] = &["with", "without", "inherited"];

/// DML statement keywords.
const DML_KEYWORDS: &[&str] = &["insert", "update", "upsert", "delete", "undelete"];

/// Access modifiers allowed in front of a property accessor.
const ACCESSOR_MODIFIERS: &[&str] = &["public", "private", "protected", "global"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Punct(u8),
    Str,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

impl Token {
    fn is_word(&self, bytes: &[u8], word: &str) -> bool {
        self.kind == TokenKind::Word
            && bytes[self.start..self.end].eq_ignore_ascii_case(word.as_bytes())
    }

    fn is_any_word(&self, bytes: &[u8], words: &[&str]) -> bool {
        words.iter().any(|w| self.is_word(bytes, w))
    }

    fn is_punct(&self, c: u8) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

/// Lower Apex source into bytes the Java grammar parses.
///
/// The result has the same length as `source` and newlines at the same
/// offsets.
pub fn lower(source: &str) -> Vec<u8> {
    let mut bytes = source.as_bytes().to_vec();
    lower_queries(&mut bytes);
    lower_properties(&mut bytes);
    lower_statements(&mut bytes);
    bytes
}

/// Split into words, punctuation and string literals, skipping whitespace
/// and comments.
fn tokenize(bytes: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if bytes[i..].starts_with(b"//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if bytes[i..].starts_with(b"/*") {
            i += 2;
            while i < bytes.len() && !bytes[i..].starts_with(b"*/") {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else if c == b'\'' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != b'\'' && bytes[i] != b'\n' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            tokens.push(Token {
                kind: TokenKind::Str,
                start,
                end: i,
            });
        } else if c.is_ascii_alphanumeric() || c == b'_' || !c.is_ascii() {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || !bytes[i].is_ascii())
            {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word,
                start,
                end: i,
            });
        } else {
            tokens.push(Token {
                kind: TokenKind::Punct(c),
                start: i,
                end: i + 1,
            });
            i += 1;
        }
    }
    tokens
}

/// Replace `bytes[start..end]` with spaces, keeping line breaks.
fn blank(bytes: &mut [u8], start: usize, end: usize) {
    for b in &mut bytes[start..end] {
        if *b != b'\n' && *b != b'\r' {
            *b = b' ';
        }
    }
}

/// Index of the token closing the bracket opened at `open`.
fn matching(tokens: &[Token], open: usize, open_c: u8, close_c: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct(open_c) {
            depth += 1;
        } else if token.is_punct(close_c) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Whether the byte right before `pos` is a horizontal space that a
/// separator can take over.
fn space_before(bytes: &[u8], pos: usize, floor: usize) -> Option<usize> {
    let before = pos.checked_sub(1)?;
    (before >= floor && matches!(bytes[before], b' ' | b'\t')).then_some(before)
}

fn lower_queries(bytes: &mut [u8]) {
    let tokens = tokenize(bytes);
    let mut i = 0;
    while i + 1 < tokens.len() {
        let keyword = tokens[i + 1];
        if tokens[i].is_punct(b'[') && keyword.is_any_word(bytes, &["select", "find"]) {
            if let Some(close) = matching(&tokens, i, b'[', b']') {
                let (open, close_at) = (tokens[i].start, tokens[close].start);
                blank(bytes, open, close_at + 1);
                bytes[open] = b'(';
                bytes[keyword.start..keyword.start + 4].copy_from_slice(b"null");
                bytes[close_at] = b')';
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
}

fn lower_properties(bytes: &mut [u8]) {
    let tokens = tokenize(bytes);
    let mut i = 1;
    while i < tokens.len() {
        if tokens[i].is_punct(b'{')
            && tokens[i - 1].kind == TokenKind::Word
            && opens_accessors(bytes, &tokens[i + 1..])
        {
            if let Some(close) = matching(&tokens, i, b'{', b'}') {
                let (open, close_at) = (tokens[i].start, tokens[close].start);
                blank(bytes, open, close_at + 1);
                bytes[open] = b';';
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
}

/// `[modifier] get|set ;|{` at the start of a block.
fn opens_accessors(bytes: &[u8], rest: &[Token]) -> bool {
    let mut tokens = rest
        .iter()
        .skip_while(|t| t.is_any_word(bytes, ACCESSOR_MODIFIERS));
    match (tokens.next(), tokens.next()) {
        (Some(accessor), Some(next)) => {
            accessor.is_any_word(bytes, &["get", "set"])
                && (next.is_punct(b';') || next.is_punct(b'{'))
        }
        _ => false,
    }
}

/// Pending rewrite for the next `{` seen at the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    /// `switch on` seen at `on`; the brace opens the arm list.
    SwitchBlock { on: usize },
    /// `when ...` seen; the brace opens the arm body.
    Arm { floor: usize },
}

fn lower_statements(bytes: &mut [u8]) {
    let tokens = tokenize(bytes);
    // One entry per open brace: whether it is a lowered switch block.
    let mut braces: Vec<bool> = Vec::new();
    let mut pending = Pending::None;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let next = tokens.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| tokens[p]);

        if token.is_any_word(bytes, MODIFIERS) && !is_member_access(prev, next) {
            blank(bytes, token.start, token.end);
        } else if token.is_any_word(bytes, SHARING_PREFIXES)
            && next.is_some_and(|n| n.is_word(bytes, "sharing"))
        {
            if let Some(sharing) = next {
                blank(bytes, token.start, sharing.end);
            }
            i += 2;
            continue;
        } else if token.is_any_word(bytes, DML_KEYWORDS)
            && starts_statement(bytes, prev)
            && next.is_some_and(|n| n.kind == TokenKind::Word)
        {
            blank(bytes, token.start, token.end);
        } else if token.is_word(bytes, "switch") && next.is_some_and(|n| n.is_word(bytes, "on")) {
            if let Some(on) = next {
                pending = Pending::SwitchBlock { on: on.start };
            }
            i += 2;
            continue;
        } else if token.is_word(bytes, "when") && braces.last() == Some(&true) {
            if next.is_some_and(|n| n.is_word(bytes, "else")) {
                if let Some(else_token) = next {
                    if !bytes[token.start..else_token.end].contains(&b'\n') {
                        blank(bytes, token.start, else_token.end);
                        bytes[token.start..token.start + 7].copy_from_slice(b"default");
                    }
                    pending = Pending::Arm { floor: else_token.end };
                }
                i += 2;
                continue;
            }
            bytes[token.start..token.end].copy_from_slice(b"case");
            pending = Pending::Arm { floor: token.end };
        } else if token.is_punct(b'{') {
            let mut switch_block = false;
            match pending {
                Pending::SwitchBlock { on } => {
                    if let Some(slot) = space_before(bytes, token.start, on + 2) {
                        bytes[on] = b'(';
                        bytes[on + 1] = b' ';
                        bytes[slot] = b')';
                        switch_block = true;
                    }
                }
                Pending::Arm { floor } => {
                    if let Some(slot) = space_before(bytes, token.start, floor) {
                        bytes[slot] = b':';
                    }
                }
                Pending::None => {}
            }
            pending = Pending::None;
            braces.push(switch_block);
        } else if token.is_punct(b'}') {
            braces.pop();
        }
        i += 1;
    }
}

/// `a.global` or `global.x` are names, not modifiers.
fn is_member_access(prev: Option<Token>, next: Option<Token>) -> bool {
    prev.is_some_and(|p| p.is_punct(b'.'))
        || next.is_some_and(|n| n.is_punct(b'.') || n.is_punct(b'(') || n.is_punct(b'='))
}

fn starts_statement(bytes: &[u8], prev: Option<Token>) -> bool {
    match prev {
        None => true,
        Some(p) => {
            p.is_punct(b';')
                || p.is_punct(b'{')
                || p.is_punct(b'}')
                || p.is_punct(b')')
                || p.is_word(bytes, "else")
        }
    }
}
