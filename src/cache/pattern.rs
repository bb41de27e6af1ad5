//! Glob Pattern Module
//!
//! Key patterns with Redis `KEYS` semantics, used for bulk invalidation.
//!
//! Supported syntax:
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from a set or range
//! - `[^a]` / `[!a]` match one character not in the set
//! - `\x` matches `x` literally

use std::fmt;

// == Tokens ==
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    Class { negated: bool, items: Vec<ClassItem> },
}

impl Token {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::Star => false,
            Token::Class { negated, items } => {
                let hit = items.iter().any(|item| match item {
                    ClassItem::Single(s) => *s == c,
                    ClassItem::Range(lo, hi) => (*lo..=*hi).contains(&c),
                });
                hit != *negated
            }
        }
    }
}

// == Glob Pattern ==
/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    tokens: Vec<Token>,
}

impl GlobPattern {
    // == Constructor ==
    /// Compiles a pattern. Never fails: an unterminated `[` is a literal.
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Consecutive stars are equivalent to one
                    if tokens.last() != Some(&Token::Star) {
                        tokens.push(Token::Star);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyChar);
                    i += 1;
                }
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                }
                '[' => match parse_class(&chars, i + 1) {
                    Some((class, next)) => {
                        tokens.push(class);
                        i = next;
                    }
                    None => {
                        tokens.push(Token::Literal('['));
                        i += 1;
                    }
                },
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Self {
            source: pattern.to_string(),
            tokens,
        }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    // == Matches ==
    /// Checks whether `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        let text: Vec<char> = key.chars().collect();
        let (mut t, mut p) = (0, 0);
        // Last star seen: (token index after the star, text index it resumes from)
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            if let Some(token) = self.tokens.get(p) {
                if *token == Token::Star {
                    backtrack = Some((p + 1, t));
                    p += 1;
                    continue;
                }
                if token.matches_char(text[t]) {
                    p += 1;
                    t += 1;
                    continue;
                }
            }

            match backtrack {
                Some((resume_p, resume_t)) => {
                    p = resume_p;
                    t = resume_t + 1;
                    backtrack = Some((resume_p, resume_t + 1));
                }
                None => return false,
            }
        }

        self.tokens[p..].iter().all(|token| *token == Token::Star)
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses a `[...]` class starting after the opening bracket.
///
/// Returns the token and the index after the closing bracket, or None if
/// the class is never closed.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    let negated = matches!(chars.get(i), Some('^') | Some('!'));
    if negated {
        i += 1;
    }

    let mut items = Vec::new();
    while i < chars.len() {
        let mut c = chars[i];
        if c == ']' {
            return Some((Token::Class { negated, items }, i + 1));
        }
        if c == '\\' && i + 1 < chars.len() {
            i += 1;
            c = chars[i];
        }

        match (chars.get(i + 1), chars.get(i + 2)) {
            (Some('-'), Some(end)) if *end != ']' => {
                let (lo, hi) = if c <= *end { (c, *end) } else { (*end, c) };
                items.push(ClassItem::Range(lo, hi));
                i += 3;
            }
            _ => {
                items.push(ClassItem::Single(c));
                i += 1;
            }
        }
    }

    None
}
