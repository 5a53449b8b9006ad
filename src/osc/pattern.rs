//! OSC address patterns.
//!
//! Supports the OSC 1.0 wildcards (`?`, `*`, `[...]`, `{...}`) within a
//! single address part, plus the OSC 1.1 `//` operator which spans any
//! number of whole parts.

use std::fmt;

use super::error::PatternError;

/// A compiled OSC address pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct AddressPattern {
    source: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// `//` — zero or more address parts.
    Descend,
    Segment(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    AnySeq,
    Class { negated: bool, items: Vec<ClassItem> },
    Choice(Vec<Vec<char>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

impl ClassItem {
    fn contains(&self, ch: char) -> bool {
        match *self {
            ClassItem::Single(c) => c == ch,
            ClassItem::Range(lo, hi) => lo <= ch && ch <= hi,
        }
    }
}

impl AddressPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        let Some(body) = pattern.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        };

        let raw: Vec<&str> = body.split('/').collect();
        let mut parts = Vec::with_capacity(raw.len());
        // Character offset of the current part within `pattern`.
        let mut offset = 1;
        for (i, segment) in raw.iter().enumerate() {
            let is_last = i + 1 == raw.len();
            if segment.is_empty() && !is_last {
                if parts.last() != Some(&Part::Descend) {
                    parts.push(Part::Descend);
                }
            } else {
                parts.push(Part::Segment(SegmentParser::new(segment, offset).parse()?));
            }
            offset += segment.chars().count() + 1;
        }

        Ok(Self {
            source: pattern.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern uses no wildcards at all.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|part| match part {
            Part::Descend => false,
            Part::Segment(tokens) => tokens.iter().all(|t| matches!(t, Token::Literal(_))),
        })
    }

    pub fn matches(&self, address: &str) -> bool {
        let Some(body) = address.strip_prefix('/') else {
            return false;
        };
        let parts: Vec<Vec<char>> = body.split('/').map(|p| p.chars().collect()).collect();
        match_parts(&self.parts, &parts)
    }
}

impl fmt::Debug for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AddressPattern").field(&self.source).finish()
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// Both matchers memoize on (pattern index, input index), so `*` and `//`
// cost at most quadratic time in the address length.

fn match_parts(pattern: &[Part], address: &[Vec<char>]) -> bool {
    let mut memo: Vec<Option<bool>> = vec![None; (pattern.len() + 1) * (address.len() + 1)];
    parts_from(pattern, address, 0, 0, &mut memo)
}

fn parts_from(
    pattern: &[Part],
    address: &[Vec<char>],
    pi: usize,
    ai: usize,
    memo: &mut [Option<bool>],
) -> bool {
    let slot = pi * (address.len() + 1) + ai;
    if let Some(hit) = memo[slot] {
        return hit;
    }
    let result = match pattern.get(pi) {
        None => ai == address.len(),
        Some(Part::Descend) => {
            (ai..=address.len()).any(|skip| parts_from(pattern, address, pi + 1, skip, memo))
        }
        Some(Part::Segment(tokens)) => {
            ai < address.len()
                && match_tokens(tokens, &address[ai])
                && parts_from(pattern, address, pi + 1, ai + 1, memo)
        }
    };
    memo[slot] = Some(result);
    result
}

fn match_tokens(tokens: &[Token], chars: &[char]) -> bool {
    let mut memo: Vec<Option<bool>> = vec![None; (tokens.len() + 1) * (chars.len() + 1)];
    tokens_from(tokens, chars, 0, 0, &mut memo)
}

fn tokens_from(
    tokens: &[Token],
    chars: &[char],
    ti: usize,
    ci: usize,
    memo: &mut [Option<bool>],
) -> bool {
    let slot = ti * (chars.len() + 1) + ci;
    if let Some(hit) = memo[slot] {
        return hit;
    }
    let next = chars.get(ci).copied();
    let result = match tokens.get(ti) {
        None => ci == chars.len(),
        Some(Token::Literal(c)) => next == Some(*c) && tokens_from(tokens, chars, ti + 1, ci + 1, memo),
        Some(Token::AnyChar) => next.is_some() && tokens_from(tokens, chars, ti + 1, ci + 1, memo),
        Some(Token::AnySeq) => {
            (ci..=chars.len()).any(|skip| tokens_from(tokens, chars, ti + 1, skip, memo))
        }
        Some(Token::Class { negated, items }) => match next {
            Some(ch) => {
                items.iter().any(|item| item.contains(ch)) != *negated
                    && tokens_from(tokens, chars, ti + 1, ci + 1, memo)
            }
            None => false,
        },
        Some(Token::Choice(alternatives)) => alternatives.iter().any(|alt| {
            chars[ci..].starts_with(alt) && tokens_from(tokens, chars, ti + 1, ci + alt.len(), memo)
        }),
    };
    memo[slot] = Some(result);
    result
}

/// Tokenizes a single address part of a pattern.
struct SegmentParser {
    chars: Vec<char>,
    pos: usize,
    offset: usize,
}

impl SegmentParser {
    fn new(segment: &str, offset: usize) -> Self {
        Self {
            chars: segment.chars().collect(),
            pos: 0,
            offset,
        }
    }

    fn parse(mut self) -> Result<Vec<Token>, PatternError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.advance() {
            let token = match ch {
                '?' => Token::AnyChar,
                '*' => {
                    // Consecutive stars match the same as one.
                    if tokens.last() == Some(&Token::AnySeq) {
                        continue;
                    }
                    Token::AnySeq
                }
                '[' => self.parse_class()?,
                '{' => self.parse_choice()?,
                c => Token::Literal(c),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Position of the most recently consumed character within the whole pattern.
    fn position(&self) -> usize {
        self.offset + self.pos - 1
    }

    fn parse_class(&mut self) -> Result<Token, PatternError> {
        let start = self.position();
        let negated = self.peek() == Some('!');
        if negated {
            self.pos += 1;
        }

        let mut items = Vec::new();
        loop {
            let Some(ch) = self.advance() else {
                return Err(PatternError::UnterminatedClass { position: start });
            };
            if ch == ']' {
                break;
            }
            // `a-z` is a range; a leading or trailing '-' is literal.
            if self.peek() == Some('-') {
                if let Some(&hi) = self.chars.get(self.pos + 1) {
                    if hi != ']' {
                        self.pos += 2;
                        items.push(ClassItem::Range(ch.min(hi), ch.max(hi)));
                        continue;
                    }
                }
            }
            items.push(ClassItem::Single(ch));
        }

        Ok(Token::Class { negated, items })
    }

    fn parse_choice(&mut self) -> Result<Token, PatternError> {
        let start = self.position();
        let mut alternatives = Vec::new();
        let mut current = Vec::new();
        loop {
            match self.advance() {
                None => return Err(PatternError::UnterminatedAlternatives { position: start }),
                Some('}') => break,
                Some(',') => alternatives.push(std::mem::take(&mut current)),
                Some(c) => current.push(c),
            }
        }
        alternatives.push(current);
        Ok(Token::Choice(alternatives))
    }
}
