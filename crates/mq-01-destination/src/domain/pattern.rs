//! Wildcard compilation and matching.
//!
//! Topic names are `.`-delimited segments. A wildcard name is compiled once,
//! left to right, into a token sequence that is then matched against
//! concrete names by a matcher memoized on (token, position), so matching
//! stays polynomial however many wildcards a pattern stacks.
//!
//! ## Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `*`   | exactly one non-empty segment of word characters (letters, digits, `$`, `_`) |
//! | `**`  | one or more non-whitespace characters, dots included |
//! | `.>`  | this segment and everything after it; also matches the bare prefix (`a.>` matches `a`) |
//! | `x>`  | same as `x.>` |
//! | `*>`  | at least one further `.`-segment after the wildcard segment |
//! | `>`   | on its own: every name |
//!
//! Validation:
//! - `*`/`**` must start the name or follow a `.`, and be followed by `.`,
//!   `>` or the end of the name.
//! - `>` must be the last character.
//! - no leading, trailing or doubled `.`.
//!
//! Every other character is literal. Characters that are special to regular
//! expression engines (`$` in particular) need no escaping here because the
//! matcher never interprets literal text.

use crate::error::{DestinationError, DestinationResult};
use std::fmt;

/// True when the name contains a wildcard character.
pub fn is_wildcard_name(name: &str) -> bool {
    name.contains('*') || name.contains('>')
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(Vec<char>),
    /// `*`
    Word,
    /// `**`
    Deep,
    /// `.>` / `x>`: empty, or `.` followed by one or more non-whitespace chars
    OptionalTail,
    /// `*>`: `.` followed by one or more non-whitespace chars
    RequiredTail,
    /// lone `>`
    Any,
}

/// A compiled wildcard destination name.
#[derive(Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    source: String,
    tokens: Vec<Token>,
}

impl WildcardPattern {
    /// Compile a wildcard destination name.
    pub fn compile(name: &str) -> DestinationResult<Self> {
        let malformed = |reason: &'static str| DestinationError::MalformedWildcard {
            name: name.to_string(),
            reason,
        };

        let chars: Vec<char> = name.chars().collect();
        let last = chars.len().saturating_sub(1);
        let mut tokens = Vec::new();
        let mut literal = Vec::new();
        let mut dot = false;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    if i != 0 && !dot {
                        return Err(malformed("'*' must start the name or follow '.'"));
                    }
                    let deep = i < last && chars[i + 1] == '*';
                    if deep {
                        i += 1;
                    }
                    if i < last && chars[i + 1] != '.' && chars[i + 1] != '>' {
                        return Err(malformed("'*' must be followed by '.', '>' or end the name"));
                    }
                    flush_literal(&mut literal, &mut tokens);
                    tokens.push(if deep { Token::Deep } else { Token::Word });
                    dot = false;
                }
                '>' => {
                    if i != last {
                        return Err(malformed("nothing may follow '>'"));
                    }
                    flush_literal(&mut literal, &mut tokens);
                    let token = if i == 0 {
                        Token::Any
                    } else if chars[i - 1] == '*' {
                        Token::RequiredTail
                    } else {
                        Token::OptionalTail
                    };
                    tokens.push(token);
                    dot = false;
                }
                '.' => {
                    if i == 0 {
                        return Err(malformed("name starts with '.'"));
                    }
                    if i == last {
                        return Err(malformed("name ends with '.'"));
                    }
                    if dot {
                        return Err(malformed("name contains '..'"));
                    }
                    if chars[i + 1] == '>' && i + 1 == last {
                        flush_literal(&mut literal, &mut tokens);
                        tokens.push(Token::OptionalTail);
                        i += 2;
                        continue;
                    }
                    dot = true;
                    literal.push('.');
                }
                c => {
                    dot = false;
                    literal.push(c);
                }
            }
            i += 1;
        }
        flush_literal(&mut literal, &mut tokens);

        Ok(Self {
            source: name.to_string(),
            tokens,
        })
    }

    /// The wildcard name this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match a whole concrete name.
    pub fn matches(&self, name: &str) -> bool {
        let input: Vec<char> = name.chars().collect();
        Matcher::new(&self.tokens, &input).at(0, 0)
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WildcardPattern")
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn flush_literal(literal: &mut Vec<char>, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c == '$' || c == '_'
}

fn is_tail(input: &[char]) -> bool {
    input.len() > 1 && input[0] == '.' && input[1..].iter().all(|c| !c.is_whitespace())
}

/// Token matcher memoized on (token index, input position), so every state
/// is evaluated at most once regardless of how many `*`/`**` tokens precede it.
struct Matcher<'a> {
    tokens: &'a [Token],
    input: &'a [char],
    memo: Vec<Option<bool>>,
}

impl<'a> Matcher<'a> {
    fn new(tokens: &'a [Token], input: &'a [char]) -> Self {
        Self {
            tokens,
            input,
            memo: vec![None; (tokens.len() + 1) * (input.len() + 1)],
        }
    }

    fn at(&mut self, token: usize, pos: usize) -> bool {
        let slot = token * (self.input.len() + 1) + pos;
        if let Some(known) = self.memo[slot] {
            return known;
        }
        let matched = self.step(token, pos);
        self.memo[slot] = Some(matched);
        matched
    }

    fn step(&mut self, token: usize, pos: usize) -> bool {
        let (tokens, all) = (self.tokens, self.input);
        let input = &all[pos..];
        let Some(current) = tokens.get(token) else {
            return input.is_empty();
        };

        match current {
            Token::Literal(lit) => input.starts_with(lit) && self.at(token + 1, pos + lit.len()),
            Token::Word => {
                let max = input.iter().take_while(|c| is_word_char(**c)).count();
                (1..=max).rev().any(|n| self.at(token + 1, pos + n))
            }
            Token::Deep => {
                let max = input.iter().take_while(|c| !c.is_whitespace()).count();
                (1..=max).rev().any(|n| self.at(token + 1, pos + n))
            }
            // tails only ever end a pattern
            Token::OptionalTail => input.is_empty() || is_tail(input),
            Token::RequiredTail => is_tail(input),
            Token::Any => input.iter().all(|c| !c.is_whitespace()),
        }
    }
}
