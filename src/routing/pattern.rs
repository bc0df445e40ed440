//! Wildcard pattern compilation.
//!
//! # Syntax
//! ```text
//!  ?          exactly one character other than '/'
//!  *          one or more characters other than '/'
//!  /**        nothing at all, or '/' followed by any number of segments
//!  #          one or more digits
//!  [abc]      one of 'a', 'b' or 'c'
//!  [a-z]      one character in the range 'a' to 'z'
//!  {png,gif}  'png' or 'gif', captured as a group
//!  %5B        percent-encoded literal character ('[')
//! ```
//!
//! # Design Decisions
//! - Patterns are tokenized first and only literal runs are percent-decoded,
//!   so `%2A` is a literal '*' and never a wildcard
//! - Request paths are matched as received, undecoded. An escape in a
//!   pattern decodes to its character, so `/caf%C3%A9` matches a request
//!   sent as `/café` but not one sent as `/caf%C3%A9`
//! - The compiled matcher is anchored at both ends
//! - A malformed class or alternation is a `PatternError`, never a literal
//! - `PatternCompiler` memoizes by pattern string; compilation is pure

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A '[' without a matching ']'.
    #[error("unterminated character class in pattern '{pattern}'")]
    UnterminatedClass { pattern: String },

    /// A '[]' with nothing to match.
    #[error("empty character class in pattern '{pattern}'")]
    EmptyClass { pattern: String },

    /// A '{' without a matching '}'.
    #[error("unterminated alternation in pattern '{pattern}'")]
    UnterminatedAlternation { pattern: String },

    /// A '{}' with no alternatives.
    #[error("empty alternation in pattern '{pattern}'")]
    EmptyAlternation { pattern: String },

    /// The translated expression was rejected by the regex engine.
    #[error("invalid pattern '{pattern}': {reason}")]
    Regex { pattern: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Literal text, still percent-encoded.
    Literal(String),
    AnyChar,
    AnyRun,
    /// `/**`, separator included.
    Subtree,
    Digits,
    Class(Vec<ClassItem>),
    Alternation(Vec<String>),
}

/// A compiled, anchored wildcard matcher.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// The pattern string this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The anchored regular expression the pattern was translated into.
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the whole path matches the pattern.
    pub fn test(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile a wildcard pattern without caching.
pub fn compile(pattern: &str) -> Result<Pattern, PatternError> {
    let tokens = tokenize(pattern)?;

    let mut body = String::with_capacity(pattern.len() * 2);
    for token in &tokens {
        match token {
            Token::Literal(raw) => body.push_str(&regex::escape(&percent_decode(raw))),
            Token::AnyChar => body.push_str("[^/]"),
            Token::AnyRun => body.push_str("[^/]+"),
            Token::Subtree => body.push_str("(?:/.+)?"),
            Token::Digits => body.push_str("[0-9]+"),
            Token::Class(items) => {
                body.push('[');
                for item in items {
                    match item {
                        ClassItem::Char(c) => body.push_str(&escape_char(*c)),
                        ClassItem::Range(lo, hi) => {
                            body.push_str(&escape_char(*lo));
                            body.push('-');
                            body.push_str(&escape_char(*hi));
                        }
                    }
                }
                body.push(']');
            }
            Token::Alternation(options) => {
                let options: Vec<String> = options
                    .iter()
                    .map(|option| regex::escape(&percent_decode(option)))
                    .collect();
                body.push('(');
                body.push_str(&options.join("|"));
                body.push(')');
            }
        }
    }

    let regex = Regex::new(&format!("^(?s:{})$", body)).map_err(|e| PatternError::Regex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Pattern {
        source: pattern.to_string(),
        regex,
    })
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(literal)));
        }
    }

    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'*') && chars.get(i + 2) == Some(&'*') => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Subtree);
                i += 3;
            }
            '*' => {
                flush(&mut literal, &mut tokens);
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                tokens.push(Token::AnyRun);
            }
            '?' => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '#' => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Digits);
                i += 1;
            }
            '[' => {
                flush(&mut literal, &mut tokens);
                let end = find_close(&chars, i + 1, ']').ok_or_else(|| {
                    PatternError::UnterminatedClass {
                        pattern: pattern.to_string(),
                    }
                })?;
                let raw: String = chars[i + 1..end].iter().collect();
                let items = parse_class(&raw);
                if items.is_empty() {
                    return Err(PatternError::EmptyClass {
                        pattern: pattern.to_string(),
                    });
                }
                tokens.push(Token::Class(items));
                i = end + 1;
            }
            '{' => {
                flush(&mut literal, &mut tokens);
                let end = find_close(&chars, i + 1, '}').ok_or_else(|| {
                    PatternError::UnterminatedAlternation {
                        pattern: pattern.to_string(),
                    }
                })?;
                if end == i + 1 {
                    return Err(PatternError::EmptyAlternation {
                        pattern: pattern.to_string(),
                    });
                }
                let raw: String = chars[i + 1..end].iter().collect();
                tokens.push(Token::Alternation(
                    raw.split(',').map(str::to_string).collect(),
                ));
                i = end + 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    flush(&mut literal, &mut tokens);
    Ok(tokens)
}

fn find_close(chars: &[char], from: usize, close: char) -> Option<usize> {
    chars[from.min(chars.len())..]
        .iter()
        .position(|&c| c == close)
        .map(|offset| from + offset)
}

/// `a-z` becomes a range; a leading or trailing '-' is literal, and so is
/// an encoded `%2D`.
fn parse_class(raw: &str) -> Vec<ClassItem> {
    let units = class_units(raw);
    let mut items = Vec::new();
    let mut i = 0;

    while i < units.len() {
        if i + 2 < units.len() && units[i + 1] == ClassUnit::Plain('-') {
            items.push(ClassItem::Range(units[i].char(), units[i + 2].char()));
            i += 3;
        } else {
            items.push(ClassItem::Char(units[i].char()));
            i += 1;
        }
    }

    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassUnit {
    Plain(char),
    Encoded(char),
}

impl ClassUnit {
    fn char(self) -> char {
        match self {
            ClassUnit::Plain(c) | ClassUnit::Encoded(c) => c,
        }
    }
}

/// Split a raw class body into characters, decoding each run of `%XX`
/// escapes on its own.
fn class_units(raw: &str) -> Vec<ClassUnit> {
    let bytes = raw.as_bytes();
    let is_escape = |at: usize| {
        at + 2 < bytes.len()
            && bytes[at] == b'%'
            && bytes[at + 1].is_ascii_hexdigit()
            && bytes[at + 2].is_ascii_hexdigit()
    };

    let mut units = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        if is_escape(i) {
            let start = i;
            while is_escape(i) {
                i += 3;
            }
            units.extend(percent_decode(&raw[start..i]).chars().map(ClassUnit::Encoded));
        } else if let Some(c) = raw[i..].chars().next() {
            units.push(ClassUnit::Plain(c));
            i += c.len_utf8();
        } else {
            break;
        }
    }

    units
}

fn escape_char(c: char) -> String {
    let mut buf = [0u8; 4];
    regex::escape(c.encode_utf8(&mut buf))
}

/// Decodes `%XX` sequences, leaving malformed ones untouched.
fn percent_decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Owned(
            String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
        ),
    }
}

/// Memoizing pattern compiler.
///
/// Cloning the compiler shares its cache, so a table rebuilt on reload reuses
/// every pattern that did not change. The cache only grows unless pruned
/// with `retain`.
#[derive(Debug, Clone, Default)]
pub struct PatternCompiler {
    cache: Arc<DashMap<String, Arc<Pattern>>>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a pattern, returning the cached matcher if it was seen before.
    pub fn compile(&self, pattern: &str) -> Result<Arc<Pattern>, PatternError> {
        if let Some(hit) = self.cache.get(pattern) {
            return Ok(hit.value().clone());
        }

        let compiled = Arc::new(compile(pattern)?);
        tracing::trace!(pattern = %pattern, regex = %compiled.regex(), "Compiled pattern");

        Ok(self
            .cache
            .entry(pattern.to_string())
            .or_insert(compiled)
            .value()
            .clone())
    }

    /// Drop cached patterns for which `keep` returns false.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.cache.retain(|pattern, _| keep(pattern));
    }

    /// Number of patterns currently cached.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        compile(pattern).unwrap().test(path)
    }

    #[test]
    fn test_literal_is_anchored() {
        assert!(matches("/foo", "/foo"));
        assert!(!matches("/foo", "/foobar"));
        assert!(!matches("/foo", "/x/foo"));
        assert!(!matches("/a.b", "/axb"));
    }

    #[test]
    fn test_single_char_wildcard() {
        assert!(matches("/file?", "/file1"));
        assert!(!matches("/file?", "/file"));
        assert!(!matches("/file?", "/file12"));
        assert!(!matches("/file?", "/file/"));
    }

    #[test]
    fn test_star_stays_inside_segment() {
        assert!(matches("/img/*.png", "/img/cat.png"));
        assert!(!matches("/img/*.png", "/img/.png"));
        assert!(!matches("/img/*.png", "/img/a/b.png"));
        assert!(matches("/user/*", "/user/bob"));
        assert!(!matches("/user/*", "/user"));
    }

    #[test]
    fn test_double_star_inside_segment_is_single_star() {
        assert_eq!(compile("/a**").unwrap().regex(), compile("/a*").unwrap().regex());
        assert!(matches("/a**", "/ab"));
        assert!(!matches("/a**", "/a"));
        assert!(!matches("/a**", "/a/b"));
    }

    #[test]
    fn test_subtree() {
        assert!(matches("/a/**", "/a"));
        assert!(matches("/a/**", "/a/b"));
        assert!(matches("/a/**", "/a/b/c"));
        assert!(!matches("/a/**", "/ab"));
    }

    #[test]
    fn test_root_subtree() {
        assert!(matches("/**", "/foo"));
        assert!(matches("/**", "/foo/bar"));
        assert!(matches("/**", ""));
        // The separator alone is not a segment.
        assert!(!matches("/**", "/"));
    }

    #[test]
    fn test_digits() {
        assert!(matches("/user/#", "/user/42"));
        assert!(!matches("/user/#", "/user/abc"));
        assert!(!matches("/user/#", "/user/"));
    }

    #[test]
    fn test_character_class() {
        assert!(matches("/v[1-3]", "/v2"));
        assert!(!matches("/v[1-3]", "/v4"));
        assert!(matches("/[abc]x", "/bx"));
        assert!(matches("/[a-]", "/-"));
        assert!(!matches("/[^a]", "/b"));
    }

    #[test]
    fn test_alternation() {
        assert!(matches("/logo.{png,gif}", "/logo.png"));
        assert!(matches("/logo.{png,gif}", "/logo.gif"));
        assert!(!matches("/logo.{png,gif}", "/logo.jpg"));
        assert!(!matches("/logo.{png,gif}", "/logo.pnggif"));
    }

    #[test]
    fn test_percent_encoded_literals() {
        assert!(matches("/a%5Bb%5D", "/a[b]"));
        assert!(!matches("/a%5Bb%5D", "/ab"));
        assert!(matches("/x%2A", "/x*"));
        assert!(!matches("/x%2A", "/xyz"));
        assert!(matches("/100%", "/100%"));
    }

    #[test]
    fn test_encoded_literals_match_decoded_requests_only() {
        assert!(matches("/caf%C3%A9", "/café"));
        assert!(!matches("/caf%C3%A9", "/caf%C3%A9"));
    }

    #[test]
    fn test_encoded_dash_in_class_is_literal() {
        assert!(matches("/[a%2Dz]", "/-"));
        assert!(matches("/[a%2Dz]", "/a"));
        assert!(matches("/[a%2Dz]", "/z"));
        assert!(!matches("/[a%2Dz]", "/m"));

        // Encoded endpoints still form a range around a plain '-'.
        assert!(matches("/[%61-c]", "/b"));
        assert!(matches("/[%C3%A9x]", "/é"));
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(matches!(
            compile("/[abc"),
            Err(PatternError::UnterminatedClass { .. })
        ));
        assert!(matches!(
            compile("/{a,b"),
            Err(PatternError::UnterminatedAlternation { .. })
        ));
        assert!(matches!(compile("/{}"), Err(PatternError::EmptyAlternation { .. })));
        assert!(matches!(compile("/[]"), Err(PatternError::EmptyClass { .. })));
    }

    #[test]
    fn test_compiler_cache() {
        let compiler = PatternCompiler::new();
        let a = compiler.compile("/user/#").unwrap();
        let b = compiler.compile("/user/#").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(compiler.len(), 1);

        assert!(compiler.compile("/[oops").is_err());
        assert_eq!(compiler.len(), 1);

        compiler.compile("/blog/**").unwrap();
        compiler.retain(|pattern| pattern.starts_with("/blog"));
        assert_eq!(compiler.len(), 1);
        assert!(!Arc::ptr_eq(&a, &compiler.compile("/user/#").unwrap()));
    }
}
