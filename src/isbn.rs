//! ISBN validation and extraction.
//!
//! [`is_isbn_valid`] checks the check digit of a single candidate.
//! [`IsbnMatcher`] scans arbitrary text for ISBN-like sequences, normalizes and
//! validates them, and collects the survivors into an [`IsbnList`].

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::error::Result;

/// Default pattern for ISBN-like sequences: an optional 978/979 prefix and ten
/// digits (the last one may be `X`), each optionally separated by hyphens.
pub const DEFAULT_ISBN_REGEX: &str = r"(-?9-?7[789]-?)?((-?[0-9]-?){9}[0-9xX])";

/// Candidates that pass the checksum but are never real ISBNs.
pub const DEFAULT_ISBN_BLACKLIST_REGEX: &str =
    r"^(0123456789|0{10}|1{10}|2{10}|3{10}|4{10}|5{10}|6{10}|7{10}|8{10}|9{10}|[xX]{10})$";

pub const DEFAULT_ISBN_RET_SEPARATOR: &str = "\n";

const DIGIT_LOOKBEHIND: &str = "(?<![0-9])";
const DIGIT_LOOKAHEAD: &str = "(?![0-9])";

lazy_static! {
    static ref DEFAULT_MATCHER: IsbnMatcher = IsbnMatcher {
        regex: Regex::new(DEFAULT_ISBN_REGEX).unwrap(),
        blacklist: Some(Regex::new(DEFAULT_ISBN_BLACKLIST_REGEX).unwrap()),
    };
}

/// Checks whether `isbn` is a valid ISBN-10 or ISBN-13.
///
/// Whitespace and hyphens are ignored and a trailing `x` is accepted in either
/// case. Malformed input is reported as invalid, never as an error.
pub fn is_isbn_valid(isbn: &str) -> bool {
    let normalized: String = isbn
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();

    match normalized.len() {
        10 => validate_isbn10(&normalized),
        13 => validate_isbn13(&normalized),
        _ => false,
    }
}

fn validate_isbn10(isbn: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in isbn.chars().enumerate() {
        let value = match c.to_digit(10) {
            Some(d) => d,
            None if i == 9 && c == 'X' => 10,
            None => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn validate_isbn13(isbn: &str) -> bool {
    if !(isbn.starts_with("978") || isbn.starts_with("979")) {
        return false;
    }

    let mut sum = 0u32;
    for (i, c) in isbn.chars().enumerate() {
        let Some(value) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { value } else { value * 3 };
    }
    sum % 10 == 0
}

/// Insertion-ordered list of unique ISBNs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsbnList {
    isbns: Vec<String>,
}

impl IsbnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `isbn` unless it is already present. Returns whether it was added.
    pub fn push_unique(&mut self, isbn: impl Into<String>) -> bool {
        let isbn = isbn.into();
        if self.contains(&isbn) {
            return false;
        }
        self.isbns.push(isbn);
        true
    }

    /// Appends every ISBN of `other` not yet present, keeping first-seen order.
    pub fn extend_unique(&mut self, other: IsbnList) {
        for isbn in other.isbns {
            self.push_unique(isbn);
        }
    }

    pub fn contains(&self, isbn: &str) -> bool {
        self.isbns.iter().any(|i| i == isbn)
    }

    pub fn is_empty(&self) -> bool {
        self.isbns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.isbns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.isbns.iter().map(String::as_str)
    }

    /// Renders the list as a single string.
    pub fn join(&self, separator: &str) -> String {
        self.isbns.join(separator)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.isbns
    }
}

impl fmt::Display for IsbnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(","))
    }
}

impl FromIterator<String> for IsbnList {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut list = IsbnList::new();
        for isbn in iter {
            list.push_unique(isbn);
        }
        list
    }
}

/// Finds valid ISBNs in text.
///
/// Matches are never allowed to touch another digit on either side, so no
/// reported ISBN is a slice of a longer number. The `regex` crate has no
/// look-around, so this boundary is enforced here rather than in the pattern.
#[derive(Debug, Clone)]
pub struct IsbnMatcher {
    regex: Regex,
    blacklist: Option<Regex>,
}

impl Default for IsbnMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

impl IsbnMatcher {
    /// Compiles a matcher from an ISBN pattern and an optional blacklist.
    ///
    /// A leading `(?<![0-9])` and trailing `(?![0-9])` are accepted and
    /// dropped, since the matcher applies that boundary itself.
    pub fn new(isbn_regex: &str, blacklist_regex: Option<&str>) -> Result<Self> {
        let regex = Regex::new(strip_digit_lookarounds(isbn_regex))?;
        let blacklist = match blacklist_regex {
            Some(pattern) if !pattern.is_empty() => Some(Regex::new(pattern)?),
            _ => None,
        };
        Ok(Self { regex, blacklist })
    }

    /// Returns the unique valid ISBNs of `text` in order of first occurrence.
    pub fn find_isbns(&self, text: &str) -> IsbnList {
        let mut isbns = IsbnList::new();
        for raw in self.bounded_matches(text) {
            let candidate: String = raw
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
                .collect();
            if isbns.contains(&candidate) || !is_isbn_valid(&candidate) {
                continue;
            }
            if self
                .blacklist
                .as_ref()
                .is_some_and(|blacklist| blacklist.is_match(&candidate))
            {
                log::debug!("Ignoring blacklisted ISBN-like number {}", candidate);
                continue;
            }
            isbns.push_unique(candidate);
        }
        isbns
    }

    /// Non-overlapping matches not preceded or followed by an ASCII digit.
    fn bounded_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut matches = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = self.regex.find_at(text, pos) else {
                break;
            };
            let digit_before = text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit());
            let digit_after = text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());

            if !digit_before && !digit_after && !m.is_empty() {
                matches.push(m.as_str());
                pos = m.end();
            } else {
                // Retry from the next character after the rejected start.
                pos = m.start()
                    + text[m.start()..]
                        .chars()
                        .next()
                        .map_or(1, |c| c.len_utf8());
            }
        }
        matches
    }
}

fn strip_digit_lookarounds(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix(DIGIT_LOOKBEHIND).unwrap_or(pattern);
    pattern.strip_suffix(DIGIT_LOOKAHEAD).unwrap_or(pattern)
}

/// Finds ISBNs with the default pattern and blacklist and joins them with `separator`.
pub fn find_isbns(text: &str, separator: &str) -> String {
    IsbnMatcher::default().find_isbns(text).join(separator)
}
