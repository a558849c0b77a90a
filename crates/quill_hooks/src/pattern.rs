//! Path and method patterns for hook registrations.
//!
//! A pattern is one of:
//!
//! - [`Pattern::Any`] - matches every text (the `*` token, or no pattern at all)
//! - [`Pattern::Glob`] - a literal string where `*` matches any run of characters
//! - [`Pattern::Regex`] - a compiled regular expression, tested unanchored
//!
//! Globs are anchored at both ends: `"messages"` matches only `"messages"`,
//! never `"messages/archive"`.

use core::fmt;

use regex::Regex;

/// The token that matches any text.
pub const WILDCARD: &str = "*";

/// Method name conventionally meaning "every method".
pub const ALL_METHODS: &str = "all";

/// Errors raised while building a pattern.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    /// The regular expression did not compile.
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The offending pattern source.
        pattern: String,
        /// The compiler error.
        #[source]
        source: regex::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Glob
// ─────────────────────────────────────────────────────────────────────────────

/// A glob-lite pattern: literal text with `*` wildcards.
///
/// Every character other than `*` matches itself, so regex metacharacters in
/// the source need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    source: String,
    segments: Vec<String>,
}

impl Glob {
    /// Parses a glob.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = source.split('*').map(str::to_owned).collect();
        Self { source, segments }
    }

    /// The glob as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests `text` against the whole glob.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        let [first, middle @ .., last] = self.segments.as_slice() else {
            // A single segment means no wildcard.
            return text == self.source;
        };

        let Some(rest) = text.strip_prefix(first.as_str()) else {
            return false;
        };
        let Some(mut rest) = rest.strip_suffix(last.as_str()) else {
            return false;
        };

        for segment in middle {
            match rest.find(segment.as_str()) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern
// ─────────────────────────────────────────────────────────────────────────────

/// Decides whether a registration applies to a path or method.
#[derive(Debug, Clone, Default)]
pub enum Pattern {
    /// Matches everything.
    #[default]
    Any,
    /// Anchored glob.
    Glob(Glob),
    /// Regular expression.
    Regex(Regex),
}

impl Pattern {
    /// Builds a glob pattern. The bare wildcard becomes [`Pattern::Any`].
    #[must_use]
    pub fn glob(source: &str) -> Self {
        if source == WILDCARD {
            Pattern::Any
        } else {
            Pattern::Glob(Glob::new(source))
        }
    }

    /// Compiles a regular-expression pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidRegex`] if `source` does not compile.
    pub fn regex(source: &str) -> Result<Self, PatternError> {
        Regex::new(source)
            .map(Pattern::Regex)
            .map_err(|source_err| PatternError::InvalidRegex {
                pattern: source.to_owned(),
                source: source_err,
            })
    }

    /// Builds a method pattern, where `"all"` also means every method.
    #[must_use]
    pub fn method(source: &str) -> Self {
        if source == ALL_METHODS {
            Pattern::Any
        } else {
            Pattern::glob(source)
        }
    }

    /// Tests `text` against the pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Glob(glob) => glob.is_match(text),
            Pattern::Regex(re) => re.is_match(text),
        }
    }

    /// Returns `true` for [`Pattern::Any`].
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Pattern::Any)
    }

    /// The pattern source, for diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Any => WILDCARD,
            Pattern::Glob(glob) => glob.as_str(),
            Pattern::Regex(re) => re.as_str(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::glob(source)
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::glob(&source)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

/// Tests `text` against an optional pattern; no pattern matches everything.
#[must_use]
pub fn matches(text: &str, pattern: Option<&Pattern>) -> bool {
    pattern.is_none_or(|p| p.matches(text))
}
