//! Regex matching for detection patterns.

use log::debug;
use regex::Regex;

use crate::error::{BotError, Result};

/// Compiled detection patterns, kept in load order.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl PatternMatcher {
    /// Compile every pattern source.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PatternCompile`] for the first source that is not a
    /// valid regular expression.
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|source| {
                let source = source.as_ref();
                Regex::new(source).map_err(|e| BotError::PatternCompile {
                    pattern: source.to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Compiled {} detection patterns", patterns.len());
        Ok(Self { patterns })
    }

    /// Returns true when any pattern matches somewhere in `body`.
    #[must_use]
    pub fn matches(&self, body: &str) -> bool {
        self.first_match(body).is_some()
    }

    /// Returns the source of the first pattern that matches `body`.
    #[must_use]
    pub fn first_match(&self, body: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(body))
            .map(Regex::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
