//! Inclusion and grep rules.
//!
//! Patterns are full-match: `BOOKS` matches the name `BOOKS` but not
//! `BOOKSHELF`. The default include pattern `.*` matches every name and the
//! default exclude pattern is empty, so it only matches the empty name.
//!
//! Rules are evaluated twice by the crawler: once to narrow what is requested
//! from the database, and once, authoritatively, when building the catalog.

use crate::{Result, error::DbCrawlerError};
use regex::Regex;

/// A compiled full-match pattern.
#[derive(Debug, Clone)]
enum Pattern {
    /// `.*`
    Everything,
    /// The empty pattern
    Empty,
    Regex(Regex),
}

impl Pattern {
    fn compile(source: &str) -> Result<Self> {
        match source {
            InclusionRule::ALL => Ok(Self::Everything),
            InclusionRule::NONE => Ok(Self::Empty),
            _ => Regex::new(&format!("^(?:{})$", source))
                .map(Self::Regex)
                .map_err(|e| DbCrawlerError::config(format!("Invalid pattern '{}': {}", source, e))),
        }
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Everything => true,
            Self::Empty => name.is_empty(),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Include/exclude regex pair over a name.
#[derive(Debug, Clone)]
pub struct InclusionRule {
    include_source: String,
    exclude_source: String,
    include: Pattern,
    exclude: Pattern,
}

impl InclusionRule {
    /// Pattern matching every name
    pub const ALL: &'static str = ".*";
    /// Pattern matching nothing but the empty name
    pub const NONE: &'static str = "";

    /// Compiles a rule.
    ///
    /// # Errors
    /// Returns a configuration error if either pattern is not a valid regex.
    pub fn new(include: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            include_source: include.to_string(),
            exclude_source: exclude.to_string(),
            include: Pattern::compile(include)?,
            exclude: Pattern::compile(exclude)?,
        })
    }

    /// Rule that keeps only names matching `include`.
    pub fn include_only(include: &str) -> Result<Self> {
        Self::new(include, Self::NONE)
    }

    /// Rule that keeps everything except names matching `exclude`.
    pub fn exclude_only(exclude: &str) -> Result<Self> {
        Self::new(Self::ALL, exclude)
    }

    /// Whether `name` is included.
    pub fn matches(&self, name: &str) -> bool {
        self.include.is_match(name) && !self.exclude.is_match(name)
    }

    /// Whether an object known by a qualified and a bare name is included.
    ///
    /// The include pattern may match either name; the exclude pattern must
    /// match neither.
    pub fn matches_qualified(&self, full_name: &str, name: &str) -> bool {
        (self.include.is_match(full_name) || self.include.is_match(name))
            && !self.exclude.is_match(full_name)
            && !self.exclude.is_match(name)
    }

    /// True for the default include-everything rule.
    pub fn is_default(&self) -> bool {
        self.include_source == Self::ALL && self.exclude_source == Self::NONE
    }

    /// Include pattern source
    pub fn include_pattern(&self) -> &str {
        &self.include_source
    }

    /// Exclude pattern source
    pub fn exclude_pattern(&self) -> &str {
        &self.exclude_source
    }
}

impl Default for InclusionRule {
    fn default() -> Self {
        Self {
            include_source: Self::ALL.to_string(),
            exclude_source: Self::NONE.to_string(),
            include: Pattern::Everything,
            exclude: Pattern::Empty,
        }
    }
}

impl PartialEq for InclusionRule {
    fn eq(&self, other: &Self) -> bool {
        self.include_source == other.include_source && self.exclude_source == other.exclude_source
    }
}

impl std::fmt::Display for InclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "include /{}/ exclude /{}/",
            self.include_source, self.exclude_source
        )
    }
}

/// Content match over a composite name such as `schema.table.column`.
#[derive(Debug, Clone)]
pub struct GrepRule {
    source: String,
    pattern: Pattern,
    invert: bool,
}

impl GrepRule {
    /// Compiles a grep rule.
    ///
    /// # Errors
    /// Returns a configuration error if the pattern is not a valid regex.
    pub fn new(pattern: &str, invert: bool) -> Result<Self> {
        Ok(Self {
            source: pattern.to_string(),
            pattern: Pattern::compile(pattern)?,
            invert,
        })
    }

    /// Pattern match, flipped when the rule is inverted.
    pub fn matches(&self, composite_name: &str) -> bool {
        self.pattern.is_match(composite_name) != self.invert
    }

    /// Same pattern with the opposite invert flag.
    pub fn inverted(&self) -> Self {
        Self {
            invert: !self.invert,
            ..self.clone()
        }
    }

    /// Whether matches are inverted
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Pattern source
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

impl PartialEq for GrepRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.invert == other.invert
    }
}

/// `include.matches(name) && !exclude.matches(name)`
pub fn matches(rule: &InclusionRule, name: &str) -> bool {
    rule.matches(name)
}

/// Grep match with invert applied.
pub fn matches_grep(rule: &GrepRule, composite_name: &str) -> bool {
    rule.matches(composite_name)
}
