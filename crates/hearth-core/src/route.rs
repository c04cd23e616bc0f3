//! Route classification.
//!
//! A [`RouteTable`] is an ordered list of [`RouteRule`]s, each mapping a path
//! pattern to a [`RouteCategory`] with an explicit precedence. Rules are
//! evaluated from highest to lowest precedence (ties keep insertion order).
//!
//! Pattern syntax:
//! - Prefix: `/dashboard(.*)` matches `/dashboard`, `/dashboard/listings`,
//!   and anything else starting with `/dashboard`
//! - Glob: `/listings/*/edit` (one segment), `/api/**` (all descendants)
//! - Exact: `/`
//!
//! A public rule only short-circuits when it is the first rule to match.
//! A restrictive rule with higher precedence than an overlapping public rule
//! wins, and the public match is ignored.

use serde::Serialize;

use crate::error::RouteError;

/// The category a rule assigns to matching paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    /// No checks at all.
    Public,
    /// Requires any signed-in identity that finished onboarding.
    Protected,
    /// The onboarding flow itself.
    Onboarding,
    /// Requires entitlement and agent onboarding.
    AgentRestricted,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Exact(String),
    Prefix(String),
    Glob(String),
}

impl RoutePattern {
    /// Compile a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern is empty or does
    /// not start with `/`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "must start with '/'".to_owned(),
            });
        }

        if let Some(prefix) = pattern.strip_suffix("(.*)") {
            return Ok(Self::Prefix(prefix.to_owned()));
        }

        if pattern.contains(['*', '?', '[', '{']) {
            return Ok(Self::Glob(pattern.to_owned()));
        }

        Ok(Self::Exact(pattern.to_owned()))
    }

    /// Whether `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => p == path,
            Self::Prefix(p) => path.starts_with(p.as_str()),
            Self::Glob(p) => glob_match::glob_match(p, path),
        }
    }
}

/// A single classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: RoutePattern,
    pub category: RouteCategory,
    /// Higher values are evaluated first.
    pub precedence: u16,
}

impl RouteRule {
    /// Build a rule from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern is malformed.
    pub fn new(pattern: &str, category: RouteCategory, precedence: u16) -> Result<Self, RouteError> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            category,
            precedence,
        })
    }
}

/// The categories a path falls into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RouteClass {
    pub public: bool,
    pub protected: bool,
    pub onboarding: bool,
    pub agent_restricted: bool,
}

impl RouteClass {
    /// Whether any non-public category applies.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.protected || self.onboarding || self.agent_restricted
    }

    fn add(&mut self, category: RouteCategory) {
        match category {
            RouteCategory::Public => self.public = true,
            RouteCategory::Protected => self.protected = true,
            RouteCategory::Onboarding => self.onboarding = true,
            RouteCategory::AgentRestricted => self.agent_restricted = true,
        }
    }
}

/// Precedence of the stock public rules.
pub const PUBLIC_PRECEDENCE: u16 = 100;
/// Precedence of the stock restrictive rules.
pub const DEFAULT_PRECEDENCE: u16 = 10;

/// An immutable, precedence-ordered rule list.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Build a table. Rules are sorted by precedence, highest first.
    #[must_use]
    pub fn new(mut rules: Vec<RouteRule>) -> Self {
        rules.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        Self { rules }
    }

    /// The stock table for the listings site.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the patterns are constants.
    pub fn standard() -> Result<Self, RouteError> {
        use RouteCategory::{AgentRestricted, Onboarding, Protected, Public};

        let table: [(&str, RouteCategory, u16); 15] = [
            ("/", Public, PUBLIC_PRECEDENCE),
            ("/properties(.*)", Public, PUBLIC_PRECEDENCE),
            ("/sign-in(.*)", Public, PUBLIC_PRECEDENCE),
            ("/sign-up(.*)", Public, PUBLIC_PRECEDENCE),
            ("/studio(.*)", Public, PUBLIC_PRECEDENCE),
            ("/pricing(.*)", Public, PUBLIC_PRECEDENCE),
            ("/dashboard(.*)", Protected, DEFAULT_PRECEDENCE),
            ("/saved(.*)", Protected, DEFAULT_PRECEDENCE),
            ("/profile(.*)", Protected, DEFAULT_PRECEDENCE),
            ("/create(.*)", Protected, DEFAULT_PRECEDENCE),
            ("/agent-onboarding(.*)", Protected, DEFAULT_PRECEDENCE),
            ("/onboarding(.*)", Onboarding, DEFAULT_PRECEDENCE),
            ("/dashboard(.*)", AgentRestricted, DEFAULT_PRECEDENCE),
            ("/create(.*)", AgentRestricted, DEFAULT_PRECEDENCE),
            ("/agent-onboarding(.*)", AgentRestricted, DEFAULT_PRECEDENCE),
        ];

        let rules = table
            .into_iter()
            .map(|(pattern, category, precedence)| RouteRule::new(pattern, category, precedence))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Classify a request path.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let mut class = RouteClass::default();
        let mut matched_any = false;

        for rule in self.rules.iter().filter(|r| r.pattern.matches(path)) {
            if rule.category == RouteCategory::Public {
                if !matched_any {
                    return RouteClass {
                        public: true,
                        ..RouteClass::default()
                    };
                }
                continue;
            }
            matched_any = true;
            class.add(rule.category);
        }

        class
    }
}

/// File extensions served as static assets, never gated.
const STATIC_EXTENSIONS: [&str; 21] = [
    "html", "htm", "css", "js", "jpg", "jpeg", "webp", "png", "gif", "svg", "ttf", "woff",
    "woff2", "ico", "csv", "doc", "docx", "xls", "xlsx", "zip", "webmanifest",
];

/// Whether the gate should run for `path` at all.
///
/// Framework internals under `/_next` and static files are skipped. API
/// routes are always gated, whatever their extension.
#[must_use]
pub fn is_gated_path(path: &str) -> bool {
    if path.starts_with("/api") || path.starts_with("/trpc") {
        return true;
    }
    if path.starts_with("/_next") {
        return false;
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => !STATIC_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext)),
        _ => true,
    }
}
