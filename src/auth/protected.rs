//! Protected Route Matching
//!
//! Decides whether a request path needs a session before it is routed.

use std::fmt;
use std::str::FromStr;

/// How request paths are compared against the configured patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Pattern contained in the path or path contained in the pattern.
    ///
    /// Tolerates locale prefixes (`/en/settings` matches `/settings`) but also
    /// over-matches (`/log` matches a `/login` pattern).
    #[default]
    Substring,
    /// Path equals the pattern or continues it at a `/` boundary, after
    /// dropping one leading locale segment.
    SegmentPrefix,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown route match policy '{0}', expected 'substring' or 'segment'")]
pub struct UnknownPolicy(String);

impl FromStr for MatchPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "segment" | "segment-prefix" => Ok(Self::SegmentPrefix),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => write!(f, "substring"),
            Self::SegmentPrefix => write!(f, "segment"),
        }
    }
}

/// Ordered set of path patterns that require authentication.
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ProtectedRoutes {
    patterns: Vec<String>,
    policy: MatchPolicy,
    locales: Vec<String>,
}

impl ProtectedRoutes {
    pub fn new<I, S>(patterns: I, policy: MatchPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(Into::into)
            .map(|p: String| p.trim().to_string())
            // An empty pattern would be a substring of every path.
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            patterns,
            policy,
            locales: Vec::new(),
        }
    }

    /// Locales stripped from the path before segment matching
    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn requires_auth(&self, path: &str) -> bool {
        match self.policy {
            MatchPolicy::Substring => self
                .patterns
                .iter()
                .any(|pattern| {
                    path.contains(pattern.as_str()) || (!path.is_empty() && pattern.contains(path))
                }),
            MatchPolicy::SegmentPrefix => {
                let path = self.strip_locale(path);
                self.patterns.iter().any(|pattern| {
                    let pattern = pattern.trim_end_matches('/');
                    path == pattern
                        || path
                            .strip_prefix(pattern)
                            .is_some_and(|rest| rest.starts_with('/'))
                })
            }
        }
    }

    fn strip_locale<'a>(&self, path: &'a str) -> &'a str {
        let Some(rest) = path.strip_prefix('/') else {
            return path;
        };
        let first = rest.split('/').next().unwrap_or_default();

        if !first.is_empty() && self.locales.iter().any(|locale| locale == first) {
            match &rest[first.len()..] {
                "" => "/",
                remainder => remainder,
            }
        } else {
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substring() -> ProtectedRoutes {
        ProtectedRoutes::new(["/settings", "/boards"], MatchPolicy::Substring)
    }

    fn segment() -> ProtectedRoutes {
        ProtectedRoutes::new(["/settings", "/boards/"], MatchPolicy::SegmentPrefix)
            .with_locales(["en", "ru"])
    }

    #[test]
    fn substring_matches_both_directions() {
        let routes = substring();
        assert!(routes.requires_auth("/settings"));
        assert!(routes.requires_auth("/en/settings"));
        assert!(routes.requires_auth("/boards/42/tasks"));
        // path contained in a pattern
        assert!(routes.requires_auth("/set"));
        assert!(!routes.requires_auth("/login"));
        assert!(!routes.requires_auth("/registration"));
    }

    #[test]
    fn substring_over_matches_short_paths() {
        let routes = ProtectedRoutes::new(["/login-history"], MatchPolicy::Substring);
        assert!(routes.requires_auth("/log"));
        assert!(routes.requires_auth("/"));
    }

    #[test]
    fn segment_prefix_respects_boundaries() {
        let routes = segment();
        assert!(routes.requires_auth("/settings"));
        assert!(routes.requires_auth("/settings/profile"));
        assert!(routes.requires_auth("/boards"));
        assert!(routes.requires_auth("/boards/42"));
        assert!(!routes.requires_auth("/settingsx"));
        assert!(!routes.requires_auth("/set"));
        assert!(!routes.requires_auth("/"));
        assert!(!routes.requires_auth("/login"));
    }

    #[test]
    fn segment_prefix_tolerates_locale_prefix() {
        let routes = segment();
        assert!(routes.requires_auth("/en/settings"));
        assert!(routes.requires_auth("/ru/boards/7"));
        assert!(!routes.requires_auth("/de/settings"));
        assert!(!routes.requires_auth("/en"));
        assert!(!routes.requires_auth("/en/login"));
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let routes = ProtectedRoutes::new(["", "  ", "/settings"], MatchPolicy::Substring);
        assert_eq!(routes.patterns(), ["/settings".to_string()]);
        assert!(!routes.requires_auth("/login"));
    }

    #[test]
    fn policy_parses_from_config() {
        assert_eq!("substring".parse::<MatchPolicy>().unwrap(), MatchPolicy::Substring);
        assert_eq!("Segment".parse::<MatchPolicy>().unwrap(), MatchPolicy::SegmentPrefix);
        assert!("regex".parse::<MatchPolicy>().is_err());
    }
}
