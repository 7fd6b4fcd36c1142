//! Cache keys and invalidation patterns.

use serde_json::Value;
use std::fmt;

/// Composite key of one request: `"{path}:{body_json}"`.
///
/// A request without a body serializes its body as the JSON empty string, so
/// `GET /api/u-1/domain` keys as `/api/u-1/domain:""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(path: &str, body: Option<&Value>) -> Self {
        let body = match body {
            Some(value) => value.to_string(),
            None => "\"\"".to_string(),
        };
        Self(format!("{}:{}", path, body))
    }

    /// Key of a body-less request.
    pub fn path(path: &str) -> Self {
        Self::new(path, None)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which cache entries an invalidation removes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationPattern {
    /// Every key starting with the prefix.
    Prefix(String),
    /// Exactly one key.
    Exact(String),
}

impl InvalidationPattern {
    /// Every body variant of one exact path.
    pub fn resource(path: &str) -> Self {
        Self::Prefix(format!("{}:", path))
    }

    pub fn prefix(raw: impl Into<String>) -> Self {
        Self::Prefix(raw.into())
    }

    pub fn exact(key: &RequestKey) -> Self {
        Self::Exact(key.as_str().to_string())
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Exact(exact) => key == exact,
        }
    }
}

impl fmt::Display for InvalidationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "{}*", prefix),
            Self::Exact(exact) => f.write_str(exact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_key_format() {
        assert_eq!(RequestKey::path("/api/u-1/domain").as_str(), "/api/u-1/domain:\"\"");
        let body = json!({ "domain_name": "example.com" });
        assert_eq!(
            RequestKey::new("/api/u-1/domain", Some(&body)).as_str(),
            "/api/u-1/domain:{\"domain_name\":\"example.com\"}"
        );
    }

    #[test]
    fn test_resource_pattern_does_not_match_longer_paths() {
        let pattern = InvalidationPattern::resource("/api/u-1/domain");
        assert!(pattern.matches(RequestKey::path("/api/u-1/domain").as_str()));
        assert!(!pattern.matches(RequestKey::path("/api/u-1/domains").as_str()));
    }

    #[test]
    fn test_prefix_pattern_spans_paths() {
        let pattern = InvalidationPattern::prefix("/api/u-1/");
        assert!(pattern.matches(RequestKey::path("/api/u-1/domain").as_str()));
        assert!(pattern.matches(RequestKey::path("/api/u-1/example.com/permutations").as_str()));
        assert!(!pattern.matches(RequestKey::path("/api/u-2/domain").as_str()));
    }

    #[test]
    fn test_exact_pattern() {
        let key = RequestKey::path("/api/user");
        let pattern = InvalidationPattern::exact(&key);
        assert!(pattern.matches(key.as_str()));
        assert!(!pattern.matches("/api/user:{}"));
    }
}
