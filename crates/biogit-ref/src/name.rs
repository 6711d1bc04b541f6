use std::fmt;

use crate::RefError;

/// A validated reference name, e.g. `refs/heads/main` or `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    /// Validate and wrap a reference name.
    pub fn new(name: impl Into<String>) -> Result<Self, RefError> {
        let name = name.into();
        if let Some(reason) = check(&name) {
            return Err(RefError::InvalidName {
                name,
                reason: reason.to_string(),
            });
        }
        Ok(Self(name))
    }

    /// The `HEAD` pseudo-ref.
    pub fn head() -> Self {
        Self("HEAD".to_string())
    }

    /// A branch ref: `refs/heads/<name>`.
    pub fn branch(short: &str) -> Result<Self, RefError> {
        Self::new(format!("refs/heads/{short}"))
    }

    /// A tag ref: `refs/tags/<name>`.
    pub fn tag(short: &str) -> Result<Self, RefError> {
        Self::new(format!("refs/tags/{short}"))
    }

    /// A remote-tracking ref: `refs/remotes/<remote>/<branch>`.
    pub fn remote(remote: &str, branch: &str) -> Result<Self, RefError> {
        Self::new(format!("refs/remotes/{remote}/{branch}"))
    }

    /// The full name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Is this a branch (`refs/heads/`) ref?
    pub fn is_branch(&self) -> bool {
        self.0.starts_with("refs/heads/")
    }

    /// Is this a tag (`refs/tags/`) ref?
    pub fn is_tag(&self) -> bool {
        self.0.starts_with("refs/tags/")
    }

    /// The short name with any `refs/heads/`, `refs/tags/`, or
    /// `refs/remotes/` prefix removed.
    pub fn short(&self) -> &str {
        self.0
            .strip_prefix("refs/heads/")
            .or_else(|| self.0.strip_prefix("refs/tags/"))
            .or_else(|| self.0.strip_prefix("refs/remotes/"))
            .unwrap_or(&self.0)
    }
}

/// Reference name validation, a compact version of git's check-ref-format.
fn check(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("empty name");
    }
    if name == "@" {
        return Some("'@' alone is reserved");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("leading or trailing slash");
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Some("forbidden suffix");
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return Some("forbidden sequence");
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Some("empty path component");
        }
        if component.starts_with('.') {
            return Some("component starts with '.'");
        }
    }
    for b in name.bytes() {
        if b < 0x20 || b == 0x7f {
            return Some("control character");
        }
        if matches!(b, b' ' | b'~' | b'^' | b':' | b'?' | b'*' | b'[' | b'\\') {
            return Some("forbidden character");
        }
    }
    None
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RefName {
    type Err = RefError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        for name in ["HEAD", "refs/heads/main", "refs/tags/v1.0", "refs/remotes/origin/dev"] {
            assert!(RefName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_bad_names() {
        for name in [
            "", "@", "/abs", "trailing/", "a..b", "a//b", "a b", "a:b", "a^b",
            "a?b", "a*b", "a[b", "a\\b", "branch.lock", "dot.", ".hidden", "refs/heads/@{1}",
        ] {
            assert!(RefName::new(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn short_strips_prefixes() {
        assert_eq!(RefName::branch("main").unwrap().short(), "main");
        assert_eq!(RefName::tag("v1").unwrap().short(), "v1");
        assert_eq!(RefName::remote("origin", "main").unwrap().short(), "origin/main");
        assert_eq!(RefName::head().short(), "HEAD");
    }

    #[test]
    fn kind_predicates() {
        assert!(RefName::branch("main").unwrap().is_branch());
        assert!(RefName::tag("v1").unwrap().is_tag());
        assert!(!RefName::head().is_branch());
    }
}
