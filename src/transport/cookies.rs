//! Cookie jar and `Set-Cookie` parsing.
//!
//! Only the `name=value` pair before the first `;` of a `Set-Cookie` header
//! is kept; attributes such as `Path` or `Expires` are ignored. The jar keeps
//! insertion order and overwrites values in place, so the `Cookie` header
//! stays stable across refreshes of the same cookie.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Cookie
// ============================================================================

/// A single `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Creates a cookie.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses one `Set-Cookie` header value.
    ///
    /// Returns `None` if there is no `=` or the name is empty.
    #[must_use]
    pub fn parse_set_cookie(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?;
        let (name, value) = pair.split_once('=')?;

        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self::new(name, value.trim()))
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

// ============================================================================
// CookieJar
// ============================================================================

/// Ordered cookie map, last write wins per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cookie, replacing an existing one with the same name in place.
    pub fn set(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => existing.value = cookie.value,
            None => self.cookies.push(cookie),
        }
    }

    /// Merges several cookies in order.
    pub fn merge(&mut self, cookies: impl IntoIterator<Item = Cookie>) {
        for cookie in cookies {
            self.set(cookie);
        }
    }

    /// Returns the value of a cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Removes every cookie.
    #[inline]
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Returns the number of cookies.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns `true` if the jar is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Builds the `Cookie` request header, or `None` when empty.
    #[must_use]
    pub fn header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let pairs: Vec<String> = self.cookies.iter().map(Cookie::to_string).collect();
        Some(pairs.join("; "))
    }
}

/// Parses every `Set-Cookie` header value, skipping malformed ones.
pub fn parse_set_cookies<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<Cookie> {
    headers
        .into_iter()
        .filter_map(Cookie::parse_set_cookie)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_parse_set_cookie() {
        let cookie = Cookie::parse_set_cookie("sid=abc123; Path=/; HttpOnly").expect("cookie");
        assert_eq!(cookie, Cookie::new("sid", "abc123"));
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let cookie = Cookie::parse_set_cookie("token=a=b=c; Path=/").expect("cookie");
        assert_eq!(cookie.name, "token");
        assert_eq!(cookie.value, "a=b=c");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Cookie::parse_set_cookie("").is_none());
        assert!(Cookie::parse_set_cookie("novalue").is_none());
        assert!(Cookie::parse_set_cookie("=orphan").is_none());
        assert!(Cookie::parse_set_cookie("  =x; Path=/").is_none());
    }

    #[test]
    fn test_header_joins_in_insertion_order() {
        let mut jar = CookieJar::new();
        assert_eq!(jar.header(), None);

        jar.merge(parse_set_cookies(["sid=1; Path=/", "lang=en", "bogus"]));
        assert_eq!(jar.header().as_deref(), Some("sid=1; lang=en"));

        jar.set(Cookie::new("sid", "2"));
        assert_eq!(jar.header().as_deref(), Some("sid=2; lang=en"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut jar = CookieJar::new();
        jar.set(Cookie::new("sid", "1"));
        jar.clear();
        assert!(jar.is_empty());
        assert_eq!(jar.header(), None);
    }

    proptest! {
        #[test]
        fn prop_last_write_wins(
            writes in proptest::collection::vec(("[a-c]", "[a-z0-9]{0,6}"), 1..20)
        ) {
            let mut jar = CookieJar::new();
            for (name, value) in &writes {
                jar.set(Cookie::new(name.clone(), value.clone()));
            }

            for (name, _) in &writes {
                let last = writes.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
                prop_assert_eq!(jar.get(name), last);
            }

            let mut unique: Vec<&String> = Vec::new();
            for (name, _) in &writes {
                if !unique.contains(&name) {
                    unique.push(name);
                }
            }
            prop_assert_eq!(jar.len(), unique.len());
        }
    }
}
