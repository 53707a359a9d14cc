//! Hierarchical names.
//!
//! A [`Name`] is an ordered sequence of opaque byte components. Names
//! support prefix tests (the basis of FIB and strategy lookup and of
//! Interest/Data matching) and a URI form with percent-encoding for
//! non-printable bytes.

use core::fmt;
use std::str::FromStr;

use crate::error::NameError;

/// A single opaque name component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameComponent(Vec<u8>);

impl NameComponent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for NameComponent {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for NameComponent {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Bytes that may appear unescaped in the URI form.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if is_unreserved(b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameComponent({})", self)
    }
}

/// A hierarchical name: an ordered sequence of components.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// The empty name (URI `/`), the root of every prefix hierarchy.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Self { components }
    }

    /// Parse a URI such as `/a/b/c`. Percent-encoded bytes are decoded.
    pub fn from_uri(uri: &str) -> Result<Self, NameError> {
        uri.parse()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Append a component, returning the extended name.
    pub fn child(&self, component: impl Into<NameComponent>) -> Self {
        let mut components = self.components.clone();
        components.push(component.into());
        Self { components }
    }

    /// The first `n` components as a new name. `n` past the end is
    /// clamped to the full name.
    pub fn prefix(&self, n: usize) -> Self {
        Self {
            components: self.components[..n.min(self.components.len())].to_vec(),
        }
    }

    /// Whether `self` is a prefix of `other` (every name is a prefix of
    /// itself; the root is a prefix of everything).
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }

    /// Whether the name falls under the `/localhost` scope.
    pub fn is_localhost_scoped(&self) -> bool {
        self.components
            .first()
            .is_some_and(|c| c.as_bytes() == b"localhost")
    }

    /// Whether the name falls under the `/localhop` scope.
    pub fn is_localhop_scoped(&self) -> bool {
        self.components
            .first()
            .is_some_and(|c| c.as_bytes() == b"localhop")
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        if !uri.starts_with('/') {
            return Err(NameError::MissingLeadingSlash);
        }
        let mut components = Vec::new();
        for raw in uri.split('/').skip(1) {
            if raw.is_empty() {
                // `/` alone is the root; interior empty components are invalid
                if uri == "/" {
                    break;
                }
                return Err(NameError::EmptyComponent);
            }
            components.push(decode_component(raw)?);
        }
        Ok(Self { components })
    }
}

fn decode_component(raw: &str) -> Result<NameComponent, NameError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                }
                _ => return Err(NameError::InvalidPercentEncoding(i)),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(NameComponent(out))
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn test_parse_and_display_roundtrip() {
        for uri in ["/", "/a", "/a/b/c", "/localhost/nfd/strategy/best-route/2"] {
            assert_eq!(name(uri).to_string(), uri);
        }
    }

    #[test]
    fn test_parse_rejects_bad_uris() {
        assert_eq!(Name::from_uri("a/b"), Err(NameError::MissingLeadingSlash));
        assert_eq!(Name::from_uri("/a//b"), Err(NameError::EmptyComponent));
        assert!(matches!(
            Name::from_uri("/a%Z1"),
            Err(NameError::InvalidPercentEncoding(_))
        ));
    }

    #[test]
    fn test_percent_encoding_roundtrip() {
        let n = Name::root().child(NameComponent::new(vec![0x00, 0xFF, b'x']));
        let uri = n.to_string();
        assert_eq!(uri, "/%00%FFx");
        assert_eq!(name(&uri), n);
    }

    #[test]
    fn test_prefix_relation() {
        let a = name("/a");
        let ab = name("/a/b");
        let ac = name("/a/c");

        assert!(Name::root().is_prefix_of(&ab));
        assert!(a.is_prefix_of(&ab));
        assert!(ab.is_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&a));
        assert!(!ac.is_prefix_of(&ab));
    }

    #[test]
    fn test_prefix_truncation() {
        let n = name("/a/b/c");
        assert_eq!(n.prefix(0), Name::root());
        assert_eq!(n.prefix(2), name("/a/b"));
        assert_eq!(n.prefix(10), n);
    }

    #[test]
    fn test_scope_prefixes() {
        assert!(name("/localhost/nfd").is_localhost_scoped());
        assert!(!name("/localhostile").is_localhost_scoped());
        assert!(name("/localhop/x").is_localhop_scoped());
        assert!(!Name::root().is_localhost_scoped());
    }

    #[test]
    fn test_child_extends() {
        let n = name("/a").child("b");
        assert_eq!(n, name("/a/b"));
        assert_eq!(n.len(), 2);
    }
}
