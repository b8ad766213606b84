//! Keyspace codec
//!
//! Two key shapes share one namespace:
//! - Primary keys: `PREFIX + id`, e.g. `Bill_B1`
//! - Composite keys: `\0 namespace \0 seg1 \0 seg2 \0 ...`
//!
//! Every component of a composite key is terminated by `U+0000`, so
//! segment boundaries are unambiguous and a partial key is a byte prefix
//! of every full key that extends it. Primary-key prefixes never start
//! with `U+0000`, which keeps the two shapes disjoint.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Delimiter written before the namespace and after every component
pub const COMPONENT_DELIMITER: char = '\u{0}';

/// Reserved code point, used by range-scan upper bounds in ledger backends
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Primary key prefixes per entity kind
pub mod prefix {
    pub const BILL: &str = "Bill_";
    pub const OVERDUE: &str = "OD_";
    pub const CATEGORY: &str = "Cate_";
    pub const COMMODITY: &str = "Comm_";
    pub const GOODS: &str = "Goods_";
    pub const USER: &str = "User_";
    pub const PASSWORD: &str = "Pwd_";
    pub const STOCK: &str = "Stock_";
}

/// Composite key namespaces
pub mod namespace {
    /// participant id, bill number
    pub const HOLDER_BILL: &str = "holderId~billNo";
    /// `Cate_<id>` or `Stock_<id>`, store id
    pub const STORE_CATEGORY: &str = "storeID~CateID";
    /// record id, channel, chaincode
    pub const ID_CHANNEL_CHAINCODE: &str = "ID~Channel~Chaincode";
}

/// Errors from key encoding and decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Composite key component {component:?} contains reserved code point U+{code:04X}")]
    ReservedCodePoint { component: String, code: u32 },

    #[error("Not a composite key: {0:?}")]
    NotComposite(String),

    #[error("Composite key is not terminated: {0:?}")]
    Unterminated(String),
}

/// Build a flat primary key. Callers keep prefixes disjoint per entity kind.
pub fn primary_key(prefix: &str, id: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + id.len());
    key.push_str(prefix);
    key.push_str(id);
    key
}

fn validate_component(component: &str) -> Result<(), KeyError> {
    match component
        .chars()
        .find(|c| *c == COMPONENT_DELIMITER || *c == MAX_UNICODE_RUNE)
    {
        Some(c) => Err(KeyError::ReservedCodePoint {
            component: component.to_string(),
            code: c as u32,
        }),
        None => Ok(()),
    }
}

/// Build a composite key from a namespace and ordered segments.
///
/// With a leading subset of the segments this also yields the scan prefix
/// that matches every key extending them.
pub fn composite_key<S: AsRef<str>>(namespace: &str, segments: &[S]) -> Result<String, KeyError> {
    validate_component(namespace)?;
    let mut key = String::with_capacity(
        2 + namespace.len() + segments.iter().map(|s| s.as_ref().len() + 1).sum::<usize>(),
    );
    key.push(COMPONENT_DELIMITER);
    key.push_str(namespace);
    key.push(COMPONENT_DELIMITER);
    for segment in segments {
        let segment = segment.as_ref();
        validate_component(segment)?;
        key.push_str(segment);
        key.push(COMPONENT_DELIMITER);
    }
    Ok(key)
}

/// Split a composite key back into `(namespace, segments)`.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), KeyError> {
    let body = key
        .strip_prefix(COMPONENT_DELIMITER)
        .ok_or_else(|| KeyError::NotComposite(key.to_string()))?;
    let body = body
        .strip_suffix(COMPONENT_DELIMITER)
        .ok_or_else(|| KeyError::Unterminated(key.to_string()))?;

    let mut components = body.split(COMPONENT_DELIMITER).map(str::to_string);
    let namespace = components
        .next()
        .ok_or_else(|| KeyError::NotComposite(key.to_string()))?;
    Ok((namespace, components.collect()))
}

/// Whether a key uses the composite encoding
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPONENT_DELIMITER)
}

/// Decoded composite key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub namespace: String,
    pub segments: Vec<String>,
}

impl CompositeKey {
    pub fn new<S: Into<String>>(namespace: impl Into<String>, segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            namespace: namespace.into(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Encoded form, failing on reserved code points
    pub fn encode(&self) -> Result<String, KeyError> {
        composite_key(&self.namespace, &self.segments)
    }

    /// Last segment, usually the entity id in membership indexes
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl FromStr for CompositeKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, segments) = split_composite_key(s)?;
        Ok(Self { namespace, segments })
    }
}

impl fmt::Display for CompositeKey {
    /// Human-readable form: `namespace[seg1, seg2]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.namespace, self.segments.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key() {
        assert_eq!(primary_key(prefix::BILL, "B1"), "Bill_B1");
        assert_eq!(primary_key(prefix::OVERDUE, "D1"), "OD_D1");
    }

    #[test]
    fn test_composite_key_layout() {
        let key = composite_key(namespace::HOLDER_BILL, &["D1", "B1"]).unwrap();
        assert_eq!(key, "\u{0}holderId~billNo\u{0}D1\u{0}B1\u{0}");
        assert!(is_composite_key(&key));
        assert!(!is_composite_key("Bill_B1"));
    }

    #[test]
    fn test_split_inverts_composite() {
        let cases: Vec<Vec<&str>> = vec![
            vec![],
            vec![""],
            vec!["a", "", "c"],
            vec!["Cate_1", "store~9"],
            vec!["ünïcode", "空白 key", "tab\tand\nnewline"],
        ];
        for segments in cases {
            let key = composite_key("ns", &segments).unwrap();
            let (ns, parts) = split_composite_key(&key).unwrap();
            assert_eq!(ns, "ns");
            assert_eq!(parts, segments);
        }
    }

    #[test]
    fn test_partial_key_is_prefix_of_full_key() {
        let partial = composite_key(namespace::STORE_CATEGORY, &["Cate_1"]).unwrap();
        let full = composite_key(namespace::STORE_CATEGORY, &["Cate_1", "S1"]).unwrap();
        let other = composite_key(namespace::STORE_CATEGORY, &["Cate_10", "S1"]).unwrap();
        assert!(full.starts_with(&partial));
        // segment boundary keeps Cate_10 out of a Cate_1 scan
        assert!(!other.starts_with(&partial));
    }

    #[test]
    fn test_reserved_code_points_rejected() {
        let result = composite_key("ns", &["bad\u{0}segment"]);
        assert!(matches!(result, Err(KeyError::ReservedCodePoint { code: 0, .. })));

        let result = composite_key("ns", &["bad\u{10FFFF}"]);
        assert!(matches!(result, Err(KeyError::ReservedCodePoint { code: 0x10FFFF, .. })));

        let result = composite_key::<&str>("n\u{0}s", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_split_rejects_flat_keys() {
        assert!(matches!(split_composite_key("Bill_B1"), Err(KeyError::NotComposite(_))));
        assert!(matches!(split_composite_key("\u{0}ns\u{0}a"), Err(KeyError::Unterminated(_))));
    }

    #[test]
    fn test_composite_key_struct_roundtrip() {
        let key = CompositeKey::new(namespace::ID_CHANNEL_CHAINCODE, ["idx1", "mychannel", "users"]);
        let encoded = key.encode().unwrap();
        let parsed: CompositeKey = encoded.parse().unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.last_segment(), Some("users"));
        assert_eq!(parsed.to_string(), "ID~Channel~Chaincode[idx1, mychannel, users]");
    }
}
