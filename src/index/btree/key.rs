//! Index keys.

use std::fmt;

/// Type of the keys an index holds, persisted as a one-byte tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Text = 0,
    Integer = 1,
}

impl KeyType {
    /// Convert from the on-page tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(KeyType::Text),
            1 => Some(KeyType::Integer),
            _ => None,
        }
    }

    /// Smallest maximum key size an index of this type can work with.
    pub fn min_key_size(self) -> usize {
        match self {
            KeyType::Integer => 8,
            KeyType::Text => 1,
        }
    }
}

/// A search key.
///
/// Keys of one index all share a [`KeyType`]. Within a type they order
/// naturally: integers numerically, text by bytes.
///
/// # Encoding
/// - `Integer`: 8 bytes, little-endian
/// - `Text`: the UTF-8 bytes, no terminator (the slot records the length)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    pub fn key_type(&self) -> KeyType {
        match self {
            Key::Integer(_) => KeyType::Integer,
            Key::Text(_) => KeyType::Text,
        }
    }

    /// Number of bytes the key occupies on a page.
    pub fn encoded_len(&self) -> usize {
        match self {
            Key::Integer(_) => 8,
            Key::Text(s) => s.len(),
        }
    }

    /// Write the key to the start of `buf`.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than [`Key::encoded_len`].
    pub fn encode_into(&self, buf: &mut [u8]) {
        match self {
            Key::Integer(v) => buf[..8].copy_from_slice(&v.to_le_bytes()),
            Key::Text(s) => buf[..s.len()].copy_from_slice(s.as_bytes()),
        }
    }

    /// Decode a key of `key_type` from exactly the bytes it was encoded to.
    pub fn decode(key_type: KeyType, bytes: &[u8]) -> Self {
        match key_type {
            KeyType::Integer => {
                let mut raw = [0u8; 8];
                let n = bytes.len().min(8);
                raw[..n].copy_from_slice(&bytes[..n]);
                Key::Integer(i64::from_le_bytes(raw))
            }
            KeyType::Text => Key::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Integer(v)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(v) => write!(f, "{}", v),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_tag() {
        assert_eq!(KeyType::from_u8(0), Some(KeyType::Text));
        assert_eq!(KeyType::from_u8(1), Some(KeyType::Integer));
        assert_eq!(KeyType::from_u8(7), None);
        assert_eq!(Key::from(5).key_type(), KeyType::Integer);
        assert_eq!(Key::from("a").key_type(), KeyType::Text);
        assert_eq!(KeyType::Integer.min_key_size(), Key::Integer(0).encoded_len());
        assert_eq!(KeyType::Text.min_key_size(), 1);
    }

    #[test]
    fn test_key_ordering() {
        assert!(Key::Integer(-3) < Key::Integer(2));
        assert!(Key::from("apple") < Key::from("banana"));
        assert!(Key::from("ab") < Key::from("abc"));
    }

    #[test]
    fn test_integer_encoding() {
        let key = Key::Integer(-2);
        assert_eq!(key.encoded_len(), 8);

        let mut buf = [0u8; 8];
        key.encode_into(&mut buf);
        assert_eq!(buf, (-2i64).to_le_bytes());
        assert_eq!(Key::decode(KeyType::Integer, &buf), key);
    }

    #[test]
    fn test_text_encoding() {
        let key = Key::from("héllo");
        assert_eq!(key.encoded_len(), 6);

        let mut buf = [0u8; 6];
        key.encode_into(&mut buf);
        assert_eq!(Key::decode(KeyType::Text, &buf), key);
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::Integer(42).to_string(), "42");
        assert_eq!(Key::from("k").to_string(), "k");
    }
}
