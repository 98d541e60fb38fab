use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a compiled asset.
///
/// The canonical string form is a lowercase hyphenated UUID, which is also
/// the file stem of the compiled record on disk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(Uuid);

/// Error returned when a string is not a valid [`Uid`].
#[derive(Error, Debug)]
pub enum UidParseError {
    /// The string is empty.
    #[error("empty uid")]
    Empty,
    /// The string parses to the nil uuid, which never identifies an asset.
    #[error("nil uid")]
    Nil,
    /// The string is not a uuid.
    #[error("malformed uid: {0}")]
    Malformed(#[source] uuid::Error),
}

impl Uid {
    /// Creates a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an id from raw 128 bits. Returns `None` for zero.
    pub fn from_u128(value: u128) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(Uuid::from_u128(value)))
        }
    }

    /// Returns the raw 128 bits of the id.
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Uid").field(&self.to_string()).finish()
    }
}

impl FromStr for Uid {
    type Err = UidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UidParseError::Empty);
        }
        let id = Uuid::parse_str(s).map_err(UidParseError::Malformed)?;
        if id.is_nil() {
            Err(UidParseError::Nil)
        } else {
            Ok(Self(id))
        }
    }
}

impl Serialize for Uid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_u128(self.as_u128())
        }
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        if deserializer.is_human_readable() {
            let value = String::deserialize(deserializer)?;
            value.parse().map_err(D::Error::custom)
        } else {
            let value = u128::deserialize(deserializer)?;
            Self::from_u128(value).ok_or_else(|| D::Error::custom(UidParseError::Nil))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let uid = Uid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef).unwrap();
        assert_eq!(uid.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(uid.to_string().parse::<Uid>().unwrap(), uid);
    }

    #[test]
    fn accepts_other_uuid_forms() {
        let uid: Uid = "01234567-89ab-cdef-0123-456789abcdef".parse().unwrap();
        assert_eq!("0123456789ABCDEF0123456789ABCDEF".parse::<Uid>().unwrap(), uid);
        assert_eq!(
            "{01234567-89ab-cdef-0123-456789abcdef}".parse::<Uid>().unwrap(),
            uid
        );
    }

    #[test]
    fn rejects_invalid() {
        assert!(matches!("".parse::<Uid>(), Err(UidParseError::Empty)));
        assert!(matches!("   ".parse::<Uid>(), Err(UidParseError::Empty)));
        assert!(matches!(
            "not-a-uid".parse::<Uid>(),
            Err(UidParseError::Malformed(_))
        ));
        assert!(matches!(
            "00000000-0000-0000-0000-000000000000".parse::<Uid>(),
            Err(UidParseError::Nil)
        ));
        assert!(Uid::from_u128(0).is_none());
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(Uid::generate(), Uid::generate());
    }

    #[test]
    fn serde_as_string() {
        let uid = Uid::generate();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, format!("\"{}\"", uid));
        let back: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
    }
}
