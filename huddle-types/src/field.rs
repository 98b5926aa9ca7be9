//! Three-valued payload fields.
//!
//! Partial updates distinguish a key that was left out of the payload from a
//! key that was sent with an empty or null value. [`Field`] carries that
//! distinction through decoding: a missing key becomes [`Field::Absent`], a
//! present key (including `null`) becomes [`Field::Present`].
//!
//! Use it with `#[serde(default)]` on the containing struct field so a missing
//! key falls back to `Absent`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A payload field that is either absent or present with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The key was not part of the payload. Leave the existing value alone.
    Absent,
    /// The key was part of the payload. Overwrite with this value.
    Present(T),
}

impl<T> Field<T> {
    /// True if the key was omitted.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True if the key was included.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Borrow the inner value.
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Absent => Field::Absent,
            Self::Present(value) => Field::Present(value),
        }
    }

    /// Convert into an `Option`, losing the absent/present distinction
    /// for nullable inner types.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }

    /// Map the present value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Absent => Field::Absent,
            Self::Present(value) => Field::Present(f(value)),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Pair with `skip_serializing_if = "Field::is_absent"` to omit the key.
            Self::Absent => serializer.serialize_none(),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Probe {
        #[serde(default, skip_serializing_if = "Field::is_absent")]
        name: Field<Option<String>>,
    }

    #[test]
    fn missing_key_is_absent() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        assert!(probe.name.is_absent());
    }

    #[test]
    fn null_is_present_none() {
        let probe: Probe = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(probe.name, Field::Present(None));
    }

    #[test]
    fn empty_string_is_present() {
        let probe: Probe = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert_eq!(probe.name, Field::Present(Some(String::new())));
    }

    #[test]
    fn absent_is_skipped_on_encode() {
        let probe = Probe {
            name: Field::Absent,
        };
        assert_eq!(serde_json::to_string(&probe).unwrap(), "{}");

        let probe = Probe {
            name: Field::Present(None),
        };
        assert_eq!(serde_json::to_string(&probe).unwrap(), r#"{"name":null}"#);
    }

    #[test]
    fn map_keeps_absence() {
        let absent: Field<u32> = Field::Absent;
        assert!(absent.map(|v| v + 1).is_absent());
        assert_eq!(Field::Present(1).map(|v| v + 1), Field::Present(2));
    }
}
