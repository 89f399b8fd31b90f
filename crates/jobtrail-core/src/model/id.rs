//! Normalized entity identifiers.
//!
//! Identifiers start life as locally generated millisecond timestamps
//! (numbers) and are later replaced by ids issued by the remote store
//! (strings). [`EntityId`] stores the canonical string form so that both
//! shapes compare equal, and [`identities_match`] is the only comparison
//! the rest of the crate uses.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Identifier of an opportunity, calendar event, or chat message.
///
/// Always holds the canonical string form: trimmed, with integral
/// numbers rendered without a fractional part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Build an id from raw text, trimming surrounding whitespace.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no characters at all.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Issue a fresh timestamp-derived id.
    ///
    /// Starts from `now_millis` and counts upward until `is_taken`
    /// rejects nothing.
    #[must_use]
    pub fn fresh(now_millis: i64, mut is_taken: impl FnMut(&Self) -> bool) -> Self {
        let mut candidate = now_millis;
        loop {
            let id = Self::from(candidate);
            if !is_taken(&id) {
                return id;
            }
            candidate = candidate.wrapping_add(1);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
            Self((value as i64).to_string())
        } else {
            Self(value.to_string())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

macro_rules! id_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for EntityId {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

id_from_integer!(u32, i32, u64, i64, usize);

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or numeric identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(EntityId::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(EntityId::new(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(EntityId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(EntityId::from(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(EntityId::from_f64(v))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Anything that can be compared as an entity identity.
pub trait Identity {
    /// The canonical string form used for comparison.
    fn canonical(&self) -> Cow<'_, str>;
}

impl Identity for EntityId {
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.0)
    }
}

impl Identity for str {
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.trim())
    }
}

impl Identity for String {
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.trim())
    }
}

impl Identity for f64 {
    fn canonical(&self) -> Cow<'_, str> {
        Cow::Owned(EntityId::from_f64(*self).0)
    }
}

macro_rules! identity_for_integer {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                fn canonical(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

identity_for_integer!(u32, i32, u64, i64, usize);

impl<T: Identity + ?Sized> Identity for &T {
    fn canonical(&self) -> Cow<'_, str> {
        (**self).canonical()
    }
}

/// Whether two identifiers name the same entity.
///
/// Matches when the canonical string forms are identical, so `1` and
/// `"1"` match while `1` and `"2"` do not.
#[must_use]
pub fn identities_match<A, B>(a: &A, b: &B) -> bool
where
    A: Identity + ?Sized,
    B: Identity + ?Sized,
{
    a.canonical() == b.canonical()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_forms_match() {
        assert!(identities_match(&1_u64, "1"));
        assert!(identities_match("1", &1_u64));
        assert!(identities_match(&EntityId::from(1_i64), "1"));
        assert!(!identities_match(&1_u64, "2"));
    }

    #[test]
    fn matching_is_reflexive() {
        for id in [EntityId::new("abc"), EntityId::from(1_700_000_000_000_i64)] {
            assert!(identities_match(&id, &id));
        }
        assert!(identities_match("x", "x"));
        assert!(identities_match(&42_i32, &42_i32));
    }

    #[test]
    fn whitespace_is_not_significant() {
        assert!(identities_match(" 7 ", &7_u32));
        assert_eq!(EntityId::new("  abc\n"), EntityId::new("abc"));
    }

    #[test]
    fn integral_floats_canonicalize_to_integers() {
        assert!(identities_match(&1.0_f64, "1"));
        assert!(identities_match(&1.5_f64, "1.5"));
        assert!(!identities_match(&1.5_f64, "1"));
    }

    #[test]
    fn deserializes_from_string_or_number() {
        let from_num: EntityId = serde_json::from_str("1704067200000").expect("number id");
        let from_str: EntityId = serde_json::from_str("\"1704067200000\"").expect("string id");
        let from_float: EntityId = serde_json::from_str("3.0").expect("float id");
        assert_eq!(from_num, from_str);
        assert_eq!(from_float.as_str(), "3");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&EntityId::from(12_u64)).expect("serialize");
        assert_eq!(json, "\"12\"");
    }

    #[test]
    fn rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<EntityId>("{}").is_err());
        assert!(serde_json::from_str::<EntityId>("[1]").is_err());
    }

    #[test]
    fn fresh_skips_taken_ids() {
        let taken = [EntityId::from(100_i64), EntityId::from(101_i64)];
        let id = EntityId::fresh(100, |candidate| taken.contains(candidate));
        assert_eq!(id.as_str(), "102");
    }
}
