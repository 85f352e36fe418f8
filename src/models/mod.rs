use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

pub mod movie;
pub mod rating;
pub mod user;

pub use movie::{Movie, MovieStats, NewMovie};
pub use rating::{NewRating, Rating};
pub use user::{NewUser, User};

/// Returns the canonical stored form of a reference.
///
/// Identifiers that parse as UUIDs are rewritten to the hyphenated lower-case form;
/// anything else is kept verbatim so legacy rows can still be matched on their raw text.
pub fn canonical_ref(raw: &str) -> String {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => id.to_string(),
        Err(_) => raw.to_string(),
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Parses the identifier into the store's native reference type.
            ///
            /// A malformed identifier yields `None` and is treated as "no match".
            pub fn native(&self) -> Option<Uuid> {
                Uuid::parse_str(self.0.trim()).ok()
            }

            /// Canonical textual form used for stored references
            pub fn canonical(&self) -> String {
                canonical_ref(&self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a movie in the catalog
    MovieId
);

string_id!(
    /// Identifier of a registered user
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ref_normalizes_uuid() {
        let id = Uuid::new_v4();
        let upper = id.to_string().to_uppercase();
        assert_eq!(canonical_ref(&upper), id.to_string());
        assert_eq!(canonical_ref(&id.simple().to_string()), id.to_string());
    }

    #[test]
    fn test_canonical_ref_keeps_legacy_text() {
        assert_eq!(canonical_ref("user-42"), "user-42");
    }

    #[test]
    fn test_malformed_id_has_no_native_form() {
        let id = MovieId::new("not-a-uuid");
        assert_eq!(id.native(), None);
        assert_eq!(id.canonical(), "not-a-uuid");
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = UserId::new("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""abc""#);

        let deserialized: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }
}
