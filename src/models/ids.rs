//! Identifier newtypes
//!
//! Transactions, categories and owners are all keyed by v4 UUIDs. Each gets
//! its own type so an owner id can never be passed where a transaction id
//! is expected. In terminal output an id is shortened to its kind prefix and
//! the first eight hex digits (`txn-65c2fad6`); on disk and in reference
//! tokens the full UUID is used.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Prefix of the short display form
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let hex = self.0.simple().to_string();
                write!(f, "{}{}", Self::PREFIX, &hex[..8])
            }
        }

        /// Accepts the full UUID, bare or behind the display prefix
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let bare = s.strip_prefix(Self::PREFIX).unwrap_or(s);
                Uuid::parse_str(bare).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Identifies a transaction; `$<uuid>` in an expression refers to one
    TransactionId => "txn-"
}

uuid_id! {
    CategoryId => "cat-"
}

uuid_id! {
    /// The identity a transaction belongs to; references never cross owners
    OwnerId => "own-"
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENT: &str = "65c2fad6-922d-4a98-b445-b22df83aca14";

    #[test]
    fn test_short_display() {
        let id: TransactionId = RENT.parse().unwrap();
        assert_eq!(id.to_string(), "txn-65c2fad6");

        let owner: OwnerId = RENT.parse().unwrap();
        assert_eq!(owner.to_string(), "own-65c2fad6");
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let bare: CategoryId = RENT.parse().unwrap();
        let prefixed: CategoryId = format!("cat-{}", RENT).parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.as_uuid().to_string(), RENT);
    }

    #[test]
    fn test_short_form_and_wrong_prefix_are_rejected() {
        assert!("txn-65c2fad6".parse::<TransactionId>().is_err());
        assert!(format!("cat-{}", RENT).parse::<TransactionId>().is_err());
        assert!("tx-123".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_uuid() {
        let id: OwnerId = RENT.parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", RENT));

        let back: OwnerId = serde_json::from_str(&format!("\"{}\"", RENT)).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(TransactionId::new(), TransactionId::new());
    }
}
