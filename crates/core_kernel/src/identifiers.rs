//! Typed identifiers
//!
//! Each id is a UUID newtype displayed with a short prefix (`COM-...`), so a
//! client id can never be passed where a commission id is expected. Parsing
//! accepts the id with or without its prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Random (v4) id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Time-ordered (v7) id, for rows that are scanned in insert order
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
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
                write!(f, "{}-{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

typed_id!(PolicyId => "POL");
typed_id!(
    /// The policyholder whose khata records premiums and collections
    ClientId => "CLI"
);
typed_id!(InsurerId => "INS");
typed_id!(
    /// Agent of record; receives the commission from the insurer
    AgentId => "AGT"
);
typed_id!(SubAgentId => "SAG");
typed_id!(CommissionRuleId => "CRL");
typed_id!(CommissionId => "COM");
typed_id!(LedgerEntryId => "KHE");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_id_display() {
        let id = PolicyId::new();
        let display = id.to_string();
        assert!(display.starts_with("POL-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = PolicyId::new();
        let parsed: PolicyId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let client_id = ClientId::from(uuid);
        let back: Uuid = client_id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_parse_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: CommissionId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
        assert!(parsed.to_string().starts_with("COM-"));
    }
}
