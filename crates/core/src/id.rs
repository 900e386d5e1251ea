//! Strongly-typed identifiers and the id source abstraction.
//!
//! Each record kind mints its own UUID newtype through [`entity_id!`] so ids
//! of different kinds cannot be mixed up. Fresh ids come from an [`IdSource`]
//! injected into the managers, which keeps tests deterministic.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh record identifiers.
///
/// Production code uses [`UuidV7Source`]; tests inject [`SequenceIdSource`]
/// for reproducible ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Time-ordered UUIDv7 id source (default).
#[derive(Debug, Default)]
pub struct UuidV7Source;

impl IdSource for UuidV7Source {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

/// Deterministic sequential id source for tests.
#[derive(Debug, Default)]
pub struct SequenceIdSource {
    next: AtomicU64,
}

impl SequenceIdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the sequence at a given counter value.
    pub fn starting_at(n: u64) -> Self {
        Self {
            next: AtomicU64::new(n),
        }
    }
}

impl IdSource for SequenceIdSource {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Uuid::from_u128(u128::from(n) + 1)
    }
}

/// Define a UUID-backed identifier newtype for one record kind.
#[macro_export]
macro_rules! entity_id {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(uuid::Uuid);

        impl $t {
            /// Create a new identifier from an injected id source.
            pub fn generate(ids: &dyn $crate::IdSource) -> Self {
                Self(ids.next_id())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<uuid::Uuid> for $t {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for uuid::Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = <uuid::Uuid as core::str::FromStr>::from_str(s).map_err(|e| {
                    $crate::DomainError::invalid_id(format!(
                        concat!(stringify!($t), ": {}"),
                        e
                    ))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    entity_id!(SampleId);

    #[test]
    fn sequence_source_is_deterministic() {
        let ids = SequenceIdSource::new();
        let a = SampleId::generate(&ids);
        let b = SampleId::generate(&ids);
        assert_ne!(a, b);

        let again = SequenceIdSource::new();
        assert_eq!(SampleId::generate(&again), a);
        assert_eq!(SampleId::generate(&again), b);
    }

    #[test]
    fn parses_and_displays_round_trip() {
        let ids = UuidV7Source;
        let id = SampleId::generate(&ids);
        let parsed: SampleId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_identifier() {
        let err = "not-a-uuid".parse::<SampleId>().unwrap_err();
        match err {
            crate::DomainError::InvalidId(msg) => assert!(msg.contains("SampleId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }
}
