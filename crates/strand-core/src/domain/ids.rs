//! Domain identifiers (strongly-typed IDs).
//!
//! IDs are ULID-based: sortable by creation time, generatable without
//! coordination, 128-bit. A phantom-typed `Id<T>` provides one implementation
//! for all ID kinds while keeping them distinct types at compile time, so
//! an [`AttemptId`] can never be passed where a [`SessionId`] is expected.
//!
//! [`AttemptId`] is assigned by the outer scheduling engine and is stable
//! across process restarts and retry ticks of the same attempt; the domain
//! key derivation depends on that stability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for ID kinds. Supplies the `Display` prefix.
pub trait IdMarker: Send + Sync + 'static {
    /// Prefix used by `Display` (e.g. "attempt-").
    fn prefix() -> &'static str;
}

/// Generic ID type. `T` is a zero-sized marker; it costs nothing at runtime
/// but prevents mixing ID kinds at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Generate a fresh ID.
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for task attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attempt {}

impl IdMarker for Attempt {
    fn prefix() -> &'static str {
        "attempt-"
    }
}

/// Marker for remote client sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Session {}

impl IdMarker for Session {
    fn prefix() -> &'static str {
        "session-"
    }
}

/// Identifier of one task execution attempt (engine-assigned, restart-stable).
pub type AttemptId = Id<Attempt>;

/// Identifier of one scoped remote client session (one per `execute` call).
pub type SessionId = Id<Session>;
