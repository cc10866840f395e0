//! Time sources.
//!
//! Signers and verifiers read "now" through a `Clock` handed to them at
//! construction. Production code uses `SystemClock`; tests pin time with
//! `FixedClock`. There is no process-wide override.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::errors::{IntegrityError, IntegrityResult};

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Current time as whole seconds since the Unix epoch.
    fn now_unix(&self) -> i64 {
        self.now().unix_timestamp()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: OffsetDateTime,
}

impl FixedClock {
    pub fn new(at: OffsetDateTime) -> Self {
        Self { at }
    }

    pub fn from_unix(secs: i64) -> IntegrityResult<Self> {
        let at = OffsetDateTime::from_unix_timestamp(secs)
            .map_err(|e| IntegrityError::validation(format!("invalid unix timestamp {secs}: {e}")))?;
        Ok(Self { at })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.at
    }
}

/// Shared clock handle held by signers and verifiers.
#[derive(Clone)]
pub struct SharedClock(Arc<dyn Clock>);

impl SharedClock {
    pub fn new<C: Clock + 'static>(clock: C) -> Self {
        Self(Arc::new(clock))
    }

    pub fn now_unix(&self) -> i64 {
        self.0.now_unix()
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl fmt::Debug for SharedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedClock").field(&self.0.now()).finish()
    }
}
