//! Configuration structures for integrity-core.
//!
//! Configuration is explicit: the core never reads environment variables or
//! files. Callers build an `IntegrityConfig` (or take the default) and pass it
//! to signers and verifiers.

use time::Duration;

use crate::errors::{IntegrityError, IntegrityResult};
use crate::token::SigningAlgorithm;

/// Largest clock-skew tolerance `validate_config` accepts.
pub const MAX_CLOCK_SKEW: Duration = Duration::minutes(5);

/// Global configuration container.
#[derive(Debug, Clone, Default)]
pub struct IntegrityConfig {
    pub signing: SigningConfig,
    pub verification: VerificationConfig,
}

/// Signing-related configuration.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub algorithm: SigningAlgorithm,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::Rs512,
        }
    }
}

/// Verification-related configuration.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Tolerance applied to `iat`, `nbf` and `exp` comparisons.
    pub leeway: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            leeway: Duration::seconds(crate::defaults::CLOCK_SKEW_SECS),
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &IntegrityConfig) -> IntegrityResult<()> {
    if cfg.verification.leeway.is_negative() {
        return Err(IntegrityError::validation("leeway must not be negative"));
    }

    if cfg.verification.leeway > MAX_CLOCK_SKEW {
        return Err(IntegrityError::validation(format!(
            "leeway must not exceed {MAX_CLOCK_SKEW}"
        )));
    }

    Ok(())
}
