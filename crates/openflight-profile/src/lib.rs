//! Tuning profile types and validation
//!
//! This crate provides the persisted tuning-profile surface of the
//! attitude-control loop: the per-axis PID-F gain banks, filter cutoffs,
//! compensation-stage parameters and the loop-rate configuration. The
//! storage layer owns persistence and versioned encoding; the control core
//! derives its working coefficients from a validated profile.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::validate_profile;

use thiserror::Error;

/// Current profile schema version.
/// Increment this when the `PidProfile` structure changes incompatibly.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Errors produced while validating or migrating a profile.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A field is outside its documented range.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The profile was written by a newer release.
    #[error("Unsupported schema version {0}: maximum supported is {1}")]
    UnsupportedVersion(u32, u32),
}

/// Result alias for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Migrate a profile to the current schema version.
///
/// Returns `Ok(true)` if migration was performed, `Ok(false)` if the profile
/// was already at the current version.
///
/// # Errors
///
/// Returns [`ProfileError::UnsupportedVersion`] if `profile.schema_version`
/// is greater than [`CURRENT_SCHEMA_VERSION`] (future profile from a newer
/// release).
pub fn migrate_profile(profile: &mut PidProfile) -> ProfileResult<bool> {
    if profile.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(ProfileError::UnsupportedVersion(
            profile.schema_version,
            CURRENT_SCHEMA_VERSION,
        ));
    }
    if profile.schema_version == CURRENT_SCHEMA_VERSION {
        return Ok(false);
    }

    // Migration v0 -> v1: no structural changes; just set the version field.
    // Add additional `if profile.schema_version < N` blocks for future
    // versions.
    profile.schema_version = CURRENT_SCHEMA_VERSION;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_current_schema_version() {
        let profile = PidProfile::named("test");
        assert_eq!(profile.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_profile_already_current() -> Result<(), ProfileError> {
        let mut profile = PidProfile::named("test");
        let migrated = migrate_profile(&mut profile)?;
        assert!(!migrated, "already-current profile must not be migrated");
        Ok(())
    }

    #[test]
    fn test_migrate_profile_from_v0() -> Result<(), ProfileError> {
        let mut profile = PidProfile::named("test");
        profile.schema_version = 0;

        let migrated = migrate_profile(&mut profile)?;
        assert!(migrated, "v0 profile must be migrated");
        assert_eq!(profile.schema_version, CURRENT_SCHEMA_VERSION);
        Ok(())
    }

    #[test]
    fn test_migrate_profile_idempotent() -> Result<(), ProfileError> {
        let mut profile = PidProfile::named("test");
        profile.schema_version = 0;

        migrate_profile(&mut profile)?;
        let migrated_again = migrate_profile(&mut profile)?;
        assert!(!migrated_again, "second migration must be a no-op");
        Ok(())
    }

    #[test]
    fn test_migrate_profile_future_version_returns_error() {
        let mut profile = PidProfile::named("test");
        profile.schema_version = CURRENT_SCHEMA_VERSION + 1;

        let result = migrate_profile(&mut profile);
        assert!(
            matches!(result, Err(ProfileError::UnsupportedVersion(_, _))),
            "error must be UnsupportedVersion"
        );
    }
}
