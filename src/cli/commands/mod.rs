//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Partial success (some input files failed) |
//! | 2 | Configuration error |
//! | 4 | Store connection failure |
//! | 5 | Any other failure |
//! | 130 | Interrupted by a shutdown signal |

pub mod ingest;
pub mod init;
pub mod run;
pub mod status;
pub mod validate;

use crate::domain::{HealthmarkError, StoreError};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Maps an error to the exit code reported for it
pub fn exit_code_for(error: &HealthmarkError) -> i32 {
    match error {
        HealthmarkError::Configuration(_) => EXIT_CONFIG,
        HealthmarkError::Connection(_)
        | HealthmarkError::Store(StoreError::ConnectionFailed(_))
        | HealthmarkError::Store(StoreError::Timeout(_)) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&HealthmarkError::Configuration("x".into())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code_for(&StoreError::ConnectionFailed("x".into()).into()),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&StoreError::Timeout("x".into()).into()),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&HealthmarkError::SourceUnavailable("x".into())),
            EXIT_FATAL
        );
        assert_eq!(
            exit_code_for(&StoreError::WriteFailed("x".into()).into()),
            EXIT_FATAL
        );
    }
}
