//! Error types for the onboarding flow.

use crate::layout::BucketId;

/// Top-level error type for the backend server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Transport-level failures talking to a remote collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("{endpoint} answered with unexpected status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Failures of the configuration store client.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Fetch or parse failure. Callers degrade to an empty layout.
    #[error("Step configuration unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to save step {bucket} configuration: {reason}")]
    SaveFailed { bucket: BucketId, reason: String },
}

/// User-facing wizard errors. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,

    #[error("Please fill out all required fields.")]
    IncompleteStep { missing: Vec<String> },

    #[error("Incorrect password. Please try again.")]
    AuthUnauthorized,

    #[error("Failed to register. Please try again.")]
    RegistrationFailed { reason: String },

    #[error("Failed to log in. Please try again.")]
    AuthFailed { reason: String },

    #[error("Failed to save user data. Please try again.")]
    PersistenceFailure { reason: String },

    #[error("Cannot {action} from {step}")]
    InvalidTransition { action: &'static str, step: String },
}

/// Reorder engine errors.
#[derive(Debug, thiserror::Error)]
pub enum ReorderError {
    #[error("Each step must have at least one field.")]
    WouldEmptyBucket { bucket: BucketId },

    #[error("Field {field} is not in step {bucket}")]
    NotInBucket { field: String, bucket: BucketId },

    /// Local state already reflects `operation`; remote state may not.
    #[error("Failed to save changes to step(s) {}. Please try again.", format_buckets(.failed))]
    PersistenceFailed {
        failed: Vec<BucketId>,
        operation: Option<crate::admin::ReorderOperation>,
    },
}

fn format_buckets(buckets: &[BucketId]) -> String {
    buckets
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for the backend service.
pub type Result<T> = std::result::Result<T, Error>;
