use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Preference-store errors with user-facing messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another feedwire process holds the preference database
    #[error("Another instance of feedwire appears to be running. Please close it and try again.")]
    InstanceLocked,

    #[error("Preference store migration failed: {0}")]
    Migration(String),

    #[error("Preference store error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, mapping SQLite lock conditions to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN surface only through their messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}
