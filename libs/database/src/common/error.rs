use super::context::ContextError;

/// Boxed source for store failures, whatever layer raised them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error taxonomy shared by every repository.
///
/// Variants carry the operation and collection so callers can log or map them
/// without re-wrapping.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The identity string could not be parsed into the store-native id type
    #[error("Invalid identity: '{0}'")]
    InvalidIdentity(String),

    /// Nothing in the collection matches the id or filter
    #[error("No document in '{collection}' matches {key}")]
    NotFound { collection: String, key: String },

    /// Network, serialization, or driver failure
    #[error("{operation} on '{collection}' failed: {source}")]
    Persistence {
        operation: &'static str,
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation} on '{collection}' was canceled")]
    Canceled {
        operation: &'static str,
        collection: String,
    },

    #[error("{operation} on '{collection}' exceeded its deadline")]
    DeadlineExceeded {
        operation: &'static str,
        collection: String,
    },
}

impl RepositoryError {
    pub fn persistence(
        operation: &'static str,
        collection: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        RepositoryError::Persistence {
            operation,
            collection: collection.into(),
            source: source.into(),
        }
    }

    pub fn not_found(collection: impl Into<String>, key: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            collection: collection.into(),
            key: key.into(),
        }
    }

    pub fn interrupted(
        operation: &'static str,
        collection: impl Into<String>,
        reason: ContextError,
    ) -> Self {
        let collection = collection.into();
        match reason {
            ContextError::Canceled => RepositoryError::Canceled {
                operation,
                collection,
            },
            ContextError::DeadlineExceeded => RepositoryError::DeadlineExceeded {
                operation,
                collection,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_maps_context_reason() {
        let canceled = RepositoryError::interrupted("find_by_id", "users", ContextError::Canceled);
        assert!(matches!(canceled, RepositoryError::Canceled { operation: "find_by_id", .. }));

        let expired =
            RepositoryError::interrupted("count", "users", ContextError::DeadlineExceeded);
        assert!(expired.to_string().contains("count on 'users' exceeded its deadline"));
    }

    #[test]
    fn test_persistence_keeps_source() {
        let err = RepositoryError::persistence("create", "users", "connection reset");
        assert_eq!(err.to_string(), "create on 'users' failed: connection reset");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_message() {
        let err = RepositoryError::not_found("users", "email=a@x.com");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No document in 'users' matches email=a@x.com");
    }
}
