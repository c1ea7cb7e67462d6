use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure raised by the access layer maps to one of these kinds. Each
/// kind has a stable error code usable for programmatic handling and tests.
///
/// Kinds touching the cache (`CacheTransport`, `Deserialization`,
/// `Serialization`) are recovered inside the access layer and only ever show
/// up in logs; kinds touching the relational store are surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    /// An update targeted a filter that matches more than one record
    AmbiguousMatch,
    ConstraintViolation,

    // Cache
    /// Cache store unreachable or timed out
    CacheTransport,
    /// Cached blob is corrupt or belongs to another entity shape
    Deserialization,
    Serialization,

    // Relational store
    Persistence,

    // Programming errors
    /// Identity resolution shape that the access layer does not support
    NotImplemented,

    Io,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::AmbiguousMatch => "ERR_AMBIGUOUS_MATCH",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::CacheTransport => "ERR_CACHE_TRANSPORT",
            ExErrorKind::Deserialization => "ERR_DESERIALIZATION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::NotImplemented => "ERR_NOT_IMPLEMENTED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether failures of this kind are absorbed by the access layer
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExErrorKind::CacheTransport | ExErrorKind::Deserialization | ExErrorKind::Serialization
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context (operation, entity
/// name, cache key) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<String>,
    cache_key: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            cache_key: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity type context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add cache key context
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity type context, if any
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Get the cache key context, if any
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(key) = &self.cache_key {
            write!(f, " (cache_key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Failures reported by a cache store
///
/// Absence is not an error: `CacheStore::get` returns `Ok(None)` for a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store could not be reached or did not answer in time
    #[error("cache transport failure: {message}")]
    Transport { message: String },

    /// The store answered with something other than a string blob
    #[error("unexpected cache reply: {message}")]
    UnexpectedReply { message: String },

    /// The requested lifetime cannot be represented as an expiry instant
    #[error("cache ttl of {ttl_seconds}s is out of range")]
    TtlOutOfRange { ttl_seconds: u64 },
}

impl CacheError {
    pub fn transport(message: impl Into<String>) -> Self {
        CacheError::Transport {
            message: message.into(),
        }
    }
}

impl From<CacheError> for ExError {
    fn from(err: CacheError) -> Self {
        let message = err.to_string();
        match err {
            CacheError::Transport { .. } => ExError::new(ExErrorKind::CacheTransport)
                .with_op("cache_io")
                .with_message(message),
            CacheError::UnexpectedReply { .. } => ExError::new(ExErrorKind::Deserialization)
                .with_op("cache_io")
                .with_message(message),
            CacheError::TtlOutOfRange { .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("cache_io")
                .with_message(message),
        }
    }
}
