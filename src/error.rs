//! Error handling for portflow
//!
//! This module defines the crate error type and a Result alias. Port
//! operations never fail; the checked errors come from value extraction and
//! conversion, and from loading configuration.

use thiserror::Error;

/// Main error type for portflow operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// A value could not be extracted or converted to the requested type
    #[error("Cannot convert value of type {stored} to {requested}")]
    Conversion { stored: String, requested: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a conversion error from the stored and requested type names
    pub fn conversion(stored: impl Into<String>, requested: impl Into<String>) -> Self {
        FlowError::Conversion {
            stored: stored.into(),
            requested: requested.into(),
        }
    }

    /// Whether this error (or the error it wraps) is a conversion mismatch
    pub fn is_conversion(&self) -> bool {
        match self {
            FlowError::Conversion { .. } => true,
            FlowError::WithContext { source, .. } => source.is_conversion(),
            _ => false,
        }
    }
}

/// Result type alias for portflow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_message() {
        let err = FlowError::conversion("i32", "alloc::string::String");
        assert_eq!(
            err.to_string(),
            "Cannot convert value of type i32 to alloc::string::String"
        );
        assert!(err.is_conversion());
    }

    #[test]
    fn test_error_context() {
        let result: Result<()> = Err(FlowError::Config("bad value".to_string()));
        let err = result.context("loading runtime config").unwrap_err();
        assert_eq!(
            err.to_string(),
            "loading runtime config: Configuration error: bad value"
        );
        assert!(!err.is_conversion());
    }

    #[test]
    fn test_lazy_context_keeps_conversion_kind() {
        let result: Result<()> = Err(FlowError::conversion("f32", "u8"));
        let err = result.with_context(|| "extracting property".to_string()).unwrap_err();
        assert!(err.is_conversion());
    }
}
