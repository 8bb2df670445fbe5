use thiserror::Error;

/// Error types for the page engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTML parsing error
    #[error("HTML parse error: {0}")]
    Html(String),
    /// CSS parsing error
    #[error("CSS parse error: {0}")]
    Css(String),
    /// Layout computation error
    #[error("layout error: {0}")]
    Layout(String),
    /// A resource limit was exceeded in a way that cannot be clipped
    #[error("resource limit exceeded: {0}")]
    Limit(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Html("unexpected end of input".to_string());
        assert_eq!(err.to_string(), "HTML parse error: unexpected end of input");

        let err = EngineError::Layout("taffy rejected the tree".to_string());
        assert_eq!(err.to_string(), "layout error: taffy rejected the tree");
    }
}
