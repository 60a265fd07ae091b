//! Error type for the visitation map core.
//!
//! Only failures that a caller can act on live here. Unresolvable country
//! codes are not errors: they resolve to the fallback coordinate and are
//! logged.

use std::fmt;

/// Error type for map loading and configuration.
#[derive(Debug, Clone)]
pub enum MapError {
    /// The world boundary document could not be read or parsed
    Boundary { message: String },
    /// A configuration or coordinate-table file is invalid
    Config { message: String },
    /// A `MapData` document is malformed
    Data { message: String },
    /// Reading a file failed
    Io { path: String, message: String },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Boundary { message } => {
                write!(f, "Boundary data unavailable: {}", message)
            }
            MapError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            MapError::Data { message } => {
                write!(f, "Invalid map data: {}", message)
            }
            MapError::Io { path, message } => {
                write!(f, "Failed to read '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Result type alias for map operations.
pub type Result<T> = std::result::Result<T, MapError>;

impl MapError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        MapError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        MapError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Extension trait for converting Option to MapError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a configuration error.
    fn ok_or_config(self, message: &str) -> Result<T>;

    /// Convert Option to Result with a boundary-data error.
    fn ok_or_boundary(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_config(self, message: &str) -> Result<T> {
        self.ok_or_else(|| MapError::config(message))
    }

    fn ok_or_boundary(self, message: &str) -> Result<T> {
        self.ok_or_else(|| MapError::Boundary {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MapError::Io {
            path: "world.json".to_string(),
            message: "not found".to_string(),
        };
        assert!(err.to_string().contains("world.json"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_boundary("no features");
        assert!(matches!(result, Err(MapError::Boundary { .. })));
        assert_eq!(Some(3).ok_or_config("unused").ok(), Some(3));
    }
}
