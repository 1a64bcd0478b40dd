//! Exercise model

use serde::{Deserialize, Serialize};

use crate::constants::file_extensions;

/// A single gradable programming problem with fixed unit tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub author_id: Option<i64>,
    pub title: String,
    pub language: Language,
    pub level: Option<Level>,
    pub content: String,
}

/// Languages a solution can be submitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    Rust,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 3] = [Self::Python, Self::Cpp, Self::Rust];

    /// Get language as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Cpp => "cpp",
            Self::Rust => "rust",
        }
    }

    /// Parse language from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Self::Python),
            "cpp" | "c++" => Some(Self::Cpp),
            "rust" | "rs" => Some(Self::Rust),
            _ => None,
        }
    }

    /// Extension an uploaded solution must carry, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Python => file_extensions::PYTHON,
            Self::Cpp => file_extensions::CPP,
            Self::Rust => file_extensions::RUST,
        }
    }

    /// Whether a build step runs before the tests
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Cpp | Self::Rust)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exercise advancement levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trip_names() {
        for language in Language::ALL {
            assert_eq!(Language::from_str(language.as_str()), Some(language));
        }
        assert_eq!(Language::from_str("C++"), Some(Language::Cpp));
        assert_eq!(Language::from_str("cobol"), None);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(Language::Python.extension(), ".py");
        assert_eq!(Language::Cpp.extension(), ".cpp");
        assert_eq!(Language::Rust.extension(), ".rs");
        assert!(!Language::Python.is_compiled());
        assert!(Language::Rust.is_compiled());
    }
}
