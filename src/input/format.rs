//! Resource file formats.

use std::fmt;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

/// Supported locale resource file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    Json,
    /// JSON with comments and trailing commas.
    Jsonc,
    /// `export default { ... }` JavaScript module.
    JavaScript,
    /// `export default { ... }` TypeScript module.
    TypeScript,
}

impl ResourceFormat {
    /// Infers the format from file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("jsonc" | "json5") => Some(Self::Jsonc),
            Some("js" | "mjs" | "cjs") => Some(Self::JavaScript),
            Some("ts" | "mts") => Some(Self::TypeScript),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_module(self) -> bool {
        matches!(self, Self::JavaScript | Self::TypeScript)
    }

    /// Grammar used to parse this format.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Json | Self::Jsonc => tree_sitter_json::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Jsonc => "jsonc",
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
        };
        f.write_str(name)
    }
}
