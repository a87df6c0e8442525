//! Locale resource: one language's tree of UI strings.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::fmt::Write as _;
use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use super::error::ResourceError;
use super::format::ResourceFormat;
use super::locale::detect_locale_from_path;
use super::{
    json,
    module,
};
use crate::key::{
    join_key,
    split_key,
};
use crate::types::SourceRange;

/// Children of a namespace node, sorted by key.
pub type NodeMap = BTreeMap<String, ResourceNode>;

/// A node in the key hierarchy: either a namespace or a leaf template string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceNode {
    Leaf(String),
    Namespace(NodeMap),
}

impl ResourceNode {
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Namespace(_) => None,
        }
    }

    #[must_use]
    pub const fn as_namespace(&self) -> Option<&NodeMap> {
        match self {
            Self::Namespace(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Number of leaf strings at or below this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Namespace(children) => children.values().map(Self::leaf_count).sum(),
        }
    }

    /// Converts a JSON value, rejecting anything but strings and objects.
    pub(crate) fn from_json(value: &Value, key: Option<&str>) -> Result<Self, ResourceError> {
        match value {
            Value::String(s) => Ok(Self::Leaf(s.clone())),
            Value::Object(map) => {
                let mut children = NodeMap::new();
                for (child_key, child) in map {
                    let path = join_key(key, child_key, ".");
                    children.insert(child_key.clone(), Self::from_json(child, Some(&path))?);
                }
                Ok(Self::Namespace(children))
            }
            other => Err(ResourceError::NonStringLeaf {
                key: key.unwrap_or_default().to_string(),
                kind: json_kind(other).to_string(),
            }),
        }
    }
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tree and key locations produced by a parser.
#[derive(Debug, Default)]
pub(crate) struct ParsedResource {
    pub(crate) root: NodeMap,
    /// Key segments → range of the key token.
    pub(crate) key_ranges: HashMap<Vec<String>, SourceRange>,
}

/// Where a resource was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOrigin {
    pub path: PathBuf,
    pub format: ResourceFormat,
}

/// The full string table for one display language.
#[derive(Debug, Clone)]
pub struct LocaleResource {
    locale: String,
    origin: Option<ResourceOrigin>,
    root: NodeMap,
    key_ranges: HashMap<Vec<String>, SourceRange>,
}

impl LocaleResource {
    /// Creates a resource from an already-built tree.
    #[must_use]
    pub fn new(locale: impl Into<String>, root: NodeMap) -> Self {
        Self { locale: locale.into(), origin: None, root, key_ranges: HashMap::new() }
    }

    /// Builds a resource from a JSON object.
    pub fn from_json_value(locale: impl Into<String>, value: &Value) -> Result<Self, ResourceError> {
        let Value::Object(_) = value else {
            return Err(ResourceError::RootNotObject { kind: json_kind(value) });
        };
        let ResourceNode::Namespace(root) = ResourceNode::from_json(value, None)? else {
            return Err(ResourceError::RootNotObject { kind: json_kind(value) });
        };
        Ok(Self::new(locale, root))
    }

    /// Parses resource text in the given format.
    pub fn parse(
        text: &str,
        format: ResourceFormat,
        locale: impl Into<String>,
    ) -> Result<Self, ResourceError> {
        let parsed = if format.is_module() {
            module::parse(text, format)?
        } else {
            json::parse(text, format)?
        };

        Ok(Self {
            locale: locale.into(),
            origin: None,
            root: parsed.root,
            key_ranges: parsed.key_ranges,
        })
    }

    /// Parses the contents of a resource file, detecting format and locale from its path.
    ///
    /// The locale falls back to the file stem when the path names no known locale.
    pub fn from_file_contents(path: &Path, text: &str) -> Result<Self, ResourceError> {
        Self::from_contents_detecting(path, path, text)
    }

    /// Like [`Self::from_file_contents`], but only the part of `path` below
    /// `workspace_root` is searched for a locale tag.
    ///
    /// A directory above the workspace never names the locale of a file in it.
    pub fn from_workspace_file(
        path: &Path,
        workspace_root: &Path,
        text: &str,
    ) -> Result<Self, ResourceError> {
        let relative = path.strip_prefix(workspace_root).unwrap_or(path);
        Self::from_contents_detecting(path, relative, text)
    }

    fn from_contents_detecting(
        path: &Path,
        detect_from: &Path,
        text: &str,
    ) -> Result<Self, ResourceError> {
        let format = ResourceFormat::from_path(path)
            .ok_or_else(|| ResourceError::UnsupportedFormat(path.to_path_buf()))?;
        let locale = detect_locale_from_path(detect_from).unwrap_or_else(|| {
            path.file_stem().map_or_else(String::new, |stem| stem.to_string_lossy().to_string())
        });

        let mut resource = Self::parse(text, format, locale)?;
        resource.origin = Some(ResourceOrigin { path: path.to_path_buf(), format });
        Ok(resource)
    }

    /// Reads and parses a resource file.
    pub fn load(path: &Path) -> Result<Self, ResourceError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ResourceError::Io { path: path.to_path_buf(), source })?;
        Self::from_file_contents(path, &text)
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub const fn origin(&self) -> Option<&ResourceOrigin> {
        self.origin.as_ref()
    }

    #[must_use]
    pub const fn root(&self) -> &NodeMap {
        &self.root
    }

    /// Records where the resource text came from.
    #[must_use]
    pub fn with_origin(mut self, origin: ResourceOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Resolves a key path to a node.
    #[must_use]
    pub fn get(&self, key: &str, separator: &str) -> Option<&ResourceNode> {
        let mut segments = split_key(key, separator).into_iter();
        let mut node = self.root.get(segments.next()?)?;
        for segment in segments {
            node = node.as_namespace()?.get(segment)?;
        }
        Some(node)
    }

    /// Resolves a key path to a leaf string.
    #[must_use]
    pub fn leaf(&self, key: &str, separator: &str) -> Option<&str> {
        self.get(key, separator).and_then(ResourceNode::as_leaf)
    }

    /// Number of leaf strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.values().map(ResourceNode::leaf_count).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the tree into joined key paths.
    ///
    /// ```
    /// use drive_i18n::input::resource::LocaleResource;
    /// use serde_json::json;
    ///
    /// let json = json!({ "app": { "sort": { "name_asc": "Name ascending" } } });
    /// let resource = LocaleResource::from_json_value("en-US", &json).unwrap();
    ///
    /// let flattened = resource.flatten(".");
    /// assert_eq!(flattened.get("app.sort.name_asc"), Some(&"Name ascending"));
    /// ```
    #[must_use]
    pub fn flatten(&self, separator: &str) -> BTreeMap<String, &str> {
        let mut result = BTreeMap::new();
        flatten_nodes(&self.root, separator, None, &mut result);
        result
    }

    /// All leaf key paths, sorted.
    #[must_use]
    pub fn key_paths(&self, separator: &str) -> Vec<String> {
        self.flatten(separator).into_keys().collect()
    }

    /// Range of the key token in the source file, if parsed from text.
    #[must_use]
    pub fn key_range(&self, key: &str, separator: &str) -> Option<SourceRange> {
        self.key_range_at(&split_key(key, separator))
    }

    /// Range of the key token addressed by raw segments.
    ///
    /// Works for keys that no joined path can address, such as a key
    /// containing the separator.
    #[must_use]
    pub fn key_range_at(&self, segments: &[&str]) -> Option<SourceRange> {
        let segments: Vec<String> = segments.iter().map(ToString::to_string).collect();
        self.key_ranges.get(&segments).copied()
    }

    /// Returns true if both resources hold the same tree.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.root == other.root
    }

    /// Pretty-printed JSON document.
    pub fn to_json_string(&self) -> Result<String, ResourceError> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        Ok(text)
    }

    /// `export default { ... }` module text in the style of hand-written locale files.
    #[must_use]
    pub fn to_js_module(&self) -> String {
        let mut out = String::from("export default ");
        write_js_object(&mut out, &self.root, 0);
        out.push('\n');
        out
    }
}

fn flatten_nodes<'a>(
    nodes: &'a NodeMap,
    separator: &str,
    prefix: Option<&str>,
    result: &mut BTreeMap<String, &'a str>,
) {
    for (key, node) in nodes {
        let full_key = join_key(prefix, key, separator);
        match node {
            ResourceNode::Leaf(value) => {
                result.insert(full_key, value.as_str());
            }
            ResourceNode::Namespace(children) => {
                flatten_nodes(children, separator, Some(&full_key), result);
            }
        }
    }
}

fn is_js_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn write_js_string(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn write_js_object(out: &mut String, nodes: &NodeMap, depth: usize) {
    if nodes.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push_str("{\n");
    let indent = "  ".repeat(depth + 1);
    let count = nodes.len();
    for (index, (key, node)) in nodes.iter().enumerate() {
        out.push_str(&indent);
        if is_js_identifier(key) {
            out.push_str(key);
        } else {
            write_js_string(out, key);
        }
        out.push_str(": ");
        match node {
            ResourceNode::Leaf(value) => write_js_string(out, value),
            ResourceNode::Namespace(children) => write_js_object(out, children, depth + 1),
        }
        if index + 1 < count {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&"  ".repeat(depth));
    out.push('}');
}
