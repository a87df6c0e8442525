//! JSON and JSONC resource parsing.

use std::collections::HashMap;

use jsonc_parser::ParseOptions;
use serde_json::Value;

use super::error::ResourceError;
use super::format::ResourceFormat;
use super::resource::{
    ParsedResource,
    ResourceNode,
    json_kind,
};
use crate::types::SourceRange;

/// Parses a JSON or JSONC document into a resource tree.
///
/// Values come from `serde_json` (strict JSON) or `jsonc-parser` (comments and
/// trailing commas); key ranges and duplicate detection come from tree-sitter.
pub(crate) fn parse(text: &str, format: ResourceFormat) -> Result<ParsedResource, ResourceError> {
    // Editors on Windows often save locale files with a byte order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let value: Value = match format {
        ResourceFormat::Jsonc => jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
            .map_err(|e| ResourceError::Syntax(e.to_string()))?
            .ok_or(ResourceError::RootNotObject { kind: "empty document" })?,
        _ => serde_json::from_str(text).map_err(|e| ResourceError::Syntax(e.to_string()))?,
    };

    let Value::Object(_) = &value else {
        return Err(ResourceError::RootNotObject { kind: json_kind(&value) });
    };
    let ResourceNode::Namespace(root) = ResourceNode::from_json(&value, None)? else {
        return Err(ResourceError::RootNotObject { kind: json_kind(&value) });
    };

    let key_ranges = extract_key_ranges(text)?;

    Ok(ParsedResource { root, key_ranges })
}

/// Extract key source ranges from JSON text using tree-sitter.
///
/// Fails on a key declared twice in the same object, which `serde_json`
/// would otherwise silently collapse to the last value.
pub(crate) fn extract_key_ranges(
    json_text: &str,
) -> Result<HashMap<Vec<String>, SourceRange>, ResourceError> {
    let mut key_ranges = HashMap::new();

    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&ResourceFormat::Json.tree_sitter_language())?;
    let tree = parser.parse(json_text, None).ok_or(ResourceError::ParseFailed)?;

    extract_keys_from_node(tree.root_node(), json_text.as_bytes(), &[], &mut key_ranges)?;

    Ok(key_ranges)
}

fn extract_keys_from_node(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    prefix: &[String],
    key_ranges: &mut HashMap<Vec<String>, SourceRange>,
) -> Result<(), ResourceError> {
    match node.kind() {
        "document" | "object" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                extract_keys_from_node(child, source, prefix, key_ranges)?;
            }
        }
        "pair" => extract_pair(node, source, prefix, key_ranges)?,
        _ => {}
    }
    Ok(())
}

fn extract_pair(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    prefix: &[String],
    key_ranges: &mut HashMap<Vec<String>, SourceRange>,
) -> Result<(), ResourceError> {
    let Some(key_node) = node.child_by_field_name("key") else {
        return Ok(());
    };
    let Some(value_node) = node.child_by_field_name("value") else {
        return Ok(());
    };

    let Ok(key_text) = key_node.utf8_text(source) else {
        tracing::warn!("Failed to get key text from node");
        return Ok(());
    };
    let key = serde_json::from_str::<String>(key_text)
        .unwrap_or_else(|_| key_text.trim_matches('"').to_string());

    let mut path = prefix.to_vec();
    path.push(key);

    if key_ranges.insert(path.clone(), SourceRange::from_node(&key_node)).is_some() {
        return Err(ResourceError::DuplicateKey { key: path.join(".") });
    }

    if value_node.kind() == "object" {
        extract_keys_from_node(value_node, source, &path, key_ranges)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[googletest::test]
    fn test_parse_nested_json() {
        let text = r#"{
  "app": {
    "login": "Log in",
    "sort": { "name_asc": "Name ascending" }
  },
  "form": { "required_msg": "{f} is required" }
}"#;

        let parsed = parse(text, ResourceFormat::Json).unwrap();

        expect_that!(parsed.root.len(), eq(2));
        expect_that!(parsed.key_ranges.len(), eq(6));
        let range = parsed.key_ranges.get(&path(&["app", "login"])).copied();
        expect_that!(range.map(|r| r.start.line), some(eq(2)));
        expect_that!(range.map(|r| r.start.character), some(eq(4)));
    }

    #[googletest::test]
    fn test_parse_jsonc_with_comments_and_trailing_commas() {
        let text = r#"{
  // dialog buttons
  "dialog": {
    "base": { "ok": "OK", },
  },
}"#;

        let parsed = parse(text, ResourceFormat::Jsonc).unwrap();

        expect_that!(parsed.root.get("dialog").map(ResourceNode::leaf_count), some(eq(1)));
    }

    #[rstest]
    #[case::json(ResourceFormat::Json)]
    #[case::jsonc(ResourceFormat::Jsonc)]
    fn test_leading_bom_is_skipped(#[case] format: ResourceFormat) {
        let text = "\u{feff}{\n  \"app\": { \"login\": \"Log in\" }\n}";

        let parsed = parse(text, format).unwrap();

        assert_that!(parsed.root.get("app").map(ResourceNode::leaf_count), some(eq(1)));
        let range = parsed.key_ranges.get(&path(&["app", "login"])).copied();
        assert_that!(range.map(|r| r.start.line), some(eq(1)));
    }

    #[googletest::test]
    fn test_strict_json_rejects_comments() {
        let result = parse("{ /* no */ \"a\": \"b\" }", ResourceFormat::Json);

        assert_that!(result.map(|p| p.root.len()), err(displays_as(contains_substring("Syntax"))));
    }

    #[googletest::test]
    fn test_duplicate_key_is_rejected() {
        let text = r#"{ "app": { "home": "Home", "home": "Again" } }"#;

        let result = parse(text, ResourceFormat::Json);

        assert_that!(
            result.map(|p| p.root.len()),
            err(displays_as(eq("Duplicate key 'app.home'")))
        );
    }

    #[googletest::test]
    fn test_same_key_in_different_namespaces_is_fine() {
        let text = r#"{ "user": { "save": "Save" }, "group": { "save": "Save" } }"#;

        let parsed = parse(text, ResourceFormat::Json).unwrap();

        expect_that!(parsed.key_ranges.len(), eq(4));
    }

    #[googletest::test]
    fn test_escaped_keys_are_decoded() {
        let text = r#"{ "a\"b": "quoted" }"#;

        let parsed = parse(text, ResourceFormat::Json).unwrap();

        expect_that!(parsed.key_ranges.contains_key(&path(&["a\"b"])), eq(true));
    }

    #[googletest::test]
    fn test_number_leaf_is_rejected() {
        let result = parse(r#"{ "app": { "limit": 3 } }"#, ResourceFormat::Json);

        assert_that!(
            result.map(|p| p.root.len()),
            err(displays_as(contains_substring("found number")))
        );
    }
}
