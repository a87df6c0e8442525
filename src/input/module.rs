//! Locale resources written as JavaScript / TypeScript modules.
//!
//! Accepts the object literal exported by
//!
//! ```js
//! export default { app: { login: '登录' } }
//! ```
//!
//! as well as `const messages = { ... }; export default messages`,
//! `module.exports = { ... }` and TypeScript `as const` / `satisfies` wrappers.
//! Anything that would need evaluating (calls, spreads, computed keys,
//! template substitutions) is rejected.

use std::collections::HashMap;

use tree_sitter::{
    Node,
    Parser,
};

use super::error::ResourceError;
use super::format::ResourceFormat;
use super::resource::{
    NodeMap,
    ParsedResource,
    ResourceNode,
};
use crate::types::{
    SourcePosition,
    SourceRange,
};

/// Walk state shared while reading the exported object.
struct ModuleReader<'s> {
    source: &'s [u8],
    key_ranges: HashMap<Vec<String>, SourceRange>,
}

pub(crate) fn parse(text: &str, format: ResourceFormat) -> Result<ParsedResource, ResourceError> {
    let mut parser = Parser::new();
    parser.set_language(&format.tree_sitter_language())?;
    let tree = parser.parse(text, None).ok_or(ResourceError::ParseFailed)?;
    let root = tree.root_node();

    if let Some(error) = first_error(root) {
        let position: SourcePosition = error.start_position().into();
        return Err(ResourceError::Syntax(format!("unexpected syntax at {position}")));
    }

    let source = text.as_bytes();
    let object = find_exported_object(root, source).ok_or(ResourceError::NoExport)?;

    let mut reader = ModuleReader { source, key_ranges: HashMap::new() };
    let root = reader.read_object(object, &[])?;

    Ok(ParsedResource { root, key_ranges: reader.key_ranges })
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Strips parentheses and TypeScript type assertions around an expression.
fn unwrap_expression(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "parenthesized_expression" | "as_expression" | "satisfies_expression"
        | "non_null_expression" => named_children(node)
            .into_iter()
            .find(|child| child.kind() != "comment")
            .map_or(node, unwrap_expression),
        _ => node,
    }
}

fn has_default_keyword(statement: Node<'_>) -> bool {
    let mut cursor = statement.walk();
    statement.children(&mut cursor).any(|child| child.kind() == "default")
}

/// Finds the object literal a module exports by default.
fn find_exported_object<'t>(program: Node<'t>, source: &[u8]) -> Option<Node<'t>> {
    let statements = named_children(program);

    let exported = statements.iter().find_map(|statement| match statement.kind() {
        "export_statement" if has_default_keyword(*statement) => {
            statement.child_by_field_name("value")
        }
        "expression_statement" => named_children(*statement)
            .into_iter()
            .find(|expr| expr.kind() == "assignment_expression")
            .filter(|assignment| {
                assignment
                    .child_by_field_name("left")
                    .is_some_and(|left| node_text(left, source) == "module.exports")
            })
            .and_then(|assignment| assignment.child_by_field_name("right")),
        _ => None,
    })?;

    let exported = unwrap_expression(exported);
    match exported.kind() {
        "object" => Some(exported),
        "identifier" => find_declared_object(&statements, node_text(exported, source), source),
        _ => None,
    }
}

/// Resolves `const name = { ... }` at the top level of the module.
fn find_declared_object<'t>(
    statements: &[Node<'t>],
    name: &str,
    source: &[u8],
) -> Option<Node<'t>> {
    statements
        .iter()
        .filter(|statement| {
            matches!(statement.kind(), "lexical_declaration" | "variable_declaration")
        })
        .flat_map(|statement| named_children(*statement))
        .filter(|declarator| declarator.kind() == "variable_declarator")
        .find(|declarator| {
            declarator
                .child_by_field_name("name")
                .is_some_and(|ident| node_text(ident, source) == name)
        })
        .and_then(|declarator| declarator.child_by_field_name("value"))
        .map(unwrap_expression)
        .filter(|value| value.kind() == "object")
}

impl ModuleReader<'_> {
    fn read_object(&mut self, object: Node<'_>, prefix: &[String]) -> Result<NodeMap, ResourceError> {
        let mut children = NodeMap::new();

        for property in named_children(object) {
            match property.kind() {
                "comment" => {}
                "pair" => {
                    let (key, node) = self.read_pair(property, prefix)?;
                    if children.insert(key.clone(), node).is_some() {
                        return Err(ResourceError::DuplicateKey { key: join(prefix, &key) });
                    }
                }
                "method_definition" => {
                    let name = property
                        .child_by_field_name("name")
                        .map_or("<method>", |name| node_text(name, self.source));
                    return Err(ResourceError::NonStringLeaf {
                        key: join(prefix, name),
                        kind: "method".to_string(),
                    });
                }
                other => {
                    return Err(ResourceError::UnsupportedProperty {
                        key: join(prefix, node_text(property, self.source)),
                        kind: other.replace('_', " "),
                    });
                }
            }
        }

        Ok(children)
    }

    fn read_pair(
        &mut self,
        pair: Node<'_>,
        prefix: &[String],
    ) -> Result<(String, ResourceNode), ResourceError> {
        let (Some(key_node), Some(value_node)) =
            (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
        else {
            return Err(ResourceError::ParseFailed);
        };

        let key = match key_node.kind() {
            "property_identifier" | "number" => node_text(key_node, self.source).to_string(),
            "string" => self.read_string(key_node, prefix)?,
            other => {
                return Err(ResourceError::UnsupportedProperty {
                    key: join(prefix, node_text(key_node, self.source)),
                    kind: other.replace('_', " "),
                });
            }
        };

        let mut path = prefix.to_vec();
        path.push(key.clone());
        self.key_ranges.insert(path.clone(), SourceRange::from_node(&key_node));

        let value_node = unwrap_expression(value_node);
        let node = match value_node.kind() {
            "object" => ResourceNode::Namespace(self.read_object(value_node, &path)?),
            "string" => ResourceNode::Leaf(self.read_string(value_node, &path)?),
            "template_string" => ResourceNode::Leaf(self.read_template(value_node, &path)?),
            other => {
                return Err(ResourceError::NonStringLeaf {
                    key: path.join("."),
                    kind: other.replace('_', " "),
                });
            }
        };

        Ok((key, node))
    }

    fn read_string(&self, node: Node<'_>, path: &[String]) -> Result<String, ResourceError> {
        let raw = node_text(node, self.source);
        let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
        unescape(inner)
            .map_err(|reason| ResourceError::InvalidString { key: path.join("."), reason })
    }

    fn read_template(&self, node: Node<'_>, path: &[String]) -> Result<String, ResourceError> {
        if named_children(node).iter().any(|child| child.kind() == "template_substitution") {
            return Err(ResourceError::NonStringLeaf {
                key: path.join("."),
                kind: "template literal with substitutions".to_string(),
            });
        }
        self.read_string(node, path)
    }
}

fn join(prefix: &[String], key: &str) -> String {
    let mut parts: Vec<&str> = prefix.iter().map(String::as_str).collect();
    parts.push(key);
    parts.join(".")
}

fn hex_value(digits: &str) -> Result<u32, String> {
    u32::from_str_radix(digits, 16).map_err(|_| format!("invalid hex escape '{digits}'"))
}

/// Decodes the escape sequences of a JavaScript string literal body.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut pending_high: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            if pending_high.is_some() {
                return Err("unpaired surrogate".to_string());
            }
            out.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            return Err("trailing backslash".to_string());
        };

        let code = match escape {
            'n' => u32::from('\n'),
            't' => u32::from('\t'),
            'r' => u32::from('\r'),
            'b' => 0x08,
            'f' => 0x0c,
            'v' => 0x0b,
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => 0,
            '\r' => {
                chars.next_if_eq(&'\n');
                continue;
            }
            '\n' | '\u{2028}' | '\u{2029}' => continue,
            'x' => {
                let digits: String = chars.by_ref().take(2).collect();
                if digits.len() != 2 {
                    return Err("incomplete \\x escape".to_string());
                }
                hex_value(&digits)?
            }
            'u' => {
                if chars.next_if_eq(&'{').is_some() {
                    let digits: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    hex_value(&digits)?
                } else {
                    let digits: String = chars.by_ref().take(4).collect();
                    if digits.len() != 4 {
                        return Err("incomplete \\u escape".to_string());
                    }
                    hex_value(&digits)?
                }
            }
            other => u32::from(other),
        };

        match (pending_high.take(), code) {
            (None, 0xD800..=0xDBFF) => pending_high = Some(code),
            (Some(high), 0xDC00..=0xDFFF) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                out.push(char::from_u32(combined).ok_or("invalid surrogate pair")?);
            }
            (Some(_), _) | (None, 0xDC00..=0xDFFF) => {
                return Err("unpaired surrogate".to_string());
            }
            (None, code) => {
                out.push(char::from_u32(code).ok_or_else(|| format!("invalid code point {code:#x}"))?);
            }
        }
    }

    if pending_high.is_some() {
        return Err("unpaired surrogate".to_string());
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn leaf<'a>(root: &'a NodeMap, path: &[&str]) -> Option<&'a str> {
        let (first, rest) = path.split_first()?;
        let mut node = root.get(*first)?;
        for segment in rest {
            node = node.as_namespace()?.get(*segment)?;
        }
        node.as_leaf()
    }

    #[googletest::test]
    fn test_export_default_object() {
        let text = "export default {
  app: {
    login: '登录',
    sort: {
      name_asc: '文件名升序'
    }
  },
  p: {
    home: {
      file_exists: '\\'{n}\\' 已存在，覆盖还是跳过？',

      apply_all: \"记住选择\"
    }
  }
}
";

        let parsed = parse(text, ResourceFormat::JavaScript).unwrap();

        expect_that!(leaf(&parsed.root, &["app", "login"]), some(eq("登录")));
        expect_that!(leaf(&parsed.root, &["app", "sort", "name_asc"]), some(eq("文件名升序")));
        expect_that!(
            leaf(&parsed.root, &["p", "home", "file_exists"]),
            some(eq("'{n}' 已存在，覆盖还是跳过？"))
        );
        expect_that!(leaf(&parsed.root, &["p", "home", "apply_all"]), some(eq("记住选择")));

        let range = parsed.key_ranges.get(&vec!["app".to_string(), "login".to_string()]).copied();
        expect_that!(range.map(|r| r.start.line), some(eq(2)));
    }

    #[googletest::test]
    fn test_declared_const_export() {
        let text = "// messages\nconst messages = { a: { b: 'c' } }\nexport default messages\n";

        let parsed = parse(text, ResourceFormat::JavaScript).unwrap();

        expect_that!(leaf(&parsed.root, &["a", "b"]), some(eq("c")));
    }

    #[googletest::test]
    fn test_module_exports() {
        let text = "module.exports = { error: { not_found: 'Not found' } };";

        let parsed = parse(text, ResourceFormat::JavaScript).unwrap();

        expect_that!(leaf(&parsed.root, &["error", "not_found"]), some(eq("Not found")));
    }

    #[googletest::test]
    fn test_typescript_as_const() {
        let text = "export default {\n  md: { error: 'Render failed' },\n} as const;\n";

        let parsed = parse(text, ResourceFormat::TypeScript).unwrap();

        expect_that!(leaf(&parsed.root, &["md", "error"]), some(eq("Render failed")));
    }

    #[googletest::test]
    fn test_quoted_and_template_keys() {
        let text = "export default { 'new-item': `New`, \"x.y\": 'dotted' }";

        let parsed = parse(text, ResourceFormat::JavaScript).unwrap();

        expect_that!(leaf(&parsed.root, &["new-item"]), some(eq("New")));
        expect_that!(leaf(&parsed.root, &["x.y"]), some(eq("dotted")));
    }

    #[rstest]
    #[case::number("export default { a: 1 }", "found number")]
    #[case::call("export default { a: t('x') }", "found call expression")]
    #[case::arrow("export default { a: () => 'x' }", "found arrow function")]
    #[case::substitution("export default { a: `${x}` }", "template literal with substitutions")]
    #[case::spread("export default { ...base }", "spread element")]
    #[case::computed("export default { [k]: 'v' }", "computed property name")]
    #[case::method("export default { a() { return 'x' } }", "method")]
    #[case::duplicate("export default { a: 'x', a: 'y' }", "Duplicate key 'a'")]
    #[case::no_export("const a = { b: 'c' }", "No exported object literal")]
    #[case::syntax("export default { a: 'x' ", "Syntax error")]
    fn test_rejected_modules(#[case] text: &str, #[case] message: &str) {
        let result = parse(text, ResourceFormat::JavaScript);

        assert_that!(result.map(|p| p.root.len()), err(displays_as(contains_substring(message))));
    }

    #[rstest]
    #[case::plain("abc", "abc")]
    #[case::quote("\\'{n}\\'", "'{n}'")]
    #[case::newline("a\\nb", "a\nb")]
    #[case::backslash("a\\\\b", "a\\b")]
    #[case::hex("\\x41", "A")]
    #[case::unicode("\\u4e2d", "中")]
    #[case::unicode_braces("\\u{1F600}", "😀")]
    #[case::surrogate_pair("\\uD83D\\uDE00", "😀")]
    #[case::null("\\0", "\0")]
    #[case::continuation("a\\\nb", "ab")]
    #[case::identity("\\q", "q")]
    fn test_unescape(#[case] raw: &str, #[case] expected: &str) {
        assert_that!(unescape(raw), ok(eq(expected)));
    }

    #[rstest]
    #[case::lone_high("\\uD83D")]
    #[case::lone_low("\\uDE00")]
    #[case::short_hex("\\x4")]
    #[case::bad_hex("\\uZZZZ")]
    fn test_unescape_errors(#[case] raw: &str) {
        assert_that!(unescape(raw), err(anything()));
    }
}
