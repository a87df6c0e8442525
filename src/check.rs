//! Consistency checks across locale resources.
//!
//! Every locale is compared against the reference locale: keys it lacks or
//! adds, placeholders that differ, and paths that are a string on one side and
//! a namespace on the other. Each resource is also checked on its own for
//! empty strings, unbalanced braces, and keys no joined path can reach.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::{
    Catalog,
    LookupError,
};
use crate::config::{
    DiagnosticsConfig,
    I18nSettings,
    Severity,
};
use crate::input::resource::{
    LocaleResource,
    NodeMap,
    ResourceNode,
};
use crate::key::is_reachable_segment;
use crate::template::{
    has_unbalanced_braces,
    placeholders,
};
use crate::types::SourceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    MissingKey,
    ExtraKey,
    PlaceholderMismatch,
    ShapeMismatch,
    EmptyValue,
    MalformedPlaceholder,
    UnreachableKey,
}

impl DiagnosticCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingKey => "missing-key",
            Self::ExtraKey => "extra-key",
            Self::PlaceholderMismatch => "placeholder-mismatch",
            Self::ShapeMismatch => "shape-mismatch",
            Self::EmptyValue => "empty-value",
            Self::MalformedPlaceholder => "malformed-placeholder",
            Self::UnreachableKey => "unreachable-key",
        }
    }

    /// Configured severity for this check.
    #[must_use]
    pub const fn severity(self, config: &DiagnosticsConfig) -> Severity {
        match self {
            Self::MissingKey => config.missing_key,
            Self::ExtraKey => config.extra_key,
            Self::PlaceholderMismatch => config.placeholder_mismatch,
            Self::ShapeMismatch => config.shape_mismatch,
            Self::EmptyValue => config.empty_value,
            Self::MalformedPlaceholder => config.malformed_placeholder,
            Self::UnreachableKey => config.unreachable_key,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub locale: String,
    pub key: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info | Severity::Off => "info",
        };
        write!(f, "{level}[{}] {} '{}': {}", self.code, self.locale, self.key, self.message)?;
        match (&self.file, self.range) {
            (Some(file), Some(range)) => write!(f, " ({}:{})", file.display(), range.start),
            (Some(file), None) => write!(f, " ({})", file.display()),
            _ => Ok(()),
        }
    }
}

/// Result of a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub reference_locale: String,
    pub locales: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    #[must_use]
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics for one locale and key, in emission order.
    pub fn find<'a>(&'a self, locale: &'a str, key: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.locale == locale && d.key == key)
    }
}

/// Checks every loaded locale against `settings.reference_locale`.
///
/// # Errors
/// Returns [`LookupError::UnknownLocale`] when the reference locale is not loaded.
pub fn run(catalog: &Catalog, settings: &I18nSettings) -> Result<Report, LookupError> {
    let reference = catalog.resource(&settings.reference_locale).ok_or_else(|| {
        LookupError::UnknownLocale { locale: settings.reference_locale.clone() }
    })?;

    tracing::debug!(
        reference = reference.locale(),
        locales = catalog.locales().len(),
        "Running locale checks"
    );

    let mut diagnostics = Vec::new();
    for resource in catalog.resources() {
        let mut checker = Checker {
            resource,
            config: &settings.diagnostics,
            separator: catalog.separator(),
            diagnostics: &mut diagnostics,
        };

        checker.check_values(resource.root(), &mut Vec::new());

        if resource.locale() != reference.locale() {
            let report_missing = settings.is_locale_required(resource.locale());
            checker.compare(reference, reference.root(), resource.root(), &mut Vec::new(), report_missing);
        }
    }

    diagnostics.sort_by(|a, b| (&a.locale, &a.key, a.code).cmp(&(&b.locale, &b.key, b.code)));

    Ok(Report {
        reference_locale: reference.locale().to_string(),
        locales: catalog.locales().into_iter().map(String::from).collect(),
        diagnostics,
    })
}

struct Checker<'a> {
    resource: &'a LocaleResource,
    config: &'a DiagnosticsConfig,
    separator: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn emit(&mut self, code: DiagnosticCode, path: &[&str], message: String) {
        let severity = code.severity(self.config);
        if severity == Severity::Off {
            return;
        }
        self.diagnostics.push(Diagnostic {
            code,
            severity,
            locale: self.resource.locale().to_string(),
            key: path.join(self.separator),
            message,
            file: self.resource.origin().map(|o| o.path.clone()),
            range: self.resource.key_range_at(path),
        });
    }

    /// Checks that need only this resource.
    fn check_values(&mut self, nodes: &'a NodeMap, path: &mut Vec<&'a str>) {
        for (segment, node) in nodes {
            path.push(segment);

            if !is_reachable_segment(segment, self.separator) {
                self.emit(
                    DiagnosticCode::UnreachableKey,
                    path,
                    format!(
                        "Key '{segment}' is empty or contains the separator '{}' and cannot be looked up",
                        self.separator
                    ),
                );
            }

            match node {
                ResourceNode::Leaf(value) if value.trim().is_empty() => {
                    self.emit(DiagnosticCode::EmptyValue, path, "Translation is empty".to_string());
                }
                ResourceNode::Leaf(value) if has_unbalanced_braces(value) => {
                    self.emit(
                        DiagnosticCode::MalformedPlaceholder,
                        path,
                        format!("Unbalanced braces in \"{value}\""),
                    );
                }
                ResourceNode::Leaf(_) => {}
                ResourceNode::Namespace(children) => self.check_values(children, path),
            }

            path.pop();
        }
    }

    /// Checks this resource against the reference tree.
    fn compare(
        &mut self,
        reference: &LocaleResource,
        expected: &'a NodeMap,
        actual: &'a NodeMap,
        path: &mut Vec<&'a str>,
        report_missing: bool,
    ) {
        for (segment, expected_node) in expected {
            path.push(segment);
            match (expected_node, actual.get(segment)) {
                (_, None) => {
                    if report_missing {
                        let message =
                            format!("Missing translation (defined in {})", reference.locale());
                        self.report_leaves(DiagnosticCode::MissingKey, expected_node, path, &message);
                    }
                }
                (ResourceNode::Leaf(expected_text), Some(ResourceNode::Leaf(actual_text))) => {
                    self.compare_placeholders(reference, expected_text, actual_text, path);
                }
                (ResourceNode::Namespace(expected_children), Some(ResourceNode::Namespace(children))) => {
                    self.compare(reference, expected_children, children, path, report_missing);
                }
                (ResourceNode::Leaf(_), Some(ResourceNode::Namespace(_))) => {
                    self.emit(
                        DiagnosticCode::ShapeMismatch,
                        path,
                        format!("Expected a string as in {}, found a namespace", reference.locale()),
                    );
                }
                (ResourceNode::Namespace(_), Some(ResourceNode::Leaf(_))) => {
                    self.emit(
                        DiagnosticCode::ShapeMismatch,
                        path,
                        format!("Expected a namespace as in {}, found a string", reference.locale()),
                    );
                }
            }
            path.pop();
        }

        for (segment, actual_node) in actual {
            if expected.contains_key(segment) {
                continue;
            }
            path.push(segment);
            let message = format!("Key is not defined in {}", reference.locale());
            self.report_leaves(DiagnosticCode::ExtraKey, actual_node, path, &message);
            path.pop();
        }
    }

    fn compare_placeholders(
        &mut self,
        reference: &LocaleResource,
        expected_text: &str,
        actual_text: &str,
        path: &[&str],
    ) {
        let expected = placeholders(expected_text);
        let actual = placeholders(actual_text);
        if expected == actual {
            return;
        }

        let mut parts = Vec::new();
        let missing: Vec<&str> = expected.difference(&actual).copied().collect();
        if !missing.is_empty() {
            parts.push(format!("missing {}", format_names(&missing)));
        }
        let unexpected: Vec<&str> = actual.difference(&expected).copied().collect();
        if !unexpected.is_empty() {
            parts.push(format!("unexpected {}", format_names(&unexpected)));
        }

        self.emit(
            DiagnosticCode::PlaceholderMismatch,
            path,
            format!("Placeholders differ from {}: {}", reference.locale(), parts.join("; ")),
        );
    }

    /// Emits `code` for every leaf at or below `node`.
    fn report_leaves(
        &mut self,
        code: DiagnosticCode,
        node: &'a ResourceNode,
        path: &mut Vec<&'a str>,
        message: &str,
    ) {
        match node {
            ResourceNode::Leaf(_) => self.emit(code, path, message.to_string()),
            ResourceNode::Namespace(children) => {
                for (segment, child) in children {
                    path.push(segment);
                    self.report_leaves(code, child, path, message);
                    path.pop();
                }
            }
        }
    }
}

fn format_names(names: &[&str]) -> String {
    names.iter().map(|name| format!("{{{name}}}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;

    use super::*;
    use crate::input::format::ResourceFormat;

    fn resource(locale: &str, value: &serde_json::Value) -> LocaleResource {
        LocaleResource::from_json_value(locale, value).unwrap()
    }

    fn reference() -> LocaleResource {
        resource(
            "en-US",
            &json!({
                "app": { "login": "Log in", "upload": "Upload" },
                "handler": { "delete": { "confirm_n": "Delete {n} items?" } },
                "form": { "required_msg": "{f} is required" }
            }),
        )
    }

    fn run_with(target: LocaleResource, settings: &I18nSettings) -> Report {
        let catalog = Catalog::from_settings(settings).with_resource(reference()).with_resource(target);
        run(&catalog, settings).unwrap()
    }

    fn codes(report: &Report) -> Vec<(String, DiagnosticCode)> {
        report.diagnostics.iter().map(|d| (d.key.clone(), d.code)).collect()
    }

    #[rstest]
    fn complete_locale_is_clean() {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": "登录", "upload": "上传" },
                "handler": { "delete": { "confirm_n": "确认删除 {n} 个项目？" } },
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_that!(report.is_clean(), eq(true));
        assert_that!(report.has_errors(), eq(false));
        assert_that!(report.reference_locale.as_str(), eq("en-US"));
        assert_eq!(report.locales, vec!["en-US".to_string(), "zh-CN".to_string()]);
    }

    #[rstest]
    fn missing_namespace_reports_each_leaf() {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": "登录", "upload": "上传" },
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_eq!(codes(&report), vec![("handler.delete.confirm_n".to_string(), DiagnosticCode::MissingKey)]);
        assert_that!(report.has_errors(), eq(true));
        assert_that!(report.diagnostics[0].message, contains_substring("en-US"));
    }

    #[rstest]
    fn extra_key_is_a_warning() {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": "登录", "upload": "上传", "legacy": "旧" },
                "handler": { "delete": { "confirm_n": "确认删除 {n} 个项目？" } },
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_eq!(codes(&report), vec![("app.legacy".to_string(), DiagnosticCode::ExtraKey)]);
        assert_that!(report.diagnostics[0].severity, eq(Severity::Warning));
        assert_that!(report.has_errors(), eq(false));
    }

    #[rstest]
    fn placeholder_mismatch_names_both_sides() {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": "登录", "upload": "上传" },
                "handler": { "delete": { "confirm_n": "确认删除 {p}？" } },
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_that!(report.count_code(DiagnosticCode::PlaceholderMismatch), eq(1));
        let diagnostic = report.find("zh-CN", "handler.delete.confirm_n").next().unwrap();
        assert_that!(
            diagnostic.message,
            eq("Placeholders differ from en-US: missing {n}; unexpected {p}")
        );
    }

    #[rstest]
    fn shape_mismatch_both_directions() {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": { "title": "登录" }, "upload": "上传" },
                "handler": "删除",
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_eq!(
            codes(&report),
            vec![
                ("app.login".to_string(), DiagnosticCode::ShapeMismatch),
                ("handler".to_string(), DiagnosticCode::ShapeMismatch),
            ]
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  ")]
    fn empty_value_is_reported(#[case] value: &str) {
        let target = resource(
            "zh-CN",
            &json!({
                "app": { "login": value, "upload": "上传" },
                "handler": { "delete": { "confirm_n": "确认删除 {n} 个项目？" } },
                "form": { "required_msg": "{f} 是必填项" }
            }),
        );

        let report = run_with(target, &I18nSettings::default());

        assert_eq!(codes(&report), vec![("app.login".to_string(), DiagnosticCode::EmptyValue)]);
    }

    #[rstest]
    fn malformed_placeholder_in_reference() {
        let catalog = Catalog::new().with_resource(resource("en-US", &json!({ "app": { "x": "Hello {name" } })));

        let report = run(&catalog, &I18nSettings::default()).unwrap();

        assert_eq!(codes(&report), vec![("app.x".to_string(), DiagnosticCode::MalformedPlaceholder)]);
    }

    #[rstest]
    fn unreachable_key_with_separator() {
        let catalog = Catalog::new().with_resource(resource("en-US", &json!({ "routes": { "title.home": "Home" } })));

        let report = run(&catalog, &I18nSettings::default()).unwrap();

        assert_eq!(codes(&report), vec![("routes.title.home".to_string(), DiagnosticCode::UnreachableKey)]);
        assert_that!(report.has_errors(), eq(true));
    }

    #[rstest]
    fn optional_locale_skips_missing_keys() {
        let settings = I18nSettings { optional_locales: Some(vec!["zh-CN".to_string()]), ..I18nSettings::default() };
        let target = resource("zh-CN", &json!({ "app": { "login": "登录" } }));

        let report = run_with(target, &settings);

        assert_that!(report.count_code(DiagnosticCode::MissingKey), eq(0));
    }

    #[rstest]
    fn required_locales_limit_missing_keys() {
        let settings = I18nSettings { required_locales: Some(vec!["ja".to_string()]), ..I18nSettings::default() };
        let target = resource("zh-CN", &json!({ "app": { "login": "登录" } }));

        let report = run_with(target, &settings);

        assert_that!(report.count_code(DiagnosticCode::MissingKey), eq(0));
    }

    #[rstest]
    fn severity_off_disables_check() {
        let mut settings = I18nSettings::default();
        settings.diagnostics.missing_key = Severity::Off;
        let target = resource("zh-CN", &json!({ "app": { "login": "登录" } }));

        let report = run_with(target, &settings);

        assert_that!(report.is_clean(), eq(true));
    }

    #[rstest]
    fn unknown_reference_locale() {
        let catalog = Catalog::new().with_resource(resource("zh-CN", &json!({})));

        assert_that!(
            run(&catalog, &I18nSettings::default()).map(|r| r.is_clean()),
            err(displays_as(eq("Unknown locale 'en-US'")))
        );
    }

    #[rstest]
    fn diagnostic_carries_file_and_range() {
        let text = "export default {\n  app: {\n    login: '',\n    upload: '上传',\n  },\n}\n";
        let target = LocaleResource::parse(text, ResourceFormat::JavaScript, "zh-CN").unwrap();
        let catalog = Catalog::new().with_resource(target);
        let settings = I18nSettings { reference_locale: "zh-CN".to_string(), ..I18nSettings::default() };

        let report = run(&catalog, &settings).unwrap();

        let diagnostic = &report.diagnostics[0];
        assert_that!(diagnostic.code, eq(DiagnosticCode::EmptyValue));
        assert_that!(diagnostic.range.map(|r| r.start.line), some(eq(2)));
        assert_that!(diagnostic.to_string(), starts_with("warning[empty-value] zh-CN 'app.login'"));
    }

    #[rstest]
    fn report_serializes_codes_in_kebab_case() {
        let catalog = Catalog::new().with_resource(resource("en-US", &json!({ "app": { "x": "" } })));

        let report = run(&catalog, &I18nSettings::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_that!(value["diagnostics"][0]["code"].as_str(), some(eq("empty-value")));
        assert_that!(value["diagnostics"][0]["severity"].as_str(), some(eq("warning")));
    }
}
