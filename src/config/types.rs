use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Name of the settings file looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".drive-i18n.json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "localeFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What a lenient lookup yields for a key no locale defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingKeyPolicy {
    /// Return the key path itself and log a warning.
    #[default]
    ReturnKey,
    /// Surface the missing key as an error.
    Error,
}

/// Severity of a check diagnostic. `Off` disables the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    pub locale_files: LocaleFilesConfig,

    /// Applied to locale files on top of `localeFiles.excludePatterns`.
    pub exclude_patterns: Vec<String>,

    pub key_separator: String,

    /// Locale every other locale is checked against.
    pub reference_locale: String,

    /// Locale consulted when the active locale lacks a key.
    pub fallback_locale: Option<String>,

    /// Locales that must define every reference key.
    ///
    /// - `None`: All loaded locales are required (default)
    /// - `Some([...])`: Only the listed locales are required
    ///
    /// Mutually exclusive with `optional_locales`.
    pub required_locales: Option<Vec<String>>,

    /// Locales where missing keys are not reported.
    ///
    /// Mutually exclusive with `required_locales`.
    pub optional_locales: Option<Vec<String>>,

    pub missing_key: MissingKeyPolicy,

    pub diagnostics: DiagnosticsConfig,

    pub indexing: IndexingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocaleFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for LocaleFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/{i18n,locales,lang,langs}/**/*.{json,jsonc,js,ts}".to_string()],
            exclude_patterns: vec!["**/index.{js,ts}".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Concurrent file loads.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    pub missing_key: Severity,
    pub extra_key: Severity,
    pub placeholder_mismatch: Severity,
    pub shape_mismatch: Severity,
    pub empty_value: Severity,
    pub malformed_placeholder: Severity,
    pub unreachable_key: Severity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            missing_key: Severity::Error,
            extra_key: Severity::Warning,
            placeholder_mismatch: Severity::Error,
            shape_mismatch: Severity::Error,
            empty_value: Severity::Warning,
            malformed_placeholder: Severity::Warning,
            unreachable_key: Severity::Error,
        }
    }
}

impl I18nSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Conflicting locale lists
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.reference_locale.trim().is_empty() {
            errors.push(ValidationError::new(
                "referenceLocale",
                "The reference locale cannot be empty. Example: \"en-US\"",
            ));
        }

        if let Some(fallback) = &self.fallback_locale
            && fallback.trim().is_empty()
        {
            errors.push(ValidationError::new(
                "fallbackLocale",
                "The fallback locale cannot be empty. Please specify a locale, or remove this field",
            ));
        }

        if self.locale_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "localeFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/i18n/lang/*.js\"]",
            ));
        }

        let pattern_groups = [
            ("localeFiles.includePatterns", &self.locale_files.include_patterns),
            ("localeFiles.excludePatterns", &self.locale_files.exclude_patterns),
            ("excludePatterns", &self.exclude_patterns),
        ];
        for (field, patterns) in pattern_groups {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if self.required_locales.is_some() && self.optional_locales.is_some() {
            errors.push(ValidationError::new(
                "requiredLocales/optionalLocales",
                "Cannot specify both 'requiredLocales' and 'optionalLocales'. Please use only one",
            ));
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "Must be at least 1, or removed to use the default",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Returns true if missing keys in `locale` should be reported.
    #[must_use]
    pub fn is_locale_required(&self, locale: &str) -> bool {
        use crate::input::locale::same_locale;

        if let Some(required) = &self.required_locales {
            return required.iter().any(|l| same_locale(l, locale));
        }
        if let Some(optional) = &self.optional_locales {
            return !optional.iter().any(|l| same_locale(l, locale));
        }
        true
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            locale_files: LocaleFilesConfig::default(),
            exclude_patterns: vec!["**/node_modules/**".to_string(), "**/dist/**".to_string()],
            key_separator: ".".to_string(),
            reference_locale: "en-US".to_string(),
            fallback_locale: Some("en-US".to_string()),
            required_locales: None,
            optional_locales: None,
            missing_key: MissingKeyPolicy::default(),
            diagnostics: DiagnosticsConfig::default(),
            indexing: IndexingConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = I18nSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"keySeparator": "/", "missingKey": "error"}"#;

        let settings: I18nSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.key_separator, eq("/"));
        assert_that!(settings.missing_key, eq(MissingKeyPolicy::Error));
        assert_that!(settings.reference_locale, eq("en-US"));
        assert_that!(settings.locale_files.include_patterns, len(eq(1)));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: I18nSettings = serde_json::from_str("{}").unwrap();

        assert_that!(settings.key_separator, eq("."));
        assert_that!(settings.fallback_locale.as_deref(), some(eq("en-US")));
        assert_that!(settings.missing_key, eq(MissingKeyPolicy::ReturnKey));
        assert_that!(settings.diagnostics.missing_key, eq(Severity::Error));
        assert_that!(settings.diagnostics.extra_key, eq(Severity::Warning));
    }

    #[rstest]
    fn deserialize_diagnostic_severities() {
        let json = r#"{"diagnostics": {"extraKey": "off", "emptyValue": "error"}}"#;

        let settings: I18nSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.diagnostics.extra_key, eq(Severity::Off));
        assert_that!(settings.diagnostics.empty_value, eq(Severity::Error));
        assert_that!(settings.diagnostics.placeholder_mismatch, eq(Severity::Error));
    }

    #[rstest]
    fn validate_invalid_key_separator_empty() {
        let settings = I18nSettings { key_separator: String::new(), ..I18nSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("keySeparator")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_fallback_locale_empty() {
        let settings =
            I18nSettings { fallback_locale: Some(String::new()), ..I18nSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("fallbackLocale"))])
        );
    }

    #[rstest]
    fn validate_invalid_include_patterns_empty() {
        let settings = I18nSettings {
            locale_files: LocaleFilesConfig { include_patterns: vec![], exclude_patterns: vec![] },
            ..I18nSettings::default()
        };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("localeFiles.includePatterns")),
                field!(ValidationError.message, contains_substring("At least one pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_exclude_pattern_invalid_glob() {
        let settings = I18nSettings {
            exclude_patterns: vec![
                "node_modules/**".to_string(),
                "dist/**".to_string(),
                "invalid[pattern".to_string(),
            ],
            ..I18nSettings::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("excludePatterns[2]")),
                field!(ValidationError.message, contains_substring("Invalid glob pattern")),
                field!(ValidationError.message, contains_substring("invalid[pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_required_and_optional_locales_conflict() {
        let settings = I18nSettings {
            required_locales: Some(vec!["zh-CN".to_string()]),
            optional_locales: Some(vec!["ja".to_string()]),
            ..I18nSettings::default()
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(
                ValidationError.field_path,
                eq("requiredLocales/optionalLocales")
            )])
        );
    }

    #[rstest]
    fn validate_zero_threads() {
        let settings = I18nSettings {
            indexing: IndexingConfig { num_threads: Some(0) },
            ..I18nSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("indexing.numThreads"))])
        );
    }

    #[rstest]
    #[case::all_required(None, None, "zh-CN", true)]
    #[case::listed_required(Some(vec!["zh_cn"]), None, "zh-CN", true)]
    #[case::not_listed(Some(vec!["ja"]), None, "zh-CN", false)]
    #[case::optional(None, Some(vec!["zh-CN"]), "zh-CN", false)]
    #[case::not_optional(None, Some(vec!["ja"]), "zh-CN", true)]
    fn locale_required(
        #[case] required: Option<Vec<&str>>,
        #[case] optional: Option<Vec<&str>>,
        #[case] locale: &str,
        #[case] expected: bool,
    ) {
        fn to_owned(list: Vec<&str>) -> Vec<String> {
            list.into_iter().map(String::from).collect()
        }
        let settings = I18nSettings {
            required_locales: required.map(to_owned),
            optional_locales: optional.map(to_owned),
            ..I18nSettings::default()
        };

        assert_that!(settings.is_locale_required(locale), eq(expected));
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = I18nSettings {
            key_separator: String::new(),
            reference_locale: " ".to_string(),
            ..I18nSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. keySeparator"));
        assert_that!(error_message, contains_substring("2. referenceLocale"));
    }

    #[rstest]
    fn effective_threads_is_at_least_one() {
        assert_that!(IndexingConfig::default().effective_threads(), ge(1));
        assert_that!(IndexingConfig { num_threads: Some(3) }.effective_threads(), eq(3));
    }
}
