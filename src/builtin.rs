//! Locale resources of the drive web UI, embedded at build time.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::catalog::Catalog;
use crate::config::I18nSettings;
use crate::input::error::ResourceError;
use crate::input::format::ResourceFormat;
use crate::input::locale::same_locale;
use crate::input::resource::{
    LocaleResource,
    ResourceOrigin,
};

/// An embedded locale file.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinLocale {
    pub locale: &'static str,
    pub file_name: &'static str,
    pub format: ResourceFormat,
    pub content: &'static str,
}

impl BuiltinLocale {
    /// Parses the embedded text.
    ///
    /// # Errors
    /// Returns an error if the embedded file is not a valid resource.
    pub fn load(&self) -> Result<LocaleResource, ResourceError> {
        let origin = ResourceOrigin { path: PathBuf::from("locales").join(self.file_name), format: self.format };
        Ok(LocaleResource::parse(self.content, self.format, self.locale)?.with_origin(origin))
    }
}

/// Reference locale of the embedded resources.
pub const REFERENCE_LOCALE: &str = "en-US";

pub const BUILTIN_LOCALES: &[BuiltinLocale] = &[
    BuiltinLocale {
        locale: "en-US",
        file_name: "en-US.json",
        format: ResourceFormat::Json,
        content: include_str!("../locales/en-US.json"),
    },
    BuiltinLocale {
        locale: "zh-CN",
        file_name: "zh-CN.js",
        format: ResourceFormat::JavaScript,
        content: include_str!("../locales/zh-CN.js"),
    },
];

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Looks up an embedded locale by tag.
#[must_use]
pub fn find(locale: &str) -> Option<&'static BuiltinLocale> {
    BUILTIN_LOCALES.iter().find(|builtin| same_locale(builtin.locale, locale))
}

/// Parses every embedded locale, failing on the first invalid one.
///
/// # Errors
/// Returns the parse error of the first embedded file that fails to load.
pub fn try_catalog() -> Result<Catalog, ResourceError> {
    load_into(Catalog::new())
}

/// Like [`try_catalog`], with fallback, separator and missing-key policy taken from `settings`.
///
/// # Errors
/// Returns the parse error of the first embedded file that fails to load.
pub fn try_catalog_with_settings(settings: &I18nSettings) -> Result<Catalog, ResourceError> {
    load_into(Catalog::from_settings(settings))
}

fn load_into(catalog: Catalog) -> Result<Catalog, ResourceError> {
    BUILTIN_LOCALES
        .iter()
        .try_fold(catalog, |catalog, builtin| Ok(catalog.with_resource(builtin.load()?)))
}

fn build_catalog() -> Catalog {
    BUILTIN_LOCALES
        .iter()
        .filter_map(|builtin| {
            builtin
                .load()
                .map_err(|e| tracing::error!("Failed to parse builtin locale {}: {e}", builtin.locale))
                .ok()
        })
        .fold(Catalog::new(), Catalog::with_resource)
}

/// Shared catalog of the embedded locales. Parsed once on first use.
///
/// A locale whose embedded file fails to parse is logged and left out.
#[must_use]
pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(build_catalog)
}
