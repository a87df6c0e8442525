//! Locale catalog: key lookup with fallback and placeholder substitution.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::{
    I18nSettings,
    MissingKeyPolicy,
};
use crate::input::locale::normalize_locale;
use crate::input::resource::{
    LocaleResource,
    ResourceNode,
};
use crate::template::{
    Args,
    TemplateError,
    interpolate_lenient,
    interpolate_strict,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unknown locale '{locale}'")]
    UnknownLocale { locale: String },
    #[error("Missing translation for '{key}' in locale '{locale}'")]
    MissingKey { locale: String, key: String },
    #[error("'{key}' is a namespace in locale '{locale}', not a string")]
    NotALeaf { locale: String, key: String },
    #[error("Failed to format '{key}': {source}")]
    Template {
        key: String,
        #[source]
        source: TemplateError,
    },
}

/// A leaf string together with the locale that supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub locale: &'a str,
    pub value: &'a str,
}

impl Resolved<'_> {
    /// Returns true if the value came from a locale other than `requested`.
    #[must_use]
    pub fn is_fallback(&self, requested: &str) -> bool {
        normalize_locale(self.locale) != normalize_locale(requested)
    }
}

/// Loaded locale resources, keyed by normalized locale tag.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: BTreeMap<String, LocaleResource>,
    active_locale: Option<String>,
    fallback_locale: Option<String>,
    separator: String,
    missing_key: MissingKeyPolicy,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            active_locale: None,
            fallback_locale: Some("en-US".to_string()),
            separator: ".".to_string(),
            missing_key: MissingKeyPolicy::default(),
        }
    }
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog configured from workspace settings.
    #[must_use]
    pub fn from_settings(settings: &I18nSettings) -> Self {
        Self {
            fallback_locale: settings.fallback_locale.clone(),
            separator: settings.key_separator.clone(),
            missing_key: settings.missing_key,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_resource(mut self, resource: LocaleResource) -> Self {
        self.insert(resource);
        self
    }

    #[must_use]
    pub fn with_active_locale(mut self, locale: impl Into<String>) -> Self {
        self.active_locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_fallback_locale(mut self, locale: Option<String>) -> Self {
        self.fallback_locale = locale;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub const fn with_missing_key_policy(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_key = policy;
        self
    }

    /// Adds a resource, returning the one it replaces for the same locale.
    pub fn insert(&mut self, resource: LocaleResource) -> Option<LocaleResource> {
        let key = normalize_locale(resource.locale());
        if let Some(previous) = self.resources.get(&key) {
            tracing::debug!(
                locale = resource.locale(),
                previous = ?previous.origin().map(|o| &o.path),
                "Replacing locale resource"
            );
        }
        self.resources.insert(key, resource)
    }

    /// Locale tags as written by their resources, in normalized order.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        self.resources.values().map(LocaleResource::locale).collect()
    }

    #[must_use]
    pub fn resource(&self, locale: &str) -> Option<&LocaleResource> {
        self.resources.get(&normalize_locale(locale))
    }

    #[must_use]
    pub fn resources(&self) -> impl Iterator<Item = &LocaleResource> {
        self.resources.values()
    }

    #[must_use]
    pub fn active_locale(&self) -> Option<&str> {
        self.active_locale.as_deref()
    }

    #[must_use]
    pub fn fallback_locale(&self) -> Option<&str> {
        self.fallback_locale.as_deref()
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    #[must_use]
    pub const fn missing_key_policy(&self) -> MissingKeyPolicy {
        self.missing_key
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Finds the leaf for `key`, trying `locale` and then the fallback locale.
    ///
    /// The first locale in which the path exists decides the outcome, so a
    /// namespace in the requested locale is reported as [`LookupError::NotALeaf`]
    /// rather than masked by the fallback.
    ///
    /// # Errors
    /// - `locale` is not loaded
    /// - no locale in the chain defines `key`
    /// - `key` names a namespace
    pub fn resolve<'a>(&'a self, locale: &str, key: &str) -> Result<Resolved<'a>, LookupError> {
        let requested = self
            .resource(locale)
            .ok_or_else(|| LookupError::UnknownLocale { locale: locale.to_string() })?;

        let fallback = self
            .fallback_locale
            .as_deref()
            .and_then(|tag| self.resource(tag))
            .filter(|resource| resource.locale() != requested.locale());

        for resource in std::iter::once(requested).chain(fallback) {
            match resource.get(key, &self.separator) {
                Some(ResourceNode::Leaf(value)) => {
                    return Ok(Resolved { locale: resource.locale(), value });
                }
                Some(ResourceNode::Namespace(_)) => {
                    return Err(LookupError::NotALeaf {
                        locale: resource.locale().to_string(),
                        key: key.to_string(),
                    });
                }
                None => {}
            }
        }

        Err(LookupError::MissingKey { locale: locale.to_string(), key: key.to_string() })
    }

    /// Strict lookup: the key must resolve and `args` must name exactly the
    /// placeholders of the resolved string.
    ///
    /// # Errors
    /// Any [`LookupError`]; missing keys are always errors here regardless of
    /// the configured [`MissingKeyPolicy`].
    pub fn translate(&self, locale: &str, key: &str, args: &Args) -> Result<String, LookupError> {
        let resolved = self.resolve(locale, key)?;
        interpolate_strict(resolved.value, args)
            .map_err(|source| LookupError::Template { key: key.to_string(), source })
    }

    /// Runtime lookup honoring the [`MissingKeyPolicy`].
    ///
    /// Placeholders without a value are left as written. A missing key yields
    /// the key path under `returnKey` and an error under `error`.
    ///
    /// # Errors
    /// Unknown locale, namespace paths, and missing keys under the `error` policy.
    pub fn lookup(&self, locale: &str, key: &str, args: &Args) -> Result<String, LookupError> {
        match self.resolve(locale, key) {
            Ok(resolved) => {
                if resolved.is_fallback(locale) {
                    tracing::debug!(key, locale, from = resolved.locale, "Using fallback translation");
                }
                Ok(interpolate_lenient(resolved.value, args))
            }
            Err(LookupError::MissingKey { .. }) if self.missing_key == MissingKeyPolicy::ReturnKey => {
                tracing::warn!(key, locale, "Missing translation");
                Ok(key.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Lenient lookup that never fails and never returns an empty string for
    /// an unresolved key: errors are logged and the key path is returned.
    #[must_use]
    pub fn t(&self, locale: &str, key: &str, args: &Args) -> String {
        self.lookup(locale, key, args).unwrap_or_else(|e| {
            tracing::warn!(key, locale, error = %e, "Translation lookup failed");
            key.to_string()
        })
    }

    /// [`Self::t`] in the active locale, or the fallback locale when none is set.
    #[must_use]
    pub fn t_active(&self, key: &str, args: &Args) -> String {
        match self.active_locale.as_deref().or(self.fallback_locale.as_deref()) {
            Some(locale) => self.t(locale, key, args),
            None => {
                tracing::warn!(key, "No active locale");
                key.to_string()
            }
        }
    }
}
