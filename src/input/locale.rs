//! Locale tags: detection from file paths and normalization.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// Tags recognised when detecting a locale from a file path (RFC 5646 subset).
static KNOWN_LOCALES: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [
        "ar", "ar-SA", "bg", "bg-BG", "ca", "cs", "cs-CZ", "da", "da-DK", "de", "de-AT",
        "de-CH", "de-DE", "el", "el-GR", "en", "en-AU", "en-CA", "en-GB", "en-IE", "en-NZ",
        "en-US", "eo", "es", "es-AR", "es-ES", "es-MX", "et", "fa", "fa-IR", "fi", "fi-FI",
        "fr", "fr-BE", "fr-CA", "fr-CH", "fr-FR", "he", "he-IL", "hi", "hi-IN", "hr", "hu",
        "hu-HU", "id", "id-ID", "it", "it-IT", "ja", "ja-JP", "ko", "ko-KR", "lt", "lv", "ms",
        "ms-MY", "nb", "nb-NO", "nl", "nl-BE", "nl-NL", "pl", "pl-PL", "pt", "pt-BR", "pt-PT",
        "ro", "ro-RO", "ru", "ru-RU", "sk", "sl", "sr", "sv", "sv-SE", "th", "th-TH", "tr",
        "tr-TR", "uk", "uk-UA", "vi", "vi-VN", "zh", "zh-CN", "zh-HK", "zh-Hans", "zh-Hant",
        "zh-SG", "zh-TW",
    ]
    .iter()
    .map(|code| normalize_locale(code))
    .collect()
});

/// Normalize a locale tag for comparison (lowercase, `-` replaced with `_`).
///
/// `zh-CN`, `zh_cn` and `ZH-cn` all normalize to `zh_cn`.
#[must_use]
pub fn normalize_locale(tag: &str) -> String {
    tag.trim().to_lowercase().replace('-', "_")
}

/// Returns true if both tags name the same locale.
#[must_use]
pub fn same_locale(a: &str, b: &str) -> bool {
    normalize_locale(a) == normalize_locale(b)
}

/// Returns true if the tag is one of the recognised locales.
#[must_use]
pub fn is_known_locale(tag: &str) -> bool {
    KNOWN_LOCALES.contains(&normalize_locale(tag))
}

/// Detect the locale of a resource file from its path.
///
/// Splits the path by `/` and `.`, then searches backwards for a part that
/// is a recognised locale tag.
///
/// - `web/src/i18n/lang/zh-CN.js` → `zh-CN`
/// - `locales/en_US/messages.json` → `en_US`
/// - `locales/common.json` → `None`
#[must_use]
pub fn detect_locale_from_path(file_path: &Path) -> Option<String> {
    let path_str = file_path.to_string_lossy();

    let parts: Vec<&str> = path_str.split(['/', '\\', '.']).collect();

    parts
        .into_iter()
        .rev()
        .find(|part| !part.is_empty() && is_known_locale(part))
        .map(ToString::to_string)
}
