use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::{langid, LanguageIdentifier};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
        // Unicode isolation marks around placeables would end up in chat text
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Supported languages (code, human-readable name).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("en", "English"), ("ru", "Русский")];

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| langid!("ru"));

/// Default language identifier.
pub fn default_lang() -> LanguageIdentifier {
    DEFAULT_LANG.clone()
}

/// Normalizes a language code into a LanguageIdentifier (falls back to default).
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    match is_language_supported(code) {
        Some(supported) => supported.parse().unwrap_or_else(|_| default_lang()),
        None => default_lang(),
    }
}

/// Resolves the language from the Telegram client locale, if any.
pub fn lang_from_locale(locale: Option<&str>) -> LanguageIdentifier {
    locale.map(lang_from_code).unwrap_or_else(default_lang)
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

/// Checks if a language code is supported by the bot.
/// Returns the normalized language code if supported, None otherwise.
pub fn is_language_supported(code: &str) -> Option<&'static str> {
    // "en-US" -> "en", "ru-RU" -> "ru"
    let normalized = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();

    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(&normalized))
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_known_translation() {
        let ru = lang_from_code("ru");
        let en = lang_from_code("en");

        assert_eq!(t(&ru, "video-choose-quality"), "🎬 Выберите качество видео:");
        assert_eq!(t(&en, "video-choose-quality"), "🎬 Choose video quality:");
    }

    #[test]
    fn interpolates_without_isolation_marks() {
        let mut args = FluentArgs::new();
        args.set("name", "Alice");
        assert_eq!(
            t_args(&lang_from_code("ru"), "start-greeting", &args),
            "Привет, Alice! Рад тебя видеть! 👋"
        );
    }

    #[test]
    fn converts_newlines() {
        let en = lang_from_code("en");
        let text = t(&en, "error-compression-failed");

        assert!(text.contains('\n'));
        assert!(!text.contains("\\n"));
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(t(&default_lang(), "no-such-key"), "no-such-key");
    }

    #[test]
    fn test_is_language_supported() {
        assert_eq!(is_language_supported("en"), Some("en"));
        assert_eq!(is_language_supported("ru"), Some("ru"));
        assert_eq!(is_language_supported("en-US"), Some("en"));
        assert_eq!(is_language_supported("ru-RU"), Some("ru"));
        assert_eq!(is_language_supported("EN"), Some("en"));

        assert_eq!(is_language_supported("es"), None);
        assert_eq!(is_language_supported("unknown"), None);
    }

    #[test]
    fn locale_resolution_falls_back_to_default() {
        assert_eq!(lang_from_locale(Some("en-GB")), langid!("en"));
        assert_eq!(lang_from_locale(Some("ja")), langid!("ru"));
        assert_eq!(lang_from_locale(None), langid!("ru"));
    }
}
