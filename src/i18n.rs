//! Internationalization (i18n) module for InkPink.
//!
//! Uses a simple key→string HashMap loaded at runtime from embedded translation data.
//! The `t!("key")` macro looks up the current language, falling back to English.
//! Language can be switched at runtime via `set_language()`.

use std::collections::HashMap;
use std::sync::Mutex;

/// Global translation state.
static I18N: Mutex<Option<I18nState>> = Mutex::new(None);

struct I18nState {
    current_lang: String,
    /// lang_code → (key → translated_string)
    translations: HashMap<String, HashMap<String, String>>,
}

/// Supported languages: (code, native_name, embedded table).
pub const LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "English", include_str!("../locales/en.txt")),
    ("pt", "Português", include_str!("../locales/pt.txt")),
];

/// Initialize the i18n system with embedded translations.
/// Call once at startup.
pub fn init() {
    let mut translations = HashMap::new();
    for &(code, _, data) in LANGUAGES {
        translations.insert(code.to_string(), parse_translations(data));
    }

    if let Ok(mut guard) = I18N.lock() {
        *guard = Some(I18nState {
            current_lang: "en".to_string(),
            translations,
        });
    }
}

/// Set the active language. Unknown codes fall back to English.
pub fn set_language(code: &str) {
    if let Ok(mut guard) = I18N.lock()
        && let Some(state) = guard.as_mut()
    {
        if state.translations.contains_key(code) {
            state.current_lang = code.to_string();
        } else {
            state.current_lang = "en".to_string();
        }
    }
}

/// Get the current language code.
pub fn current_language() -> String {
    if let Ok(guard) = I18N.lock()
        && let Some(state) = guard.as_ref()
    {
        return state.current_lang.clone();
    }
    "en".to_string()
}

/// Look up a translation key. Falls back to English, then to the key itself.
pub fn translate(key: &str) -> String {
    if let Ok(guard) = I18N.lock()
        && let Some(state) = guard.as_ref()
    {
        if let Some(map) = state.translations.get(&state.current_lang)
            && let Some(val) = map.get(key)
        {
            return val.clone();
        }
        if state.current_lang != "en"
            && let Some(map) = state.translations.get("en")
            && let Some(val) = map.get(key)
        {
            return val.clone();
        }
    }
    key.to_string()
}

/// Detect the system language from the usual locale environment variables.
/// Returns "en" when nothing matches a supported language.
pub fn detect_system_language() -> String {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"] {
        if let Ok(val) = std::env::var(var)
            && let Some(lang) = match_system_locale(&val)
        {
            return lang;
        }
    }
    "en".to_string()
}

/// Match a system locale string (e.g. "pt_BR.UTF-8", "en-US") against the
/// supported languages by primary subtag.
fn match_system_locale(locale: &str) -> Option<String> {
    let normalized = locale.to_lowercase().replace('_', "-");
    let lang_part = normalized.split(['.', '@']).next().unwrap_or(&normalized);
    let primary = lang_part.split('-').next().unwrap_or(lang_part);

    LANGUAGES
        .iter()
        .find(|(code, _, _)| code.eq_ignore_ascii_case(primary))
        .map(|(code, _, _)| code.to_string())
}

/// Parse a simple key=value translation file.
/// One `key=value` per line; `#` lines are comments; empty lines ignored.
fn parse_translations(data: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            map.insert(key.trim().to_string(), val.trim().to_string());
        }
    }
    map
}

/// Translation macro. Usage: `t!("canvas.undo")` or `t!("key", name = value)`.
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::translate($key)
    };
    ($key:expr, $($name:ident = $val:expr),+ $(,)?) => {{
        let mut s = $crate::i18n::translate($key);
        $(
            s = s.replace(concat!("{", stringify!($name), "}"), &format!("{}", $val));
        )+
        s
    }};
}
