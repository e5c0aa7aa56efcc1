//! Text normalizer shared by the classical and transformer estimators
//!
//! Turns arbitrary input into lowercase ASCII letters, digits and single
//! spaces. The steps run in a fixed order:
//!
//! 1. HTML entity unescaping, including the legacy named entities browsers
//!    accept without a trailing semicolon (`&amp`, `&copy`, ...)
//! 2. Unicode NFKC normalization
//! 3. Lowercasing
//! 4. URL, `@mention` and `#hashtag` removal
//! 5. HTML tag removal
//! 6. Removal of everything outside `[a-z0-9\s]`
//! 7. Whitespace collapsing and trimming

use regex::{Captures, Regex};
use std::sync::OnceLock;
use truthlens_core::Result;
use unicode_normalization::UnicodeNormalization;

/// Named entities that HTML5 decodes even without a trailing `;`
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Deterministic string-to-string cleaner.
pub struct TextNormalizer {
    entities: Regex,
    urls: Regex,
    mentions: Regex,
    hashtags: Regex,
    html_tags: Regex,
    disallowed: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entities: compile(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]{0,31})(;?)")?,
            urls: compile(r"http\S+|www\.\S+")?,
            mentions: compile(r"@\w+")?,
            hashtags: compile(r"#\w+")?,
            html_tags: compile(r"<.*?>")?,
            disallowed: compile(r"[^a-z0-9\s]")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Normalize a single text.
    pub fn normalize(&self, text: &str) -> String {
        let unescaped = self.unescape_html(text);
        let nfkc: String = unescaped.nfkc().collect();
        let lowered = nfkc.to_lowercase();

        let text = self.urls.replace_all(&lowered, " ");
        let text = self.mentions.replace_all(&text, " ");
        let text = self.hashtags.replace_all(&text, " ");
        let text = self.html_tags.replace_all(&text, " ");
        let text = self.disallowed.replace_all(&text, " ");
        let text = self.whitespace.replace_all(&text, " ");

        text.trim().to_string()
    }

    /// Decode character references. Unterminated numeric references and
    /// legacy named entities get their `;` restored before decoding, so
    /// `&copy2024` reads as `©2024` while `&hellip` stays literal.
    fn unescape_html(&self, text: &str) -> String {
        let terminated = self.entities.replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let semicolon = &caps[2];
            if name.starts_with('#') {
                return format!("&{};", name);
            }
            if !semicolon.is_empty() && is_named_entity(name) {
                return caps[0].to_string();
            }
            match legacy_prefix(name) {
                Some(len) => format!("&{};{}{}", &name[..len], &name[len..], semicolon),
                None => caps[0].to_string(),
            }
        });
        html_escape::decode_html_entities(&terminated).into_owned()
    }

    /// Normalize possibly-absent input; `None` becomes the empty string.
    pub fn normalize_optional(&self, text: Option<&str>) -> String {
        text.map(|t| self.normalize(t)).unwrap_or_default()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new().expect("Failed to compile text normalizer patterns")
    }
}

fn is_named_entity(name: &str) -> bool {
    let reference = format!("&{};", name);
    html_escape::decode_html_entities(&reference) != reference
}

/// Length of the longest legacy entity `name` starts with
fn legacy_prefix(name: &str) -> Option<usize> {
    (2..=name.len())
        .rev()
        .find(|&len| LEGACY_ENTITIES.binary_search(&&name[..len]).is_ok())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        truthlens_core::Error::internal(format!("Invalid normalizer pattern '{pattern}': {e}"))
    })
}

fn shared() -> &'static TextNormalizer {
    static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();
    NORMALIZER.get_or_init(TextNormalizer::default)
}

/// Normalize a text with the process-wide normalizer.
pub fn clean_text(text: &str) -> String {
    shared().normalize(text)
}

/// Normalize possibly-absent input with the process-wide normalizer.
pub fn clean_optional(text: Option<&str>) -> String {
    shared().normalize_optional(text)
}

/// Normalize every text, preserving order.
pub fn preprocess_corpus<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts.iter().map(|t| clean_text(t.as_ref())).collect()
}
