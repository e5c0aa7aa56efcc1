//! Classical-feature preprocessing
//!
//! Builds the token string fed to the bag-of-words vectorizer: normalize,
//! split on whitespace, optionally drop English stopwords, optionally stem,
//! and rejoin with single spaces.

use crate::normalize::clean_text;
use crate::stopwords;
use serde::{Deserialize, Serialize};

/// Preprocessing switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    #[serde(default = "default_true")]
    pub apply_stemming: bool,

    #[serde(default = "default_true")]
    pub remove_stopwords: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            apply_stemming: true,
            remove_stopwords: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Tokenizer/stemmer for the classical estimator.
#[derive(Debug, Clone, Copy)]
pub struct ClassicalPreprocessor {
    options: PreprocessOptions,
}

impl ClassicalPreprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PreprocessOptions {
        self.options
    }

    /// Preprocessed tokens of one text. The input is re-normalized first.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let base = clean_text(text);
        let stopwords = stopwords::english();

        tokenize_simple(&base)
            .into_iter()
            .filter(|tok| !self.options.remove_stopwords || !stopwords.contains(*tok))
            .map(|tok| {
                if self.options.apply_stemming {
                    porter_stemmer::stem(tok)
                } else {
                    tok.to_string()
                }
            })
            .collect()
    }

    /// Space-joined preprocessing string for one text
    pub fn preprocess(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }

    /// Per-item preprocessing, preserving order
    pub fn preprocess_corpus<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.preprocess(t.as_ref())).collect()
    }
}

impl Default for ClassicalPreprocessor {
    fn default() -> Self {
        Self::new(PreprocessOptions::default())
    }
}

/// Whitespace tokenization
pub fn tokenize_simple(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Whitespace tokenization followed by Porter stemming of every token
pub fn tokenize_porter(text: &str) -> Vec<String> {
    tokenize_simple(text)
        .into_iter()
        .map(porter_stemmer::stem)
        .collect()
}

/// Preprocess one text with explicit switches
pub fn preprocess_for_classical(text: &str, apply_stemming: bool, remove_stopwords: bool) -> String {
    ClassicalPreprocessor::new(PreprocessOptions {
        apply_stemming,
        remove_stopwords,
    })
    .preprocess(text)
}

/// Preprocess many texts with explicit switches, preserving order
pub fn preprocess_corpus_for_classical<S: AsRef<str>>(
    texts: &[S],
    apply_stemming: bool,
    remove_stopwords: bool,
) -> Vec<String> {
    ClassicalPreprocessor::new(PreprocessOptions {
        apply_stemming,
        remove_stopwords,
    })
    .preprocess_corpus(texts)
}
