//! Content admission for chirp bodies.
//!
//! Every body passes two stages before it reaches storage:
//!
//! 1. **Length check** against [`MAX_CHIRP_LENGTH`] (UTF-8 bytes, inclusive).
//! 2. **Moderation**: banned terms are masked with [`DEFAULT_MASK`].
//!
//! ## Matching rules
//!
//! With the default [`CaseMatching::ThreeForms`] each term is looked up in
//! exactly three spellings, in this order:
//!
//! | form        | `fornax` becomes |
//! |-------------|------------------|
//! | lowercase   | `fornax`         |
//! | uppercase   | `FORNAX`         |
//! | capitalized | `Fornax`         |
//!
//! The first spelling present is masked everywhere it appears and the term is
//! done; the other spellings of that term are left as they are. Irregular
//! casing such as `ForNax` is never matched. [`CaseMatching::Insensitive`]
//! is the opt-in stricter policy that masks any ASCII-case variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AdmissionConfig;

/// Longest accepted chirp, in bytes. A body of exactly this length passes.
pub const MAX_CHIRP_LENGTH: usize = 140;

/// Replacement written over a banned term.
pub const DEFAULT_MASK: &str = "****";

/// Terms masked when no list is configured.
pub const DEFAULT_BANNED_TERMS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("chirp is {length} bytes, limit is {limit}")]
    LengthExceeded { length: usize, limit: usize },
}

impl AdmissionError {
    /// Bytes over the limit; for diagnostics only.
    pub fn overage(&self) -> usize {
        match self {
            AdmissionError::LengthExceeded { length, limit } => length.saturating_sub(*limit),
        }
    }
}

/// Outcome of running a body through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted(String),
    Rejected(AdmissionError),
}

impl Admission {
    pub fn into_result(self) -> Result<String, AdmissionError> {
        match self {
            Admission::Accepted(body) => Ok(body),
            Admission::Rejected(e) => Err(e),
        }
    }
}

/// How banned terms are recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMatching {
    /// lowercase, UPPERCASE, Capitalized; first form found wins.
    #[default]
    ThreeForms,
    /// Any ASCII-case variant, all occurrences.
    Insensitive,
}

/// Immutable admission settings, built once from configuration.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    max_length: usize,
    banned_terms: Vec<String>,
    mask: String,
    case_matching: CaseMatching,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        AdmissionPolicy {
            max_length: MAX_CHIRP_LENGTH,
            banned_terms: DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect(),
            mask: DEFAULT_MASK.to_string(),
            case_matching: CaseMatching::ThreeForms,
        }
    }
}

impl AdmissionPolicy {
    pub fn from_config(cfg: &AdmissionConfig) -> Self {
        AdmissionPolicy {
            max_length: cfg.max_length,
            banned_terms: cfg
                .banned_terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            mask: cfg.mask.clone(),
            case_matching: cfg.case_matching,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Stage 1: reject bodies longer than the limit.
    pub fn validate(&self, body: &str) -> Result<(), AdmissionError> {
        if body.len() > self.max_length {
            return Err(AdmissionError::LengthExceeded {
                length: body.len(),
                limit: self.max_length,
            });
        }
        Ok(())
    }

    /// Stage 2: mask banned terms.
    pub fn moderate(&self, body: &str) -> String {
        let mut text = body.to_string();
        for term in &self.banned_terms {
            text = match self.case_matching {
                CaseMatching::ThreeForms => mask_first_form(&text, term, &self.mask),
                CaseMatching::Insensitive => mask_ascii_insensitive(&text, term, &self.mask),
            };
        }
        text
    }

    /// Both stages. Moderation only runs on bodies that pass the length check.
    pub fn admit(&self, body: &str) -> Admission {
        match self.validate(body) {
            Ok(()) => Admission::Accepted(self.moderate(body)),
            Err(e) => Admission::Rejected(e),
        }
    }
}

/// Stage 1 with the default policy.
pub fn validate(body: &str) -> Result<(), AdmissionError> {
    AdmissionPolicy::default().validate(body)
}

/// Stage 2 with the default policy.
pub fn moderate(body: &str) -> String {
    AdmissionPolicy::default().moderate(body)
}

fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn mask_first_form(text: &str, term: &str, mask: &str) -> String {
    let forms = [term.to_lowercase(), term.to_uppercase(), capitalize(term)];
    for form in &forms {
        if text.contains(form.as_str()) {
            return text.replace(form.as_str(), mask);
        }
    }
    text.to_string()
}

fn mask_ascii_insensitive(text: &str, term: &str, mask: &str) -> String {
    let needle = term.as_bytes();
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let end = i + needle.len();
        if !needle.is_empty() && end <= bytes.len() && bytes[i..end].eq_ignore_ascii_case(needle) {
            out.push_str(mask);
            i = end;
            continue;
        }
        match text[i..].chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }
    out
}
