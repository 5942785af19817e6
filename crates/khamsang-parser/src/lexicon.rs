//! Phrase tables for actions and element categories.
//!
//! Phrases are keyed by their normalized text with whitespace removed, so a
//! phrase matches a span of tokens whose texts concatenate to the key. This
//! makes "go to" and "ไปที่" match whether or not the tokenizer splits them.

use crate::normalizer::normalize;
use crate::tokenizer::Token;
use khamsang_common::protocol::{ActionId, ElementCategoryId};
use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

/// Longest phrase, in tokens, the matcher will try.
pub const MAX_PHRASE_TOKENS: usize = 4;

pub const DEFAULT_ACTION_PHRASES: &[(&str, ActionId)] = &[
    ("เปิด", ActionId::Open),
    ("open", ActionId::Open),
    ("เปิดเว็บ", ActionId::Navigate),
    ("เปิดเว็บไซต์", ActionId::Navigate),
    ("ไปที่", ActionId::Navigate),
    ("navigate", ActionId::Navigate),
    ("go to", ActionId::Navigate),
    ("goto", ActionId::Navigate),
    ("visit", ActionId::Navigate),
    ("คลิก", ActionId::Click),
    ("กด", ActionId::Click),
    ("click", ActionId::Click),
    ("press", ActionId::Click),
    ("tap", ActionId::Click),
    ("พิมพ์", ActionId::Type),
    ("กรอก", ActionId::Type),
    ("ใส่", ActionId::Type),
    ("type", ActionId::Type),
    ("enter", ActionId::Type),
    ("ถ่ายภาพ", ActionId::Screenshot),
    ("ถ่ายภาพหน้าจอ", ActionId::Screenshot),
    ("แคปหน้าจอ", ActionId::Screenshot),
    ("screenshot", ActionId::Screenshot),
    ("capture", ActionId::Screenshot),
    ("เลื่อน", ActionId::Scroll),
    ("scroll", ActionId::Scroll),
];

pub const DEFAULT_CATEGORY_PHRASES: &[(&str, ElementCategoryId)] = &[
    ("ปุ่ม", ElementCategoryId::Button),
    ("button", ElementCategoryId::Button),
    ("ลิงก์", ElementCategoryId::Link),
    ("ลิงค์", ElementCategoryId::Link),
    ("link", ElementCategoryId::Link),
    ("ช่องกรอก", ElementCategoryId::Input),
    ("ช่อง", ElementCategoryId::Input),
    ("input", ElementCategoryId::Input),
    ("field", ElementCategoryId::Input),
    ("textbox", ElementCategoryId::Input),
    ("ฟอร์ม", ElementCategoryId::Form),
    ("form", ElementCategoryId::Form),
];

lazy_static! {
    static ref DEFAULT_LEXICON: Lexicon = Lexicon::builder()
        .build()
        .expect("default phrases do not conflict");
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexiconError {
    #[error("Empty phrase for '{0}'")]
    EmptyPhrase(String),

    #[error("Phrase '{phrase}' maps to both {first} and {second}")]
    Conflict {
        phrase: String,
        first: String,
        second: String,
    },
}

/// Immutable phrase tables. Build once with [`LexiconBuilder`].
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    actions: HashMap<String, ActionId>,
    categories: HashMap<String, ElementCategoryId>,
}

impl Lexicon {
    pub fn default_ref() -> &'static Lexicon {
        &DEFAULT_LEXICON
    }

    /// Builder pre-filled with the default phrases.
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder {
            actions: DEFAULT_ACTION_PHRASES
                .iter()
                .map(|(p, id)| (p.to_string(), *id))
                .collect(),
            categories: DEFAULT_CATEGORY_PHRASES
                .iter()
                .map(|(p, id)| (p.to_string(), *id))
                .collect(),
        }
    }

    /// Builder with no phrases at all.
    pub fn empty_builder() -> LexiconBuilder {
        LexiconBuilder {
            actions: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn action_for(&self, span: &[Token]) -> Option<ActionId> {
        span_key(span).and_then(|key| self.actions.get(&key).copied())
    }

    pub fn category_for(&self, span: &[Token]) -> Option<ElementCategoryId> {
        span_key(span).and_then(|key| self.categories.get(&key).copied())
    }

    pub fn action_phrase_count(&self) -> usize {
        self.actions.len()
    }

    pub fn category_phrase_count(&self) -> usize {
        self.categories.len()
    }
}

fn phrase_key(phrase: &str) -> String {
    normalize(phrase).chars().filter(|c| !c.is_whitespace()).collect()
}

fn span_key(span: &[Token]) -> Option<String> {
    if span.is_empty() || !span.iter().all(Token::is_lexical) {
        return None;
    }
    Some(span.iter().map(|t| normalize(&t.text)).collect())
}

pub struct LexiconBuilder {
    actions: Vec<(String, ActionId)>,
    categories: Vec<(String, ElementCategoryId)>,
}

impl LexiconBuilder {
    pub fn action(mut self, phrase: impl Into<String>, id: ActionId) -> Self {
        self.actions.push((phrase.into(), id));
        self
    }

    pub fn category(mut self, phrase: impl Into<String>, id: ElementCategoryId) -> Self {
        self.categories.push((phrase.into(), id));
        self
    }

    pub fn build(self) -> Result<Lexicon, LexiconError> {
        Ok(Lexicon {
            actions: build_table(self.actions)?,
            categories: build_table(self.categories)?,
        })
    }
}

fn build_table<T>(entries: Vec<(String, T)>) -> Result<HashMap<String, T>, LexiconError>
where
    T: Copy + PartialEq + std::fmt::Display,
{
    let mut table = HashMap::with_capacity(entries.len());
    for (phrase, id) in entries {
        let key = phrase_key(&phrase);
        if key.is_empty() {
            return Err(LexiconError::EmptyPhrase(id.to_string()));
        }
        if let Some(existing) = table.insert(key, id) {
            if existing != id {
                return Err(LexiconError::Conflict {
                    phrase,
                    first: existing.to_string(),
                    second: id.to_string(),
                });
            }
        }
    }
    Ok(table)
}
