//! Intent extraction.
//!
//! Matching is first-match-wins in scan order: the earliest token position
//! carrying an action phrase decides the action, even when a more specific
//! phrase appears later. At a single position, longer phrases are tried
//! before shorter ones.

use crate::dictionary::Dictionary;
use crate::lexicon::{Lexicon, MAX_PHRASE_TOKENS};
use crate::normalizer::{canonicalize, normalize};
use crate::tokenizer::{Token, TokenKind, Tokens};
use khamsang_common::protocol::{
    ActionId, DetectedLanguage, ElementCategoryId, Instruction, Intent,
};
use serde::{Deserialize, Serialize};

/// Confidence contributed by a recognized action phrase.
pub const ACTION_WEIGHT: f32 = 0.3;
/// Confidence contributed by a recognized element-category phrase.
pub const CATEGORY_WEIGHT: f32 = 0.2;

/// Words that separate the text to type from the field it goes into.
const PAYLOAD_PREPOSITIONS: &[&str] = &["ใน", "ลงใน", "ที่", "in", "into", "on"];

/// Full breakdown of one instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub original: String,
    pub normalized: String,
    pub language: DetectedLanguage,
    pub tokens: Vec<Token>,
    pub token_count: usize,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy)]
pub struct IntentExtractor<'a> {
    lexicon: &'a Lexicon,
    dictionary: &'a Dictionary,
}

impl Default for IntentExtractor<'static> {
    fn default() -> Self {
        Self::new(Lexicon::default_ref(), Dictionary::default_ref())
    }
}

impl<'a> IntentExtractor<'a> {
    pub fn new(lexicon: &'a Lexicon, dictionary: &'a Dictionary) -> Self {
        Self {
            lexicon,
            dictionary,
        }
    }

    pub fn parse(&self, instruction: &Instruction) -> Intent {
        self.analyze(instruction).intent
    }

    pub fn analyze(&self, instruction: &Instruction) -> Analysis {
        // Case is kept in tokens; the lexicon lowercases for matching.
        let normalized = canonicalize(instruction.text());
        let tokens: Vec<Token> = Tokens::new(&normalized, self.dictionary).collect();
        let intent = self.extract(&tokens);

        Analysis {
            original: instruction.text().to_string(),
            language: instruction.detected_language(),
            token_count: tokens.len(),
            normalized,
            tokens,
            intent,
        }
    }

    /// Build an intent from an already tokenized instruction.
    pub fn extract(&self, tokens: &[Token]) -> Intent {
        let mut consumed = vec![false; tokens.len()];
        let mut confidence = 0.0_f32;

        let action = find_first(tokens, &consumed, |span| self.lexicon.action_for(span));
        let action = action.map(|(id, range)| {
            mark(&mut consumed, range);
            confidence += ACTION_WEIGHT;
            id
        });
        let action_end = consumed.iter().rposition(|c| *c).map_or(0, |i| i + 1);

        let target_category: Option<ElementCategoryId> =
            find_first(tokens, &consumed, |span| self.lexicon.category_for(span)).map(
                |(id, range)| {
                    mark(&mut consumed, range);
                    confidence += CATEGORY_WEIGHT;
                    id
                },
            );

        let payload = if action == Some(ActionId::Type) {
            take_payload(tokens, &mut consumed, action_end)
        } else {
            None
        };

        let remaining: Vec<&Token> = tokens
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(t, _)| t)
            .collect();

        Intent {
            action,
            target_category,
            target_description: join_tokens(&remaining),
            payload,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Parse with the embedded lexicon and dictionary.
pub fn parse_instruction(instruction: &Instruction) -> Intent {
    IntentExtractor::default().parse(instruction)
}

pub fn analyze(instruction: &Instruction) -> Analysis {
    IntentExtractor::default().analyze(instruction)
}

fn find_first<T>(
    tokens: &[Token],
    consumed: &[bool],
    lookup: impl Fn(&[Token]) -> Option<T>,
) -> Option<(T, std::ops::Range<usize>)> {
    for start in 0..tokens.len() {
        let longest = MAX_PHRASE_TOKENS.min(tokens.len() - start);
        for len in (1..=longest).rev() {
            let range = start..start + len;
            if consumed[range.clone()].iter().any(|c| *c) {
                continue;
            }
            if let Some(id) = lookup(&tokens[range.clone()]) {
                return Some((id, range));
            }
        }
    }
    None
}

fn mark(consumed: &mut [bool], range: std::ops::Range<usize>) {
    for used in &mut consumed[range] {
        *used = true;
    }
}

fn is_preposition(token: &Token) -> bool {
    token.is_lexical() && PAYLOAD_PREPOSITIONS.contains(&normalize(&token.text).as_str())
}

/// Quoted text wins; otherwise the words between the action and the first
/// preposition are the text to type. The preposition itself is dropped.
fn take_payload(tokens: &[Token], consumed: &mut [bool], from: usize) -> Option<String> {
    let preposition = (from..tokens.len()).find(|&i| !consumed[i] && is_preposition(&tokens[i]));

    if let Some(i) = (0..tokens.len()).find(|&i| !consumed[i] && tokens[i].kind == TokenKind::Quoted)
    {
        consumed[i] = true;
        if let Some(p) = preposition {
            consumed[p] = true;
        }
        return Some(tokens[i].text.clone());
    }

    let p = preposition?;
    let words: Vec<&Token> = (from..p)
        .filter(|&i| !consumed[i])
        .map(|i| &tokens[i])
        .collect();
    if words.is_empty() {
        return None;
    }
    let text = join_tokens(&words);
    mark(consumed, from..p + 1);
    Some(text)
}

/// Rebuild text from tokens: adjacent tokens are glued, separated ones get
/// one space.
fn join_tokens(tokens: &[&Token]) -> String {
    let mut out = String::new();
    let mut prev_end: Option<usize> = None;
    for token in tokens {
        if let Some(end) = prev_end {
            if end != token.start {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        prev_end = Some(token.end);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_tokens_glues_adjacent() {
        let a = Token {
            text: "ส่ง".into(),
            start: 0,
            end: 9,
            kind: TokenKind::Thai,
        };
        let b = Token {
            text: "ข้อมูล".into(),
            start: 9,
            end: 27,
            kind: TokenKind::Thai,
        };
        let c = Token {
            text: "now".into(),
            start: 28,
            end: 31,
            kind: TokenKind::Latin,
        };
        assert_eq!(join_tokens(&[&a, &b, &c]), "ส่งข้อมูล now");
    }

    #[test]
    fn test_confidence_weights() {
        assert!(ACTION_WEIGHT > CATEGORY_WEIGHT);
        assert!(ACTION_WEIGHT + CATEGORY_WEIGHT <= 1.0);
    }
}
