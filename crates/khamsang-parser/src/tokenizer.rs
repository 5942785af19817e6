//! Script-aware tokenizer.
//!
//! Thai runs are segmented by dictionary longest-match, everything else is
//! split on whitespace and punctuation. `Tokens` is a lazy iterator; cloning
//! it restarts from the same position.

use crate::dictionary::Dictionary;
use crate::normalizer::{is_thai_combining, is_thai_leading_vowel};
use khamsang_common::protocol::is_thai_char;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref URL_RE: Regex = Regex::new(
        r"(?i)^(?:[a-z][a-z0-9+.\-]*://)?(?:localhost|(?:[a-z0-9\-]+\.)+[a-z]{2,})(?::\d+)?(?:[/?#]\S*)?$"
    )
    .expect("URL pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Thai,
    Latin,
    Number,
    Url,
    Quoted,
}

/// A lexical unit of the normalized instruction.
///
/// `start..end` is the byte span in the source text; for quoted tokens the
/// span includes the quotes while `text` does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl Token {
    /// Tokens that can take part in lexicon phrases.
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, TokenKind::Thai | TokenKind::Latin)
    }
}

/// Tokenize with the embedded dictionary.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens::new(text, Dictionary::default_ref())
}

#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
    dictionary: &'a Dictionary,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str, dictionary: &'a Dictionary) -> Self {
        Self {
            text,
            pos: 0,
            dictionary,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn quoted(&mut self) -> Option<Token> {
        let start = self.pos;
        let close = self.text[start + 1..].find('"')? + start + 1;
        self.pos = close + 1;
        Some(Token {
            text: self.text[start + 1..close].to_string(),
            start,
            end: close + 1,
            kind: TokenKind::Quoted,
        })
    }

    fn thai(&mut self) -> Token {
        let start = self.pos;
        let run_end = self.text[start..]
            .char_indices()
            .find(|(_, c)| !is_thai_char(*c))
            .map(|(idx, _)| start + idx)
            .unwrap_or(self.text.len());
        let run = &self.text[start..run_end];

        let len = match self.dictionary.longest_match(run) {
            Some(len) => len,
            None => {
                // Group unknown clusters until a known word begins.
                let mut len = cluster_len(run);
                while len < run.len() && self.dictionary.longest_match(&run[len..]).is_none() {
                    len += cluster_len(&run[len..]);
                }
                len
            }
        };

        self.pos = start + len;
        Token {
            text: run[..len].to_string(),
            start,
            end: start + len,
            kind: TokenKind::Thai,
        }
    }

    fn latin(&mut self) -> Token {
        let start = self.pos;
        let chunk_end = self.text[start..]
            .char_indices()
            .find(|(_, c)| c.is_whitespace() || is_thai_char(*c) || *c == '"')
            .map(|(idx, _)| start + idx)
            .unwrap_or(self.text.len());
        let chunk = &self.text[start..chunk_end];
        let trimmed = chunk.trim_end_matches(['.', ',', ';', '!', '?', ')']);

        if URL_RE.is_match(trimmed) {
            self.pos = start + trimmed.len();
            return Token {
                text: trimmed.to_string(),
                start,
                end: self.pos,
                kind: TokenKind::Url,
            };
        }

        let word_len = chunk
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(idx, _)| idx)
            .unwrap_or(chunk.len());
        let word = &chunk[..word_len];
        self.pos = start + word_len;

        let kind = if word.chars().all(|c| c.is_ascii_digit()) {
            TokenKind::Number
        } else {
            TokenKind::Latin
        };
        Token {
            text: word.to_string(),
            start,
            end: self.pos,
            kind,
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let c = self.peek_char()?;

            if c.is_whitespace() {
                self.pos += c.len_utf8();
                continue;
            }

            if c == '"' {
                if let Some(token) = self.quoted() {
                    return Some(token);
                }
                self.pos += 1;
                continue;
            }

            if is_thai_char(c) {
                return Some(self.thai());
            }

            if c.is_alphanumeric() {
                return Some(self.latin());
            }

            // punctuation and symbols separate tokens
            self.pos += c.len_utf8();
        }
    }
}

/// Byte length of one Thai character cluster: leading vowels, a base
/// character and the marks stacked on it.
fn cluster_len(text: &str) -> usize {
    let mut chars = text.char_indices().peekable();
    let mut end = 0;

    while let Some((idx, c)) = chars.next() {
        end = idx + c.len_utf8();
        if is_thai_leading_vowel(c) {
            continue;
        }
        while let Some((idx, c)) = chars.peek().copied() {
            if !is_thai_combining(c) {
                break;
            }
            end = idx + c.len_utf8();
            chars.next();
        }
        break;
    }

    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).map(|t| t.text).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("   ").count(), 0);
    }

    #[test]
    fn test_thai_without_spaces() {
        assert_eq!(texts("คลิกปุ่มค้นหา"), vec!["คลิก", "ปุ่ม", "ค้นหา"]);
    }

    #[test]
    fn test_latin_words_and_punctuation() {
        assert_eq!(texts("click, the submit-button!"), vec!["click", "the", "submit", "button"]);
    }

    #[test]
    fn test_mixed_script_runs() {
        let tokens: Vec<Token> = tokenize("เปิดเว็บgoogle").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "google");
        assert_eq!(tokens[2].kind, TokenKind::Latin);
        assert_eq!(tokens[2].start, "เปิดเว็บ".len());
    }

    #[test]
    fn test_url_token() {
        let tokens: Vec<Token> = tokenize("ไปที่ https://example.com/a?b=1.").collect();
        let url = tokens.last().unwrap();
        assert_eq!(url.kind, TokenKind::Url);
        assert_eq!(url.text, "https://example.com/a?b=1");
    }

    #[test]
    fn test_domain_token() {
        let tokens: Vec<Token> = tokenize("open google.com").collect();
        assert_eq!(tokens[1].kind, TokenKind::Url);
        assert_eq!(tokens[1].text, "google.com");
    }

    #[test]
    fn test_decimal_is_not_url() {
        let tokens: Vec<Token> = tokenize("scroll 1.5").collect();
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[2].text, "5");
    }

    #[test]
    fn test_quoted_token() {
        let tokens: Vec<Token> = tokenize("พิมพ์ \"hello world\" ในช่อง").collect();
        assert_eq!(tokens[1].kind, TokenKind::Quoted);
        assert_eq!(tokens[1].text, "hello world");
        assert_eq!(tokens[2].text, "ใน");
    }

    #[test]
    fn test_unclosed_quote_is_skipped() {
        assert_eq!(texts("type \"abc"), vec!["type", "abc"]);
    }

    #[test]
    fn test_unknown_thai_grouped() {
        // unknown syllables stay together until a known word starts
        let dict = Dictionary::from_words(["ปุ่ม"]);
        let tokens: Vec<String> = Tokens::new("กขคปุ่ม", &dict).map(|t| t.text).collect();
        assert_eq!(tokens, vec!["กขค", "ปุ่ม"]);
    }

    #[test]
    fn test_unknown_cluster_keeps_marks() {
        let dict = Dictionary::from_words(["ปุ่ม"]);
        let tokens: Vec<String> = Tokens::new("เก่ง", &dict).map(|t| t.text).collect();
        assert_eq!(tokens, vec!["เก่ง"]);
    }

    #[test]
    fn test_restartable_and_deterministic() {
        let tokens = tokenize("คลิก ปุ่ม ส่งข้อมูล");
        let first: Vec<Token> = tokens.clone().collect();
        let second: Vec<Token> = tokens.collect();
        assert_eq!(first, second);
        assert_eq!(first, tokenize("คลิก ปุ่ม ส่งข้อมูล").collect::<Vec<_>>());
    }
}
