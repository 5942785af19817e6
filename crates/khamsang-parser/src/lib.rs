pub mod dictionary;
pub mod intent;
pub mod lexicon;
pub mod normalizer;
pub mod tokenizer;

pub use dictionary::Dictionary;
pub use intent::{analyze, parse_instruction, Analysis, IntentExtractor};
pub use lexicon::{Lexicon, LexiconBuilder, LexiconError};
pub use normalizer::{canonicalize, comparison_key, normalize};
pub use tokenizer::{tokenize, Token, TokenKind, Tokens};
