//! Instruction text canonicalization.
//!
//! `normalize` and `canonicalize` are idempotent: running either on its own
//! output changes nothing.

use khamsang_common::protocol::is_thai_char;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const SARA_E: char = '\u{0E40}';
const SARA_AE: char = '\u{0E41}';
const SARA_AA: char = '\u{0E32}';
const SARA_AM: char = '\u{0E33}';
const NIKHAHIT: char = '\u{0E4D}';

/// Canonical form used for matching: `canonicalize` plus Latin lowercase.
pub fn normalize(input: &str) -> String {
    canonical_form(input, true)
}

/// NFC, Thai spelling unification and whitespace collapse. Letter case is
/// kept, so text that ends up in the browser is left as written.
pub fn canonicalize(input: &str) -> String {
    canonical_form(input, false)
}

fn canonical_form(input: &str, lowercase: bool) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for c in input.chars().filter(|c| !is_zero_width(*c)) {
        if lowercase && !is_thai_char(c) {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(c);
        }
    }

    let composed: String = cleaned.nfc().collect();
    let unified = unify_thai(&composed);
    let recomposed: String = unified.nfc().collect();
    collapse_whitespace(&recomposed)
}

/// Key used for fuzzy comparison: normalized, without tone marks or Latin
/// diacritics, and without any whitespace.
pub fn comparison_key(input: &str) -> String {
    let normalized = normalize(input);
    normalized
        .nfd()
        .filter(|c| !c.is_whitespace())
        .filter(|c| !is_thai_tone_mark(*c))
        .filter(|c| is_thai_char(*c) || !is_combining_mark(*c))
        .collect()
}

/// Thai combining marks written above or below a base consonant.
pub fn is_thai_combining(c: char) -> bool {
    matches!(c, '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}')
}

/// Vowels written before the consonant they follow in speech.
pub fn is_thai_leading_vowel(c: char) -> bool {
    matches!(c, '\u{0E40}'..='\u{0E44}')
}

fn is_thai_tone_mark(c: char) -> bool {
    matches!(c, '\u{0E47}'..='\u{0E4C}')
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

// vowel marks, then tone marks, then the rest
fn mark_rank(c: char) -> u8 {
    match c {
        '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' => 0,
        '\u{0E48}'..='\u{0E4B}' => 1,
        _ => 2,
    }
}

fn unify_thai(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == SARA_E && chars.get(i + 1) == Some(&SARA_E) {
            out.push(SARA_AE);
            i += 2;
            continue;
        }

        if is_thai_combining(c) {
            let mut run = Vec::new();
            while i < chars.len() && is_thai_combining(chars[i]) {
                run.push(chars[i]);
                i += 1;
            }

            // NIKHAHIT + SARA AA spelled apart is SARA AM.
            let spaced_am = run.contains(&NIKHAHIT) && chars.get(i) == Some(&SARA_AA);
            if spaced_am {
                run.retain(|m| *m != NIKHAHIT);
                i += 1;
            }

            run.sort_by_key(|m| mark_rank(*m));
            let mut seen = Vec::with_capacity(run.len());
            for m in run {
                if !seen.contains(&m) {
                    seen.push(m);
                }
            }
            out.extend(seen);

            if spaced_am {
                out.push(SARA_AM);
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_latin_only() {
        assert_eq!(normalize("Click ปุ่ม SUBMIT"), "click ปุ่ม submit");
    }

    #[test]
    fn test_canonicalize_keeps_case() {
        assert_eq!(
            canonicalize("  พิมพ์  \"MyPassWord99\"\u{200B} "),
            "พิมพ์ \"MyPassWord99\""
        );
        assert_eq!(canonicalize("\u{0E40}\u{0E40}ดง Go"), "แดง Go");
        assert_eq!(normalize(&canonicalize("Click SUBMIT")), "click submit");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  คลิก \t ปุ่ม\n\nส่ง  "), "คลิก ปุ่ม ส่ง");
    }

    #[test]
    fn test_composes_latin() {
        assert_eq!(normalize("Cafe\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn test_double_sara_e() {
        assert_eq!(normalize("\u{0E40}\u{0E40}ดง"), "แดง");
    }

    #[test]
    fn test_spaced_sara_am() {
        // น + ้ + ํ + า  ->  น้ำ
        assert_eq!(
            normalize("\u{0E19}\u{0E49}\u{0E4D}\u{0E32}"),
            "\u{0E19}\u{0E49}\u{0E33}"
        );
    }

    #[test]
    fn test_tone_after_vowel_and_dedup() {
        // ท + ่ + ี + ่  ->  ที่
        assert_eq!(
            normalize("\u{0E17}\u{0E48}\u{0E35}\u{0E48}"),
            "\u{0E17}\u{0E35}\u{0E48}"
        );
    }

    #[test]
    fn test_zero_width_removed() {
        assert_eq!(normalize("คลิก\u{200B}ปุ่ม"), "คลิกปุ่ม");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "  Click   THE Blue  button ",
            "\u{0E40}\u{0E40}\u{0E40}ดง",
            "\u{0E17}\u{0E48}\u{0E35}\u{0E48}\u{0E48}",
            "e\u{200B}\u{0301}",
            "\u{0E19}\u{0E4D}\u{0E49}\u{0E32}",
            "İstanbul ไปที่",
            "",
            "   ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
            let kept = canonicalize(s);
            assert_eq!(canonicalize(&kept), kept, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_comparison_key_ignores_tones_and_spaces() {
        assert_eq!(comparison_key("ส่ง ข้อมูล"), comparison_key("สงขอมูล"));
        assert_eq!(comparison_key("Résumé"), "resume");
    }
}
