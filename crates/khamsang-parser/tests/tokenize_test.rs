use khamsang_parser::{comparison_key, normalize, tokenize, TokenKind};

#[test]
fn test_normalize_then_tokenize() {
    let normalized = normalize("  เปิดเว็บ   GOOGLE.COM ");
    let tokens: Vec<_> = tokenize(&normalized).collect();

    assert_eq!(normalized, "เปิดเว็บ google.com");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[2].kind, TokenKind::Url);
    assert_eq!(&normalized[tokens[2].start..tokens[2].end], "google.com");
}

#[test]
fn test_spans_point_into_normalized_text() {
    let normalized = normalize("คลิก ปุ่ม \"ตกลง\" 42");
    for token in tokenize(&normalized) {
        let slice = &normalized[token.start..token.end];
        match token.kind {
            TokenKind::Quoted => assert_eq!(slice, format!("\"{}\"", token.text)),
            _ => assert_eq!(slice, token.text),
        }
    }
}

#[test]
fn test_number_tokens() {
    let kinds: Vec<TokenKind> = tokenize("เลื่อน 300").map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::Thai, TokenKind::Number]);
}

#[test]
fn test_empty_tokenization() {
    assert_eq!(tokenize(&normalize("")).count(), 0);
    assert_eq!(tokenize(&normalize("\u{200B}  \t")).count(), 0);
}

#[test]
fn test_normalize_is_idempotent_on_instructions() {
    let samples = [
        "คลิก ปุ่ม ส่งข้อมูล",
        "เปิดเว็บ Google",
        "พิมพ์ \"Hello\" ใน ช่องค้นหา",
        "\u{0E40}\u{0E40}ดง  \u{0E19}\u{0E49}\u{0E4D}\u{0E32}",
        "Go To HTTPS://Example.COM/Path",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_comparison_key_variants_agree() {
    assert_eq!(comparison_key("ส่งข้อมูล"), comparison_key("ส่ง ข้อมูล"));
    assert_eq!(comparison_key("SUBMIT"), comparison_key("submit"));
    assert_ne!(comparison_key("ส่งข้อมูล"), comparison_key("ค้นหา"));
}
