use khamsang_common::protocol::{ActionId, DetectedLanguage, ElementCategoryId, Instruction};
use khamsang_parser::{analyze, parse_instruction, Dictionary, IntentExtractor, Lexicon};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_thai_click_button() {
    let intent = parse_instruction(&Instruction::thai("คลิก ปุ่ม ส่งข้อมูล"));

    assert_eq!(intent.action, Some(ActionId::Click));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Button));
    assert_eq!(intent.target_description, "ส่งข้อมูล");
    assert!(close(intent.confidence, 0.5), "confidence {}", intent.confidence);
}

#[test]
fn test_thai_without_spaces_same_intent() {
    let spaced = parse_instruction(&Instruction::new("คลิก ปุ่ม ส่งข้อมูล"));
    let packed = parse_instruction(&Instruction::new("คลิกปุ่มส่งข้อมูล"));

    assert_eq!(spaced.action, packed.action);
    assert_eq!(spaced.target_category, packed.target_category);
    assert_eq!(spaced.target_description, packed.target_description);
}

#[test]
fn test_open_website_mixed_script() {
    let intent = parse_instruction(&Instruction::new("เปิดเว็บ Google"));

    assert_eq!(intent.action, Some(ActionId::Navigate));
    assert_eq!(intent.target_category, None);
    assert_eq!(intent.target_description, "Google");
    assert!(close(intent.confidence, 0.3));
    assert!(!intent.requires_target());
}

#[test]
fn test_english_instruction() {
    let intent = parse_instruction(&Instruction::new("Click the blue Submit button"));

    assert_eq!(intent.action, Some(ActionId::Click));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Button));
    assert_eq!(intent.target_description, "the blue Submit");
}

#[test]
fn test_multi_word_phrase_beats_single_word() {
    let intent = parse_instruction(&Instruction::new("go to example.com"));
    assert_eq!(intent.action, Some(ActionId::Navigate));
    assert_eq!(intent.target_description, "example.com");

    let intent = parse_instruction(&Instruction::new("ไปที่ youtube"));
    assert_eq!(intent.action, Some(ActionId::Navigate));
    assert_eq!(intent.target_description, "youtube");
}

#[test]
fn test_first_action_wins() {
    let intent = parse_instruction(&Instruction::new("scroll then click the link"));

    assert_eq!(intent.action, Some(ActionId::Scroll));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Link));
    // the later action word is left in the description
    assert_eq!(intent.target_description, "then click the");
}

#[test]
fn test_no_action_recognized() {
    let intent = parse_instruction(&Instruction::new("ปุ่ม ส่งข้อมูล"));

    assert_eq!(intent.action, None);
    assert_eq!(intent.target_category, Some(ElementCategoryId::Button));
    assert!(close(intent.confidence, 0.2));
    assert!(!intent.is_executable());

    let intent = parse_instruction(&Instruction::new("hello world"));
    assert_eq!(intent.action, None);
    assert_eq!(intent.target_category, None);
    assert_eq!(intent.target_description, "hello world");
    assert!(close(intent.confidence, 0.0));
}

#[test]
fn test_empty_instruction() {
    let intent = parse_instruction(&Instruction::new("   "));

    assert_eq!(intent.action, None);
    assert_eq!(intent.target_category, None);
    assert!(intent.target_description.is_empty());
    assert!(close(intent.confidence, 0.0));
}

#[test]
fn test_confidence_is_monotonic_and_bounded() {
    let neither = parse_instruction(&Instruction::new("ส่งข้อมูล"));
    let category = parse_instruction(&Instruction::new("ปุ่ม ส่งข้อมูล"));
    let action = parse_instruction(&Instruction::new("คลิก ส่งข้อมูล"));
    let both = parse_instruction(&Instruction::new("คลิก ปุ่ม ส่งข้อมูล"));

    assert!(neither.confidence < category.confidence);
    assert!(category.confidence < action.confidence);
    assert!(action.confidence < both.confidence);
    for intent in [neither, category, action, both] {
        assert!((0.0..=1.0).contains(&intent.confidence));
    }
}

#[test]
fn test_type_with_quoted_payload() {
    let intent = parse_instruction(&Instruction::new("พิมพ์ \"สวัสดี\" ในช่องค้นหา"));

    assert_eq!(intent.action, Some(ActionId::Type));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Input));
    assert_eq!(intent.payload.as_deref(), Some("สวัสดี"));
    assert_eq!(intent.target_description, "ค้นหา");
}

#[test]
fn test_type_with_preposition_payload() {
    let intent = parse_instruction(&Instruction::new("type hello world into search field"));

    assert_eq!(intent.action, Some(ActionId::Type));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Input));
    assert_eq!(intent.payload.as_deref(), Some("hello world"));
    assert_eq!(intent.target_description, "search");
}

#[test]
fn test_typed_text_keeps_case() {
    let intent = parse_instruction(&Instruction::new("type \"MyPassWord99\" into password field"));
    assert_eq!(intent.action, Some(ActionId::Type));
    assert_eq!(intent.payload.as_deref(), Some("MyPassWord99"));
    assert_eq!(intent.target_description, "password");

    let intent = parse_instruction(&Instruction::new("TYPE Hello World INTO search field"));
    assert_eq!(intent.action, Some(ActionId::Type));
    assert_eq!(intent.payload.as_deref(), Some("Hello World"));
    assert_eq!(intent.target_description, "search");
}

#[test]
fn test_url_path_keeps_case() {
    let intent = parse_instruction(&Instruction::new("open https://example.com/Docs/ReadMe"));
    assert_eq!(intent.action, Some(ActionId::Open));
    assert_eq!(intent.target_description, "https://example.com/Docs/ReadMe");
}

#[test]
fn test_type_without_payload() {
    let intent = parse_instruction(&Instruction::new("type search field"));

    assert_eq!(intent.action, Some(ActionId::Type));
    assert_eq!(intent.payload, None);
    assert_eq!(intent.target_description, "search");
}

#[test]
fn test_payload_only_for_type() {
    let intent = parse_instruction(&Instruction::new("click \"OK\" in the form"));

    assert_eq!(intent.action, Some(ActionId::Click));
    assert_eq!(intent.payload, None);
    assert_eq!(intent.target_category, Some(ElementCategoryId::Form));
}

#[test]
fn test_custom_lexicon_and_dictionary() {
    let lexicon = Lexicon::builder()
        .action("จิ้ม", ActionId::Click)
        .category("แท็บ", ElementCategoryId::Link)
        .build()
        .unwrap();
    let dictionary = Dictionary::with_extra_words(["จิ้ม", "แท็บ", "ราคา"]);
    let extractor = IntentExtractor::new(&lexicon, &dictionary);

    let intent = extractor.parse(&Instruction::new("จิ้มแท็บราคา"));
    assert_eq!(intent.action, Some(ActionId::Click));
    assert_eq!(intent.target_category, Some(ElementCategoryId::Link));
    assert_eq!(intent.target_description, "ราคา");
}

#[test]
fn test_analysis_report() {
    let analysis = analyze(&Instruction::new("  คลิก   ปุ่ม ค้นหา "));

    assert_eq!(analysis.original, "  คลิก   ปุ่ม ค้นหา ");
    assert_eq!(analysis.normalized, "คลิก ปุ่ม ค้นหา");
    assert_eq!(analysis.language, DetectedLanguage::Thai);
    assert_eq!(analysis.token_count, 3);
    assert_eq!(analysis.tokens.len(), 3);
    assert_eq!(analysis.intent.target_description, "ค้นหา");

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["intent"]["action"], "click");
}

#[test]
fn test_parse_is_deterministic() {
    let instruction = Instruction::new("กด ลิงก์ สมัครสมาชิก");
    let first = parse_instruction(&instruction);
    let second = parse_instruction(&instruction);
    assert_eq!(first, second);
}
