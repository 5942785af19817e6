use khamsang_engine::evidence::{EvidenceSet, StaticEvidence};
use khamsang_engine::protocol::{BoundingBox, EvidenceHit, Point};
use khamsang_engine::resolution::{ACCEPTANCE_THRESHOLD, rank, resolve};

fn login_page() -> EvidenceSet {
    EvidenceSet::new(
        1,
        vec![
            EvidenceHit::text(BoundingBox::new(20.0, 20.0, 120.0, 24.0), "เข้าสู่ระบบ", 0.92),
            EvidenceHit::text(BoundingBox::new(20.0, 80.0, 240.0, 30.0), "ชื่อผู้ใช้", 0.85),
            EvidenceHit::text(BoundingBox::new(20.0, 130.0, 240.0, 30.0), "รหัสผ่าน", 0.87),
            EvidenceHit::text(BoundingBox::new(600.0, 10.0, 90.0, 20.0), "Sign in", 0.97),
            EvidenceHit::template(BoundingBox::new(700.0, 10.0, 24.0, 24.0), "search icon", 0.9),
        ],
    )
}

#[test]
fn test_resolves_thai_label() {
    let target = resolve("รหัสผ่าน", &login_page());
    assert_eq!(target.coordinate, Some(Point { x: 140.0, y: 145.0 }));
}

#[test]
fn test_tone_marks_and_spacing_ignored() {
    let target = resolve("เข้า สู่ ระบบ", &login_page());
    assert!(target.is_resolved());
    assert_eq!(
        target.source_hit.map(|hit| hit.recognized_text),
        Some("เข้าสู่ระบบ".to_string())
    );
}

#[test]
fn test_case_insensitive_latin() {
    let target = resolve("SIGN IN", &login_page());
    assert_eq!(target.coordinate, Some(Point { x: 645.0, y: 20.0 }));
    assert!((target.resolution_confidence - 0.97).abs() < 1e-6);
}

#[test]
fn test_template_hit_resolves_by_label() {
    let target = resolve("search icon", &login_page());
    assert_eq!(target.coordinate, Some(Point { x: 712.0, y: 22.0 }));
}

#[test]
fn test_partial_description_uses_containment() {
    let ranked = rank("ผู้ใช้", &login_page());
    assert_eq!(ranked[0].hit.recognized_text, "ชื่อผู้ใช้");
    assert!(ranked[0].similarity > 0.6);
}

#[test]
fn test_unknown_description_fails() {
    let evidence = login_page();
    let ranked = rank("qwxz", &evidence);
    assert!(ranked.iter().all(|c| c.score < ACCEPTANCE_THRESHOLD));
    assert!(!resolve("qwxz", &evidence).is_resolved());
}

#[test]
fn test_empty_evidence_fails() {
    let evidence = EvidenceSet::new(2, Vec::new());
    let target = resolve("ค้นหา", &evidence);
    assert_eq!(target.coordinate, None);
    assert_eq!(target.resolution_confidence, 0.0);
}

#[test]
fn test_confidence_within_bounds() {
    for description in ["รหัสผ่าน", "sign", "search", "ระบบ"] {
        let target = resolve(description, &login_page());
        assert!((0.0..=1.0).contains(&target.resolution_confidence));
    }
}

#[test]
fn test_short_description_inside_long_line_rejected() {
    let evidence = EvidenceSet::new(
        3,
        vec![EvidenceHit::text(
            BoundingBox::new(0.0, 0.0, 300.0, 20.0),
            "Book your stay now",
            0.95,
        )],
    );
    assert!(!resolve("ok", &evidence).is_resolved());

    let evidence = EvidenceSet::new(
        4,
        vec![EvidenceHit::text(BoundingBox::new(0.0, 0.0, 80.0, 20.0), "Google", 0.9)],
    );
    assert!(!resolve("go", &evidence).is_resolved());
}

#[tokio::test]
async fn test_loaded_hits_keep_confidence_in_range() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"[{"bounding_box": {"x": 0, "y": 0, "width": 60, "height": 20},
             "recognized_text": "logout", "recognition_confidence": 3.0}]"#,
    )
    .unwrap();

    let loaded = StaticEvidence::load(file.path()).await.unwrap();
    assert_eq!(loaded.hits()[0].recognition_confidence, 1.0);

    let evidence = EvidenceSet::new(5, loaded.hits().to_vec());
    assert!(!resolve("submit", &evidence).is_resolved());
}
