use super::*;

#[test]
fn empty_canvas_still_yields_one_page() {
    let bytes = Canvas::new().finish("Empty").unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn pages_survive_round_trip_through_lopdf() {
    let mut canvas = Canvas::new();
    canvas.add_page();
    canvas.text(40.0, 60.0, 12.0, Font::Bold, "Sertifika");
    canvas.add_page();
    canvas.fill_rect(40.0, 80.0, 100.0, 20.0, 0.9);
    canvas.line(40.0, 100.0, 200.0, 100.0, 0.5);
    assert_eq!(canvas.page_count(), 2);

    let bytes = canvas.finish("Two pages").unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn select_page_ignores_out_of_range() {
    let mut canvas = Canvas::new();
    canvas.add_page();
    canvas.add_page();
    canvas.select_page(0);
    canvas.select_page(9);
    canvas.text(10.0, 10.0, 8.0, Font::Regular, "first");
    assert_eq!(canvas.page_count(), 2);
    assert_eq!(canvas.pages[0].len(), 5);
    assert!(canvas.pages[1].is_empty());
}

#[test]
fn turkish_text_is_transliterated() {
    assert_eq!(encode_text("Şişe ağırlığı"), b"Sise agirligi".to_vec());
    assert_eq!(encode_text("Çözelti"), vec![0xC7, 0xF6, b'z', b'e', b'l', b't', b'i']);
    assert_eq!(encode_text("€ – ok"), b"? - ok".to_vec());
}

#[test]
fn text_width_scales_with_size() {
    assert!(text_width("abcd", 10.0) < text_width("abcd", 20.0));
    assert!(text_width("", 12.0).abs() < f32::EPSILON);
}
