use super::*;

#[test]
fn every_pattern_has_three_wide_elements() {
    assert_eq!(PATTERNS.len(), 44);
    for (c, bits) in PATTERNS {
        assert_eq!(bits.count_ones(), 3, "pattern for {c:?}");
        assert!(*bits < 1 << 9);
    }
}

#[test]
fn patterns_are_unique() {
    for (i, (_, a)) in PATTERNS.iter().enumerate() {
        for (_, b) in &PATTERNS[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn encoded_width_matches_character_count() {
    let (bars, width) = encode("LOT-1").unwrap();
    // 7 symbols with start/stop, 6 gaps.
    assert_eq!(width, 7 * CHAR_MODULES + 6);
    assert_eq!(bars.len(), 7 * 5);
    assert_eq!(bars[0], (0, 1));
    let (last_start, last_width) = *bars.last().unwrap();
    assert_eq!(last_start + last_width, width);
}

#[test]
fn lowercase_is_folded() {
    assert_eq!(encode("lot").unwrap(), encode("LOT").unwrap());
}

#[test]
fn rejects_unencodable_input() {
    assert!(matches!(encode(""), Err(ExportError::EmptyBarcode)));
    assert!(matches!(encode("A*B"), Err(ExportError::Barcode('*'))));
    assert!(matches!(encode("ş"), Err(ExportError::Barcode('ş'))));
}

#[test]
fn encodable_matches_encode() {
    for data in ["LOT-20240603-AB12", "lot 7/b", "LOT_1", "A*B", "#12", ""] {
        assert_eq!(is_encodable(data), encode(data).is_ok(), "{data:?}");
    }
    assert!(is_encodable("lot-9.2"));
    assert!(!is_encodable("LOT_1"));
}
