use serde_json::json;

use super::*;

fn body(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap()).unwrap()
}

#[test]
fn header_is_ordered_union_of_keys() {
    let rows = vec![json!({"name": "Mug", "price": 250}), json!({"name": "Vase", "stock": 3, "price": 400})];
    assert_eq!(header(&rows), vec!["name", "price", "stock"]);
}

#[test]
fn sparse_rows_leave_blank_cells() {
    let rows = vec![json!({"name": "Mug", "price": 250}), json!({"name": "Vase", "stock": 3})];
    let csv = to_csv(&rows).unwrap();
    assert_eq!(body(&csv), "name,price,stock\nMug,250,\nVase,,3\n");
}

#[test]
fn nested_values_become_json_text() {
    let rows = vec![json!({"lot": "LOT-1", "tags": ["a", "b"], "meta": {"k": 1}, "note": null})];
    let csv = to_csv(&rows).unwrap();
    assert_eq!(body(&csv), "lot,tags,meta,note\nLOT-1,\"[\"\"a\"\",\"\"b\"\"]\",\"{\"\"k\"\":1}\",\n");
}

#[test]
fn quotes_and_commas_are_escaped() {
    let csv = to_csv(&[json!({"name": "Kase, büyük", "note": "12\" çap"})]).unwrap();
    assert_eq!(body(&csv), "name,note\n\"Kase, büyük\",\"12\"\" çap\"\n");
}

#[test]
fn empty_input_is_only_the_bom() {
    assert_eq!(to_csv(&[]).unwrap(), UTF8_BOM);
}

#[test]
fn rows_of_keeps_struct_field_order() {
    #[derive(Serialize)]
    struct Line {
        zeta: u8,
        alpha: &'static str,
    }
    let rows = rows_of(&[Line { zeta: 1, alpha: "x" }]).unwrap();
    assert_eq!(header(&rows), vec!["zeta", "alpha"]);
}
