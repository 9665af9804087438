use super::*;
use serde_json::json;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: Rgba8 = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(c, Rgba8::RED);

    let c: Rgba8 = serde_json::from_value(json!("#0000ff80")).unwrap();
    assert_eq!(c, Rgba8::rgba(0, 0, 255, 128));
}

#[test]
fn parses_css_names_case_insensitively() {
    let c: Rgba8 = serde_json::from_value(json!("White")).unwrap();
    assert_eq!(c, Rgba8::WHITE);
    assert!(serde_json::from_value::<Rgba8>(json!("chartreuse-ish")).is_err());
}

#[test]
fn parses_rgba_object_and_array() {
    let c: Rgba8 = serde_json::from_value(json!({"r": 1.0, "g": 0.5, "b": 0.0})).unwrap();
    assert_eq!(c, Rgba8::rgba(255, 128, 0, 255));

    let c: Rgba8 = serde_json::from_value(json!([0.0, 0.0, 0.0, 0.0])).unwrap();
    assert_eq!(c, Rgba8::rgba(0, 0, 0, 0));

    assert!(serde_json::from_value::<Rgba8>(json!([1.0, 1.0])).is_err());
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = vec![200u8, 100, 50, 128, 10, 20, 30, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
    unpremultiply_rgba8_in_place(&mut px);
    for (got, want) in px[0..3].iter().zip([200u8, 100, 50]) {
        assert!(got.abs_diff(want) <= 2, "{got} vs {want}");
    }
}

#[test]
fn serializes_as_hex_and_reads_back() {
    let c = Rgba8::rgba(1, 2, 254, 128);
    let v = serde_json::to_value(c).unwrap();
    assert_eq!(v, json!("#0102fe80"));
    assert_eq!(serde_json::from_value::<Rgba8>(v).unwrap(), c);
}
