use serde_json::json;

use super::*;
use crate::state::test_helpers::MockRemote;

fn png(name: &str, bytes: &[u8]) -> UploadFile {
    UploadFile { file_name: name.into(), content_type: "image/png".into(), bytes: bytes.to_vec() }
}

#[test]
fn sanitize_strips_paths_and_odd_characters() {
    assert_eq!(sanitize_file_name("C:\\photos\\Kupa Bardak.PNG"), "kupa-bardak.png");
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("çiçek.jpg"), "i-ek.jpg");
    assert_eq!(sanitize_file_name("..."), "file");
}

#[test]
fn object_path_is_content_addressed() {
    let a = object_path("products/1", "a.png", b"same");
    let b = object_path("/products/1/", "a.png", b"same");
    let c = object_path("products/1", "a.png", b"different");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.starts_with("products/1/"));
    assert!(a.ends_with("-a.png"));
    // 8 digest bytes as hex.
    let hex = a.trim_start_matches("products/1/").split('-').next().unwrap();
    assert_eq!(hex.len(), 16);
}

#[tokio::test]
async fn upload_all_stores_every_file() {
    let mock = MockRemote::new();
    let stored = upload_all(&mock, "t", "product-images", "p", vec![png("a.png", b"1"), png("b.png", b"2")], true)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(mock.object_count(), 2);
    assert!(stored[0].url.contains("/object/public/product-images/p/"));
    let (content_type, bytes) = mock.object("product-images", &stored[1].path).unwrap();
    assert_eq!(content_type, "image/png");
    assert_eq!(bytes, b"2");
}

#[tokio::test]
async fn validation_happens_before_any_upload() {
    let mock = MockRemote::new();
    let bad = UploadFile { file_name: "x.exe".into(), content_type: "application/octet-stream".into(), bytes: vec![1] };
    let err = upload_all(&mock, "t", "b", "p", vec![png("a.png", b"1"), bad], true).await.unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedType { .. }));
    assert_eq!(mock.object_count(), 0);

    assert!(matches!(upload_all(&mock, "t", "b", "p", vec![], true).await, Err(UploadError::NoFiles)));
    assert!(matches!(
        upload_all(&mock, "t", "b", "p", vec![png("a.png", b"")], true).await,
        Err(UploadError::EmptyFile(_))
    ));
    let big = png("big.png", &vec![0; MAX_UPLOAD_BYTES + 1]);
    assert!(matches!(upload_all(&mock, "t", "b", "p", vec![big], true).await, Err(UploadError::TooLarge { .. })));
}

#[tokio::test]
async fn attach_appends_urls_to_product() {
    let mock = MockRemote::new();
    let id = Uuid::new_v4();
    mock.seed(
        "products",
        vec![json!({"id": id, "name": "Mug", "price": 250.0, "currency": "TRY", "images": ["https://old"]})],
    );
    let product = attach_product_images(&mock, "t", "product-images", id, vec![png("mug.png", b"m")]).await.unwrap();
    assert_eq!(product.images.len(), 2);
    assert_eq!(product.images[0], "https://old");
}

#[tokio::test]
async fn archive_returns_signed_link() {
    let mock = MockRemote::new();
    let stored = archive_document(&mock, "t", "documents", "coa.pdf", b"%PDF-1.5".to_vec(), 60).await.unwrap();
    assert!(stored.url.contains("/object/sign/documents/"));
    assert!(stored.url.ends_with("expires=60"));
}
