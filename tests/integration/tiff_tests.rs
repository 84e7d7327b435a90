//! End-to-end ImageDescription extraction from files on disk.

use ome_validator::error::TiffError;
use ome_validator::format::tiff::extract_image_description;
use ome_validator::io::FileRangeReader;

use super::test_utils::{temp_file_with, Page, TiffBuilder};

async fn extract(builder: &TiffBuilder) -> Result<Option<String>, TiffError> {
    let file = builder.write_temp();
    let reader = FileRangeReader::open(file.path()).unwrap();
    extract_image_description(&reader).await
}

#[tokio::test]
async fn test_little_endian_classic() {
    let builder = TiffBuilder::new().page(Page::with_description("little endian metadata"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("little endian metadata"));
}

#[tokio::test]
async fn test_big_endian_classic() {
    let builder = TiffBuilder::new()
        .big_endian()
        .page(Page::with_description("big endian metadata"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("big endian metadata"));
}

#[tokio::test]
async fn test_bigtiff() {
    let builder = TiffBuilder::new()
        .bigtiff()
        .page(Page::with_description("bigtiff metadata"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("bigtiff metadata"));
}

#[tokio::test]
async fn test_inline_short_description() {
    // "abc" plus its NUL terminator fits in the 4-byte inline value.
    let builder = TiffBuilder::new().page(Page::with_description("abc"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_description_on_later_page() {
    let builder = TiffBuilder::new()
        .page(Page::blank())
        .page(Page::blank())
        .page(Page::with_description("third page metadata"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("third page metadata"));
}

#[tokio::test]
async fn test_first_description_wins() {
    let builder = TiffBuilder::new()
        .page(Page::with_description("first"))
        .page(Page::with_description("second"));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_no_description_at_all() {
    let builder = TiffBuilder::new().page(Page::blank()).page(Page::blank());
    let result = extract(&builder).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_large_embedded_document() {
    // Force the value well past the inline threshold.
    let text = format!("<OME>{}</OME>", "x".repeat(10_000));
    let builder = TiffBuilder::new().page(Page::with_description(&text));
    let result = extract(&builder).await.unwrap();
    assert_eq!(result.as_deref(), Some(text.as_str()));
}

#[tokio::test]
async fn test_not_a_tiff_file() {
    let file = temp_file_with(".tiff", b"this is just text pretending to be a tiff");
    let reader = FileRangeReader::open(file.path()).unwrap();
    let result = extract_image_description(&reader).await;
    assert!(matches!(result, Err(TiffError::InvalidMagic(_))));
}

#[tokio::test]
async fn test_truncated_file() {
    let full = TiffBuilder::new()
        .page(Page::with_description("will be cut off"))
        .build();
    let file = temp_file_with(".tiff", &full[..10]);
    let reader = FileRangeReader::open(file.path()).unwrap();
    let result = extract_image_description(&reader).await;
    assert!(result.is_err());
}
