//! Merges carousel images into one multi-page PDF.
//!
//! Each image becomes one page sized to its pixel dimensions, embedded as a
//! baseline JPEG XObject.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::AnalysisError;

struct EncodedPage {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

fn encode_page(path: &Path) -> Result<EncodedPage, AnalysisError> {
    let image_err = |source| AnalysisError::Image {
        path: path.display().to_string(),
        source,
    };
    let rgb = image::open(path).map_err(image_err)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(image_err)?;
    Ok(EncodedPage {
        width,
        height,
        jpeg: buf.into_inner(),
    })
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: EncodedPage,
) -> Result<ObjectId, AnalysisError> {
    let width = i64::from(page.width);
    let height = i64::from(page.height);

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        page.jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        },
    }))
}

/// Blocking implementation of [`merge_images_to_pdf`].
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] for an empty list,
/// [`AnalysisError::Image`] when an input cannot be decoded, and
/// [`AnalysisError::Io`] or [`AnalysisError::Pdf`] when writing fails.
pub fn write_pdf(images: &[PathBuf], output: &Path) -> Result<(), AnalysisError> {
    if images.is_empty() {
        return Err(AnalysisError::EmptyInput(output.display().to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());
    for path in images {
        let page = encode_page(path)?;
        kids.push(add_page(&mut doc, pages_id, page)?.into());
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AnalysisError::Pdf(e.into()))?;
    std::fs::write(output, bytes).map_err(|e| AnalysisError::io(output, e))
}

/// Writes `images` to `output` as one page each, in the given order.
///
/// Decoding and encoding run on the blocking pool.
///
/// # Errors
///
/// See [`write_pdf`]; also [`AnalysisError::Join`] if the blocking task
/// panics.
pub async fn merge_images_to_pdf(
    images: Vec<PathBuf>,
    output: PathBuf,
) -> Result<PathBuf, AnalysisError> {
    tokio::task::spawn_blocking(move || write_pdf(&images, &output).map(|()| output)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        ImageBuffer::from_pixel(w, h, Rgb([200u8, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn merges_one_page_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "1_1.png", 8, 6);
        let b = write_png(dir.path(), "1_2.png", 4, 10);
        let out = dir.path().join("1.pdf");

        let written = merge_images_to_pdf(vec![a, b], out.clone()).await.unwrap();
        assert_eq!(written, out);

        let doc = Document::load(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_pdf(&[], &dir.path().join("x.pdf")).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn undecodable_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"not an image").unwrap();
        let err = write_pdf(&[bad], &dir.path().join("x.pdf")).unwrap_err();
        assert!(matches!(err, AnalysisError::Image { .. }));
    }
}
