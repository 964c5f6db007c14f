use crate::error::{CatalogError, Result};
use lopdf::Document as LoDocument;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub file_size_bytes: usize,
    /// MediaBox width and height per page, in page order.
    pub page_sizes: Vec<(f32, f32)>,
    pub image_count: usize,
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| CatalogError::Inspect(err.to_string()))?;

    let mut page_sizes = Vec::new();
    for page_id in pdf.get_pages().into_values() {
        page_sizes.push(media_box(&pdf, page_id)?);
    }

    let image_count = pdf
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .filter(|stream| is_base_image(stream))
        .count();

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: page_sizes.len(),
        file_size_bytes: bytes.len(),
        page_sizes,
        image_count,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport> {
    let data = std::fs::read(path)?;
    inspect_pdf_bytes(&data)
}

// Soft masks are grayscale image streams; count only the drawable images.
fn is_base_image(stream: &lopdf::Stream) -> bool {
    let is_image = stream
        .dict
        .get(b"Subtype")
        .and_then(|v| v.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false);
    let is_gray = stream
        .dict
        .get(b"ColorSpace")
        .and_then(|v| v.as_name())
        .map(|name| name == b"DeviceGray")
        .unwrap_or(false);
    is_image && !is_gray
}

fn media_box(pdf: &LoDocument, page_id: lopdf::ObjectId) -> Result<(f32, f32)> {
    let invalid = |err: lopdf::Error| CatalogError::Inspect(format!("page {page_id:?}: {err}"));
    let page = pdf.get_object(page_id).and_then(|obj| obj.as_dict()).map_err(invalid)?;
    let rect = page
        .get(b"MediaBox")
        .and_then(|obj| obj.as_array())
        .map_err(invalid)?;
    if rect.len() != 4 {
        return Err(CatalogError::Inspect(format!(
            "page {page_id:?}: MediaBox has {} entries",
            rect.len()
        )));
    }
    let mut values = [0.0f32; 4];
    for (slot, obj) in values.iter_mut().zip(rect) {
        *slot = obj.as_float().map_err(invalid)?;
    }
    Ok((values[2] - values[0], values[3] - values[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageStore;
    use crate::canvas::Canvas;
    use crate::pdf::document_to_pdf;
    use crate::types::Size;

    #[test]
    fn reports_page_count_and_sizes() {
        let mut canvas = Canvas::new(Size::new(4000.0, 2250.0));
        canvas.show_page();
        canvas.show_page();
        let bytes = document_to_pdf(&canvas.finish(), &ImageStore::new()).unwrap();
        let report = inspect_pdf_bytes(&bytes).unwrap();
        assert_eq!(report.page_count, 2);
        assert_eq!(report.page_sizes, vec![(4000.0, 2250.0), (4000.0, 2250.0)]);
        assert_eq!(report.image_count, 0);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert_eq!(report.pdf_version, "1.4");
    }

    #[test]
    fn garbage_is_an_inspect_error() {
        let err = inspect_pdf_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, CatalogError::Inspect(_)));
    }
}
