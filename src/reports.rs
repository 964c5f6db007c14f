//! Plain A4 layouts without catalog decoration: one sheet per product, and a
//! single price table.

use crate::assets::{AssetKind, ImageStore};
use crate::backend::{PageSetup, RenderBackend, RenderSummary};
use crate::error::Result;
use crate::flowable::{
    Flowable, ImageFlowable, PageBreak, Paragraph, Spacer, TableCell, TableFlowable, TextAlign,
    TextRun, TextStyle, VerticalAlign,
};
use crate::image_resolver::{ImageFetcher, is_embeddable_image};
use crate::record::ProductRecord;
use crate::types::{Color, Margins, Size};

const SHEET_IMAGE_SIZE: f32 = 200.0;
const TITLE_SPACING: f32 = 20.0;

pub struct Report {
    pub story: Vec<Box<dyn Flowable>>,
    pub images: ImageStore,
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Report")
            .field("story_len", &self.story.len())
            .field("images", &self.images.len())
            .finish()
    }
}

impl Report {
    pub fn a4_setup() -> PageSetup {
        PageSetup {
            page_size: Size::a4(),
            margins: Margins::all(72.0),
        }
    }

    /// Renders on plain A4 pages with no page decoration.
    pub fn render<B: RenderBackend>(self, backend: &mut B) -> Result<RenderSummary> {
        backend.build(self.story, &Self::a4_setup(), None, None, &self.images)
    }
}

fn title_style() -> TextStyle {
    TextStyle::sized(18.0, 22.0)
        .with_spacing(0.0, 6.0)
        .with_align(TextAlign::Center)
}

fn price_text(price: f64) -> String {
    format!("R$ {price:.2}")
}

/// One page per product: title, price, description and, when it can be
/// fetched, the product image. No eligibility filtering is applied.
#[tracing::instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn product_sheets(records: &[ProductRecord], fetcher: &dyn ImageFetcher) -> Report {
    let mut images = ImageStore::new();
    let mut story: Vec<Box<dyn Flowable>> = Vec::new();
    for record in records {
        let product = &record.product;
        story.push(Box::new(
            Paragraph::new(vec![TextRun::bold(product.name.clone())]).with_style(title_style()),
        ));
        story.push(Box::new(Paragraph::plain(format!(
            "Preço: {}",
            price_text(product.price)
        ))));
        story.push(Box::new(Paragraph::plain(format!(
            "Descrição: {}",
            product.description
        ))));

        let image = record
            .first_image_url()
            .and_then(|url| fetcher.fetch(url).map(|data| (url, data)))
            .filter(|(_, data)| is_embeddable_image(data));
        match image {
            Some((url, data)) => {
                let resource_id =
                    images.insert_content(AssetKind::ProductImage, data, Some(url.to_string()));
                story.push(Box::new(ImageFlowable::new(
                    SHEET_IMAGE_SIZE,
                    SHEET_IMAGE_SIZE,
                    resource_id,
                )));
            }
            None => tracing::debug!(name = %product.name, "sheet without image"),
        }
        story.push(Box::new(PageBreak));
    }
    Report { story, images }
}

/// Title, a spacer and one table of name, price and description. The header
/// row repeats on every page the table spans.
pub fn price_list(records: &[ProductRecord], title: &str) -> Report {
    let header_style = TextStyle::default()
        .with_color(Color::WHITESMOKE)
        .with_align(TextAlign::Center);
    let body_style = TextStyle::default().with_align(TextAlign::Center);

    let header = ["Nome", "Preço", "Descrição"]
        .into_iter()
        .map(|label| {
            TableCell::new(vec![Box::new(
                Paragraph::new(vec![TextRun::bold(label)]).with_style(header_style),
            )])
            .with_align(TextAlign::Center)
            .with_valign(VerticalAlign::Middle)
            .with_vertical_padding(3.0, 12.0)
            .with_background(Some(Color::GREY))
        })
        .collect();

    let mut rows: Vec<Vec<TableCell>> = vec![header];
    for record in records {
        let product = &record.product;
        let values = [
            product.name.clone(),
            price_text(product.price),
            product.description.clone(),
        ];
        rows.push(
            values
                .into_iter()
                .map(|value| {
                    TableCell::new(vec![Box::new(
                        Paragraph::plain(value).with_style(body_style),
                    )])
                    .with_align(TextAlign::Center)
                    .with_valign(VerticalAlign::Middle)
                    .with_background(Some(Color::BEIGE))
                })
                .collect(),
        );
    }

    let table = TableFlowable::new(rows)
        .with_grid(1.0, Color::BLACK)
        .repeat_rows(1);
    let story: Vec<Box<dyn Flowable>> = vec![
        Box::new(Paragraph::new(vec![TextRun::bold(title)]).with_style(title_style())),
        Box::new(Spacer::new(TITLE_SPACING)),
        Box::new(table),
    ];
    Report {
        story,
        images: ImageStore::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PdfBackend;
    use crate::inspect::inspect_pdf_bytes;
    use crate::record::{ImageReference, ProductDetails};

    struct OnePixel;

    impl ImageFetcher for OnePixel {
        fn fetch(&self, url: &str) -> Option<Vec<u8>> {
            if url.contains("broken") {
                return None;
            }
            if url.contains("html") {
                return Some(b"<html>not found</html>".to_vec());
            }
            let img = image::RgbImage::from_pixel(1, 1, image::Rgb([1, 2, 3]));
            let mut out = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut out, image::ImageFormat::Png)
                .ok()?;
            Some(out.into_inner())
        }
    }

    fn record(name: &str, url: Option<&str>) -> ProductRecord {
        ProductRecord {
            product: ProductDetails {
                name: name.to_string(),
                price: 9.9,
                description: format!("descrição de {name}"),
                ..Default::default()
            },
            images: url
                .map(|u| {
                    vec![ImageReference {
                        url: Some(u.to_string()),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn render(report: Report) -> (Vec<u8>, RenderSummary) {
        let mut backend = PdfBackend::new(Vec::new());
        let summary = report.render(&mut backend).unwrap();
        (backend.into_inner(), summary)
    }

    #[test]
    fn sheets_give_each_product_a_page() {
        let records = vec![
            record("mesa", Some("https://img/mesa.png")),
            record("cadeira", Some("https://img/broken.png")),
            record("sofa", None),
            record("estante", Some("https://img/estante.html")),
        ];
        let report = product_sheets(&records, &OnePixel);
        assert_eq!(report.images.len(), 1);
        let (bytes, summary) = render(report);
        assert_eq!(summary.page_count, 4);
        let inspected = inspect_pdf_bytes(&bytes).unwrap();
        assert_eq!(inspected.page_count, 4);
        assert_eq!(inspected.image_count, 1);
    }

    #[test]
    fn long_price_list_spans_pages() {
        let records: Vec<ProductRecord> = (0..120)
            .map(|i| record(&format!("item {i}"), None))
            .collect();
        let report = price_list(&records, "Planilha Teste");
        assert_eq!(report.story.len(), 3);
        let (bytes, summary) = render(report);
        assert!(summary.page_count > 1);
        assert_eq!(inspect_pdf_bytes(&bytes).unwrap().page_count, summary.page_count);
        let pages_with_content = summary
            .metrics
            .pages
            .iter()
            .filter(|page| page.flowable_count > 0)
            .count();
        assert_eq!(pages_with_content, summary.page_count);
    }

    #[test]
    fn price_text_uses_two_decimals() {
        assert_eq!(price_text(9.9), "R$ 9.90");
        assert_eq!(price_text(120.0), "R$ 120.00");
    }
}
