use crate::assembler::{Assembly, BlockAssembler};
use crate::assets::{AssetKind, ImageStore};
use crate::backend::{PageSetup, PdfBackend, RenderBackend, RenderSummary};
use crate::config::{CatalogConfig, LayoutVariant, VariantConfig};
use crate::decorator::{PageDecorator, PageGeometry};
use crate::error::{CatalogError, Result};
use crate::image_resolver::{FileImageFetcher, ImageFetcher, ImageResolver};
use crate::pdf::PdfOptions;
use crate::record::ProductRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Assembled elements plus the image payloads they reference.
#[derive(Debug, Clone)]
pub struct Composition {
    pub assembly: Assembly,
    pub images: ImageStore,
}

/// Runs eligibility, image resolution and block assembly, then hands the
/// result and the page decorator to a rendering backend.
#[derive(Debug, Clone)]
pub struct CatalogDriver {
    config: CatalogConfig,
    variant: LayoutVariant,
    asset_root: Option<PathBuf>,
    pdf_options: PdfOptions,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogDriverBuilder {
    config: CatalogConfig,
    variant: LayoutVariant,
    asset_root: Option<PathBuf>,
    title: Option<String>,
}

impl CatalogDriverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn variant(mut self, variant: LayoutVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Directory that relative background paths are resolved against.
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn build(self) -> Result<CatalogDriver> {
        self.config.validate()?;
        Ok(CatalogDriver {
            config: self.config,
            variant: self.variant,
            asset_root: self.asset_root,
            pdf_options: PdfOptions {
                title: self.title,
                ..PdfOptions::default()
            },
        })
    }
}

impl CatalogDriver {
    pub fn builder() -> CatalogDriverBuilder {
        CatalogDriverBuilder::new()
    }

    pub fn variant(&self) -> LayoutVariant {
        self.variant
    }

    fn settings(&self) -> &VariantConfig {
        self.config.variant(self.variant)
    }

    /// Assembles the catalog without rendering it.
    pub fn compose(&self, records: &[ProductRecord], fetcher: &dyn ImageFetcher) -> Composition {
        let mut resolver = ImageResolver::new(fetcher);
        let assembler =
            BlockAssembler::new(self.settings(), self.config.default_backgrounds.len());
        let assembly = assembler.assemble(records, &mut resolver);
        Composition {
            assembly,
            images: resolver.into_store(),
        }
    }

    fn load_backgrounds(&self, images: &mut ImageStore) -> Result<()> {
        let files = match &self.asset_root {
            Some(root) => FileImageFetcher::with_root(root),
            None => FileImageFetcher::new(),
        };
        for background in &self.config.default_backgrounds {
            let data = files.fetch(background).ok_or_else(|| {
                CatalogError::asset(format!("default background '{background}' not found"))
            })?;
            images.insert_named(background.clone(), AssetKind::Background, data);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(variant = %self.variant, records = records.len()))]
    pub fn render<B: RenderBackend>(
        &self,
        records: &[ProductRecord],
        fetcher: &dyn ImageFetcher,
        backend: &mut B,
    ) -> Result<RenderSummary> {
        let started = Instant::now();
        tracing::info!("catalog run started");

        let Composition {
            assembly,
            mut images,
        } = self.compose(records, fetcher);
        self.load_backgrounds(&mut images)?;

        let settings = self.settings();
        let assembler = BlockAssembler::new(settings, self.config.default_backgrounds.len());
        let story = assembler.to_flowables(&assembly.elements);
        let setup = PageSetup {
            page_size: settings.page.size(),
            margins: settings.page.margins.to_margins(),
        };
        let decorator = PageDecorator::new(
            PageGeometry::for_variant(&self.config, self.variant),
            self.config.default_backgrounds.clone(),
        )
        .into_callback();

        let summary = backend.build(
            story,
            &setup,
            Some(decorator.clone()),
            Some(decorator),
            &images,
        )?;

        let report = &assembly.report;
        tracing::info!(
            accepted = report.accepted,
            excluded = report.excluded_count(),
            pages = summary.page_count,
            bytes = summary.byte_len,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "catalog run finished"
        );
        Ok(summary)
    }

    pub fn render_to_writer<W: Write>(
        &self,
        records: &[ProductRecord],
        fetcher: &dyn ImageFetcher,
        writer: W,
    ) -> Result<RenderSummary> {
        let mut backend = PdfBackend::with_options(writer, self.pdf_options.clone());
        self.render(records, fetcher, &mut backend)
    }

    pub fn render_to_buffer(
        &self,
        records: &[ProductRecord],
        fetcher: &dyn ImageFetcher,
    ) -> Result<(Vec<u8>, RenderSummary)> {
        let mut backend = PdfBackend::with_options(Vec::new(), self.pdf_options.clone());
        let summary = self.render(records, fetcher, &mut backend)?;
        Ok((backend.into_inner(), summary))
    }

    pub fn render_to_file(
        &self,
        records: &[ProductRecord],
        fetcher: &dyn ImageFetcher,
        path: impl AsRef<Path>,
    ) -> Result<RenderSummary> {
        let file = std::fs::File::create(path)?;
        self.render_to_writer(records, fetcher, std::io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::DocElement;
    use crate::eligibility::Exclusion;
    use crate::inspect::inspect_pdf_bytes;
    use crate::record::{ImageReference, ProductDetails};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(r: u8, g: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([r, g, 40]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    struct PngFetcher {
        calls: AtomicUsize,
    }

    impl ImageFetcher for PngFetcher {
        fn fetch(&self, url: &str) -> Option<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("not-an-image") {
                return Some(b"<html>soft 404</html>".to_vec());
            }
            let shade = url.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
            (!url.contains("404")).then(|| png(shade, 200))
        }
    }

    fn fetcher() -> PngFetcher {
        PngFetcher {
            calls: AtomicUsize::new(0),
        }
    }

    struct AssetDir(PathBuf);

    impl AssetDir {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "vitrine-driver-{tag}-{}",
                std::process::id()
            ));
            std::fs::create_dir_all(dir.join("default_images")).unwrap();
            for n in 1..=4 {
                std::fs::write(
                    dir.join(format!("default_images/IMAGEM{n}.png")),
                    png(n * 50, 80),
                )
                .unwrap();
            }
            Self(dir)
        }
    }

    impl Drop for AssetDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn records(count: usize, stock: f64) -> Vec<ProductRecord> {
        (0..count)
            .map(|i| ProductRecord {
                product: ProductDetails {
                    name: format!("produto {i}"),
                    color: "verde".to_string(),
                    height: "g".to_string(),
                    group_product: "mesa".to_string(),
                    cost: 10.0 + i as f64,
                    calibrated_quantity: stock,
                    general_quantity: stock,
                    ..Default::default()
                },
                images: vec![ImageReference {
                    url: Some(format!("https://img.example/{i}.png")),
                }],
            })
            .collect()
    }

    fn driver(variant: LayoutVariant, assets: &AssetDir) -> CatalogDriver {
        CatalogDriver::builder()
            .variant(variant)
            .asset_root(&assets.0)
            .build()
            .unwrap()
    }

    #[test]
    fn zero_eligible_records_render_the_reserved_pages() {
        let assets = AssetDir::new("empty");
        let fetcher = fetcher();
        let (bytes, summary) = driver(LayoutVariant::Standard, &assets)
            .render_to_buffer(&records(3, 10.0), &fetcher)
            .unwrap();
        assert_eq!(summary.page_count, 4);
        assert_eq!(inspect_pdf_bytes(&bytes).unwrap().page_count, 4);
        // Ineligible records never reach the fetcher.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn seven_standard_records_render_seven_pages() {
        let assets = AssetDir::new("standard");
        let (bytes, summary) = driver(LayoutVariant::Standard, &assets)
            .render_to_buffer(&records(7, 500.0), &fetcher())
            .unwrap();
        assert_eq!(summary.page_count, 7);
        assert_eq!(summary.metrics.pages_using("Later"), 6);
        assert_eq!(summary.metrics.image_draws(), 11);
        let report = inspect_pdf_bytes(&bytes).unwrap();
        assert_eq!(report.page_count, 7);
        assert_eq!(report.page_sizes[6], (595.28, 841.89));
        // Four backgrounds plus seven distinct product images.
        assert_eq!(report.image_count, 11);
    }

    #[test]
    fn six_standard_records_leave_no_blank_trailing_page() {
        let assets = AssetDir::new("six");
        let (_, summary) = driver(LayoutVariant::Standard, &assets)
            .render_to_buffer(&records(6, 500.0), &fetcher())
            .unwrap();
        assert_eq!(summary.page_count, 6);
    }

    #[test]
    fn large_format_partial_group_gets_its_own_page() {
        let assets = AssetDir::new("large");
        let (bytes, summary) = driver(LayoutVariant::LargeFormat, &assets)
            .render_to_buffer(&records(5, 500.0), &fetcher())
            .unwrap();
        assert_eq!(summary.page_count, 6);
        let report = inspect_pdf_bytes(&bytes).unwrap();
        assert!(report.page_sizes.iter().all(|size| *size == (4000.0, 2250.0)));
    }

    #[test]
    fn missing_background_is_fatal() {
        let dir = std::env::temp_dir().join(format!("vitrine-driver-nobg-{}", std::process::id()));
        let driver = CatalogDriver::builder().asset_root(&dir).build().unwrap();
        let err = driver
            .render_to_buffer(&records(1, 500.0), &fetcher())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Asset(_)));
    }

    #[test]
    fn non_image_payload_drops_only_its_record() {
        let assets = AssetDir::new("html");
        let driver = driver(LayoutVariant::Standard, &assets);
        let mut input = records(3, 500.0);
        input[1].images[0].url = Some("https://img.example/not-an-image".to_string());

        let composition = driver.compose(&input, &fetcher());
        assert_eq!(composition.assembly.report.accepted, 2);
        assert_eq!(
            composition.assembly.report.excluded,
            vec![(1, Exclusion::UndecodableImage)]
        );

        let (bytes, summary) = driver.render_to_buffer(&input, &fetcher()).unwrap();
        // Four reserved pages plus one page holding the two remaining blocks.
        assert_eq!(summary.page_count, 5);
        assert_eq!(inspect_pdf_bytes(&bytes).unwrap().image_count, 6);
    }

    #[test]
    fn compose_is_repeatable() {
        let driver = CatalogDriver::builder()
            .variant(LayoutVariant::LargeFormat)
            .build()
            .unwrap();
        let mut input = records(6, 500.0);
        input[1].images[0].url = Some("https://img.example/404.png".to_string());
        let first = driver.compose(&input, &fetcher());
        let second = driver.compose(&input, &fetcher());
        assert_eq!(first.assembly, second.assembly);
        assert_eq!(first.assembly.report.accepted, 5);
        assert!(matches!(
            first.assembly.elements.last(),
            Some(DocElement::Grid { complete: false, .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_at_build() {
        let mut config = CatalogConfig::default();
        config.default_backgrounds.clear();
        let err = CatalogDriver::builder().config(config).build().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfiguration(_)));
    }
}
