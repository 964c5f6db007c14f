//! Product catalog layout: filters product records, resolves their images,
//! groups them into blocks or grids and paginates the result onto decorated
//! pages through a flowable engine with a streaming PDF writer.

mod assembler;
mod assets;
mod backend;
mod canvas;
mod config;
mod decorator;
mod doc_template;
mod driver;
mod eligibility;
mod error;
mod flowable;
mod font;
mod frame;
mod image_resolver;
mod inspect;
mod metrics;
mod page_template;
mod pdf;
mod record;
mod reports;
mod types;

pub use assembler::{
    Assembly, AssemblyReport, BlockAssembler, BlockField, DocElement, LayoutBlock,
};
pub use assets::{Asset, AssetKind, ImageStore, content_resource_id};
pub use backend::{PageSetup, PdfBackend, RenderBackend, RenderSummary, first_and_later_templates};
pub use canvas::{Canvas, Command, Document, Page};
pub use config::{
    BlockTemplate, CatalogConfig, CatalogField, DecorationGeometry, FieldSpec, GridShape,
    LayoutVariant, MarginConfig, PageConfig, TextStyleSpec, VariantConfig,
};
pub use decorator::{PageDecoration, PageDecorator, PageGeometry, decoration_for_page};
pub use doc_template::{DocTemplate, META_PAGE_TEMPLATE_KEY};
pub use driver::{CatalogDriver, CatalogDriverBuilder, Composition};
pub use eligibility::{Exclusion, MIN_STOCK_QUANTITY, is_eligible};
pub use error::{CatalogError, Result};
pub use flowable::{
    BreakAfter, Flowable, FlowableClone, ImageFlowable, Padding, PageBreak,
    Pagination, Paragraph, Spacer, TableCell, TableFlowable, TextAlign, TextRun, TextStyle,
    VerticalAlign,
};
pub use font::BaseFont;
pub use frame::{AddResult, Frame};
pub use image_resolver::{
    FileImageFetcher, HttpImageFetcher, ImageFetcher, ImageResolver, is_embeddable_image,
};
pub use inspect::{PdfInspectReport, inspect_pdf_bytes, inspect_pdf_path};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use page_template::{DocContext, FrameSpec, OnPageCallback, PageTemplate};
pub use pdf::{PdfOptions, document_to_pdf, document_to_pdf_with_metrics, document_to_writer};
pub use record::{ImageReference, ProductDetails, ProductRecord, load_records, parse_records};
pub use reports::{Report, price_list, product_sheets};
pub use types::{Color, Margins, Pt, Rect, Size};
