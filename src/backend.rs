use crate::assets::ImageStore;
use crate::doc_template::DocTemplate;
use crate::error::Result;
use crate::flowable::Flowable;
use crate::metrics::DocumentMetrics;
use crate::page_template::{OnPageCallback, PageTemplate};
use crate::pdf::{self, PdfOptions};
use crate::types::{Margins, Size};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub page_size: Size,
    pub margins: Margins,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub page_count: usize,
    pub byte_len: usize,
    pub metrics: DocumentMetrics,
}

/// Paginates a story and writes the finished document.
pub trait RenderBackend {
    fn build(
        &mut self,
        story: Vec<Box<dyn Flowable>>,
        setup: &PageSetup,
        on_first_page: Option<OnPageCallback>,
        on_later_pages: Option<OnPageCallback>,
        images: &ImageStore,
    ) -> Result<RenderSummary>;
}

/// Two-template layout: page 1 uses "First", every later page uses "Later".
/// Both share the same frame.
pub fn first_and_later_templates(
    setup: &PageSetup,
    on_first_page: Option<OnPageCallback>,
    on_later_pages: Option<OnPageCallback>,
) -> Vec<PageTemplate> {
    let template = |name: &str, callback: Option<OnPageCallback>| {
        let template = PageTemplate::new(name, setup.page_size).with_margin_frame(setup.margins);
        match callback {
            Some(callback) => template.with_on_page(callback),
            None => template,
        }
    };
    vec![
        template("First", on_first_page),
        template("Later", on_later_pages),
    ]
}

pub struct PdfBackend<W: Write> {
    writer: W,
    options: PdfOptions,
}

impl<W: Write> PdfBackend<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, PdfOptions::default())
    }

    pub fn with_options(writer: W, options: PdfOptions) -> Self {
        Self { writer, options }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderBackend for PdfBackend<W> {
    #[tracing::instrument(level = "debug", skip_all, fields(flowables = story.len()))]
    fn build(
        &mut self,
        story: Vec<Box<dyn Flowable>>,
        setup: &PageSetup,
        on_first_page: Option<OnPageCallback>,
        on_later_pages: Option<OnPageCallback>,
        images: &ImageStore,
    ) -> Result<RenderSummary> {
        let mut doc = DocTemplate::new(first_and_later_templates(
            setup,
            on_first_page,
            on_later_pages,
        ));
        doc.extend(story);
        let (document, mut metrics) = doc.build_with_metrics()?;
        let byte_len = pdf::document_to_writer(
            &document,
            images,
            Some(&mut metrics),
            &self.options,
            &mut self.writer,
        )?;
        Ok(RenderSummary {
            page_count: document.pages.len(),
            byte_len,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::page_template::DocContext;
    use crate::flowable::{PageBreak, Paragraph};
    use crate::inspect::inspect_pdf_bytes;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pdf_backend_writes_all_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback: OnPageCallback = Arc::new(move |_canvas: &mut Canvas, _ctx: &DocContext| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let story: Vec<Box<dyn Flowable>> = vec![
            Box::new(Paragraph::plain("one")),
            Box::new(PageBreak),
            Box::new(Paragraph::plain("two")),
        ];
        let setup = PageSetup {
            page_size: Size::a4(),
            margins: Margins::all(72.0),
        };
        let mut backend = PdfBackend::new(Vec::new());
        let summary = backend
            .build(
                story,
                &setup,
                Some(Arc::clone(&callback)),
                Some(callback),
                &ImageStore::new(),
            )
            .unwrap();
        assert_eq!(summary.page_count, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let bytes = backend.into_inner();
        assert_eq!(summary.byte_len, bytes.len());
        assert_eq!(inspect_pdf_bytes(&bytes).unwrap().page_count, 2);
    }

    #[test]
    fn templates_are_named_first_and_later() {
        let setup = PageSetup {
            page_size: Size::a4(),
            margins: Margins::all(72.0),
        };
        let templates = first_and_later_templates(&setup, None, None);
        let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Later"]);
        assert!(templates.iter().all(|t| t.on_page().is_none()));
    }
}
