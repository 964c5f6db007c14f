use crate::canvas::{Canvas, Document};
use crate::error::{CatalogError, Result};
use crate::flowable::{BreakAfter, Flowable};
use crate::frame::{AddResult, Frame};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::{DocContext, PageTemplate};
use std::collections::VecDeque;
use std::time::Instant;

pub const META_PAGE_TEMPLATE_KEY: &str = "__vitrine_page_template";

pub struct DocTemplate {
    page_templates: Vec<PageTemplate>,
    story: Vec<Box<dyn Flowable>>,
}

impl std::fmt::Debug for DocTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocTemplate")
            .field("page_templates", &self.page_templates)
            .field("story_len", &self.story.len())
            .finish()
    }
}

fn select_template(page_templates: &[PageTemplate], page_number: usize) -> &PageTemplate {
    // page n -> templates[min(n-1, len-1)]; the last template repeats.
    let idx = page_number.saturating_sub(1).min(page_templates.len() - 1);
    &page_templates[idx]
}

/// Pagination cursor. A page is only begun (and its `on_page` hook run) once
/// something is placed on it, so a break at the very end of the story never
/// leaves a blank trailing page.
struct PageCursor<'a> {
    templates: &'a [PageTemplate],
    canvas: Canvas,
    page_number: usize,
    begun: bool,
    frames: Vec<Frame>,
    frame_index: usize,
    placed_on_page: bool,
    page_flowables: usize,
    page_start: Instant,
    metrics: DocumentMetrics,
}

impl<'a> PageCursor<'a> {
    fn new(templates: &'a [PageTemplate]) -> Self {
        let first = select_template(templates, 1);
        Self {
            templates,
            canvas: Canvas::new(first.page_size),
            page_number: 1,
            begun: false,
            frames: Vec::new(),
            frame_index: 0,
            placed_on_page: false,
            page_flowables: 0,
            page_start: Instant::now(),
            metrics: DocumentMetrics::default(),
        }
    }

    fn ensure_begun(&mut self) {
        if self.begun {
            return;
        }
        let templates = self.templates;
        let template = select_template(templates, self.page_number);
        self.frames = template.instantiate_frames();
        self.frame_index = 0;
        self.placed_on_page = false;
        self.page_flowables = 0;
        self.page_start = Instant::now();
        if let Some(callback) = template.on_page() {
            callback(
                &mut self.canvas,
                &DocContext::new(self.page_number, &template.name, template.page_size),
            );
        }
        self.canvas
            .meta(META_PAGE_TEMPLATE_KEY, template.name.clone());
        self.begun = true;
    }

    fn finish_page(&mut self, reason: &str) {
        self.ensure_begun();
        let elapsed = self.page_start.elapsed().as_secs_f64() * 1000.0;
        let template = select_template(self.templates, self.page_number);
        self.metrics.layout_ms += elapsed;
        self.metrics.pages.push(PageMetrics {
            page_number: self.page_number,
            template: template.name.clone(),
            flowable_count: self.page_flowables,
            command_count: self.canvas.current_command_count(),
            image_draws: self.canvas.current_image_count(),
            layout_ms: elapsed,
            content_bytes: 0,
        });
        tracing::debug!(
            page = self.page_number,
            flowables = self.page_flowables,
            reason,
            "page finished"
        );
        self.canvas.show_page();
        self.page_number += 1;
        self.begun = false;
    }
}

impl DocTemplate {
    pub fn new(page_templates: Vec<PageTemplate>) -> Self {
        Self {
            page_templates,
            story: Vec::new(),
        }
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    pub fn extend<I>(&mut self, flowables: I)
    where
        I: IntoIterator<Item = Box<dyn Flowable>>,
    {
        self.story.extend(flowables);
    }

    pub fn build(self) -> Result<Document> {
        Ok(self.build_with_metrics()?.0)
    }

    pub fn build_with_metrics(self) -> Result<(Document, DocumentMetrics)> {
        if self.page_templates.is_empty() {
            return Err(CatalogError::MissingPageTemplate);
        }

        let mut cursor = PageCursor::new(&self.page_templates);
        let mut story: VecDeque<Box<dyn Flowable>> = self.story.into_iter().collect();

        while let Some(flowable) = story.pop_front() {
            let mut current = flowable;
            loop {
                cursor.ensure_begun();
                let pagination = current.pagination();

                if cursor.frame_index >= cursor.frames.len() {
                    if cursor.frames.is_empty() {
                        return Err(CatalogError::MissingPageTemplate);
                    }
                    cursor.finish_page("frame_exhausted");
                    cursor.ensure_begun();
                }

                let is_last_frame = cursor.frame_index + 1 >= cursor.frames.len();
                let frame_index = cursor.frame_index;
                let result = cursor.frames[frame_index].add(current, &mut cursor.canvas);
                match result {
                    AddResult::Placed => {
                        cursor.placed_on_page = true;
                        cursor.page_flowables += 1;
                        if matches!(pagination.break_after, BreakAfter::Page) {
                            cursor.finish_page("break_after_page");
                        }
                        break;
                    }
                    AddResult::Split(remaining) => {
                        cursor.placed_on_page = true;
                        cursor.page_flowables += 1;
                        current = remaining;
                        cursor.frame_index += 1;
                    }
                    AddResult::Overflow(remaining) => {
                        if !cursor.placed_on_page && is_last_frame {
                            let rect = cursor.frames[frame_index].rect();
                            return Err(CatalogError::UnplaceableFlowable(format!(
                                "{} frame={}x{}pt",
                                remaining.debug_name(),
                                rect.width.to_f32(),
                                rect.height.to_f32(),
                            )));
                        }
                        current = remaining;
                        cursor.frame_index += 1;
                    }
                }
            }
        }

        if cursor.begun || cursor.metrics.pages.is_empty() {
            cursor.finish_page("end_of_story");
        }

        let metrics = cursor.metrics;
        Ok((cursor.canvas.finish_without_show(), metrics))
    }
}
