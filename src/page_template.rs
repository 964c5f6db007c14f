use crate::canvas::Canvas;
use crate::frame::Frame;
use crate::types::{Margins, Pt, Rect, Size};
use std::sync::Arc;

/// Inset between a frame's outer rectangle and the area flowables use.
const FRAME_PADDING: i32 = 6;

#[derive(Debug, Clone, Copy)]
pub struct FrameSpec {
    pub rect: Rect,
}

/// What the paginator knows about the page an `on_page` hook is painting.
#[derive(Debug, Clone, PartialEq)]
pub struct DocContext {
    /// 1-based physical page number.
    pub page_number: usize,
    pub template_name: String,
    pub page_size: Size,
}

impl DocContext {
    pub fn new(page_number: usize, template_name: impl Into<String>, page_size: Size) -> Self {
        Self {
            page_number,
            template_name: template_name.into(),
            page_size,
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.page_number == 1
    }
}

pub type OnPageCallback = Arc<dyn Fn(&mut Canvas, &DocContext) + Send + Sync>;

#[derive(Clone)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    frames: Vec<FrameSpec>,
    on_page: Option<OnPageCallback>,
}

impl std::fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTemplate")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .field("frames", &self.frames)
            .field("on_page", &self.on_page.is_some())
            .finish()
    }
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            frames: Vec::new(),
            on_page: None,
        }
    }

    pub fn with_frame(mut self, rect: Rect) -> Self {
        self.frames.push(FrameSpec { rect });
        self
    }

    /// Adds one frame covering the page inside `margins`, inset by the
    /// standard frame padding.
    pub fn with_margin_frame(self, margins: Margins) -> Self {
        let outer = margins.content_rect(self.page_size);
        let pad = Pt::from_i32(FRAME_PADDING);
        let rect = Rect {
            x: outer.x + pad,
            y: outer.y + pad,
            width: (outer.width - pad * 2).max(Pt::ZERO),
            height: (outer.height - pad * 2).max(Pt::ZERO),
        };
        self.with_frame(rect)
    }

    pub fn set_on_page<F>(self, callback: F) -> Self
    where
        F: Fn(&mut Canvas, &DocContext) + Send + Sync + 'static,
    {
        self.with_on_page(Arc::new(callback))
    }

    pub fn with_on_page(mut self, callback: OnPageCallback) -> Self {
        self.on_page = Some(callback);
        self
    }

    pub fn on_page(&self) -> Option<&OnPageCallback> {
        self.on_page.as_ref()
    }

    pub fn frame_specs(&self) -> &[FrameSpec] {
        &self.frames
    }

    pub fn instantiate_frames(&self) -> Vec<Frame> {
        self.frames
            .iter()
            .map(|spec| Frame::new(spec.rect))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_frame_is_inset_by_padding() {
        let template = PageTemplate::new("First", Size::a4()).with_margin_frame(Margins::all(72.0));
        let rect = template.frame_specs()[0].rect;
        assert_eq!(rect.x, Pt::from_i32(78));
        assert_eq!(rect.y, Pt::from_i32(78));
        assert_eq!(rect.width.to_milli(), 595_280 - 156_000);
        assert_eq!(rect.height.to_milli(), 841_890 - 156_000);
    }
}
