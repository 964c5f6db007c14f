use crate::canvas::Canvas;
use crate::config::{CatalogConfig, DecorationGeometry, LayoutVariant};
use crate::font::BaseFont;
use crate::page_template::{DocContext, OnPageCallback};
use crate::types::{Color, Pt, Size};
use std::sync::Arc;

/// Everything the decorator needs to paint one page of a variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub page_size: Size,
    pub decoration: DecorationGeometry,
    pub label: String,
}

impl PageGeometry {
    pub fn for_variant(config: &CatalogConfig, variant: LayoutVariant) -> Self {
        let settings = config.variant(variant);
        Self {
            page_size: settings.page.size(),
            decoration: settings.decoration.clone(),
            label: config.label_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageDecoration {
    /// Full-page artwork, stretched to the page without keeping its aspect.
    Background {
        index: usize,
        resource_id: String,
        page_size: Size,
    },
    /// Solid top and bottom bars with a centered label in the top bar.
    BarOverlay {
        page_size: Size,
        bar_height: Pt,
        bar_color: Color,
        bottom_bar_drop: Pt,
        label: String,
        label_font_size: Pt,
        label_baseline: Pt,
    },
}

/// Page `n` (1-based) shows background `n - 1` while backgrounds remain,
/// then the bar overlay for every later page.
pub fn decoration_for_page(
    page_number: usize,
    geometry: &PageGeometry,
    backgrounds: &[String],
) -> PageDecoration {
    let index = page_number.saturating_sub(1);
    if let Some(resource_id) = backgrounds.get(index) {
        return PageDecoration::Background {
            index,
            resource_id: resource_id.clone(),
            page_size: geometry.page_size,
        };
    }
    let decoration = &geometry.decoration;
    PageDecoration::BarOverlay {
        page_size: geometry.page_size,
        bar_height: Pt::from_f32(decoration.bar_height),
        bar_color: decoration.bar_color(),
        bottom_bar_drop: Pt::from_f32(decoration.bottom_bar_drop),
        label: geometry.label.clone(),
        label_font_size: Pt::from_f32(decoration.label_font_size),
        label_baseline: Pt::from_f32(decoration.label_baseline),
    }
}

impl PageDecoration {
    pub fn paint(&self, canvas: &mut Canvas) {
        match self {
            PageDecoration::Background {
                resource_id,
                page_size,
                ..
            } => {
                canvas.draw_image(
                    Pt::ZERO,
                    Pt::ZERO,
                    page_size.width,
                    page_size.height,
                    resource_id.clone(),
                );
            }
            PageDecoration::BarOverlay {
                page_size,
                bar_height,
                bar_color,
                bottom_bar_drop,
                label,
                label_font_size,
                label_baseline,
            } => {
                canvas.save_state();
                canvas.set_fill_color(*bar_color);
                canvas.fill_rect(Pt::ZERO, Pt::ZERO, page_size.width, *bar_height);
                canvas.fill_rect(
                    Pt::ZERO,
                    page_size.height - *bar_height + *bottom_bar_drop,
                    page_size.width,
                    *bar_height,
                );
                canvas.set_fill_color(Color::WHITE);
                canvas.set_font(BaseFont::HelveticaBold, *label_font_size);
                canvas.draw_centred_string(page_size.width / 2, *label_baseline, label);
                canvas.restore_state();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageDecorator {
    geometry: PageGeometry,
    backgrounds: Vec<String>,
}

impl PageDecorator {
    pub fn new(geometry: PageGeometry, backgrounds: Vec<String>) -> Self {
        Self {
            geometry,
            backgrounds,
        }
    }

    pub fn decorate(&self, canvas: &mut Canvas, ctx: &DocContext) {
        let decoration = decoration_for_page(ctx.page_number, &self.geometry, &self.backgrounds);
        tracing::trace!(page = ctx.page_number, ?decoration, "decorating page");
        decoration.paint(canvas);
    }

    pub fn into_callback(self) -> OnPageCallback {
        Arc::new(move |canvas: &mut Canvas, ctx: &DocContext| self.decorate(canvas, ctx))
    }
}
