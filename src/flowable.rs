use crate::canvas::Canvas;
use crate::font::BaseFont;
use crate::types::{Color, Pt, Size};

fn huge_pt() -> Pt {
    Pt::from_i32(1_000_000)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakAfter {
    Auto,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub break_after: BreakAfter,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            break_after: BreakAfter::Auto,
        }
    }
}

pub trait Flowable: FlowableClone + Send + Sync {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, avail_height: Pt);

    fn intrinsic_width(&self) -> Option<Pt> {
        None
    }

    fn pagination(&self) -> Pagination {
        Pagination::default()
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

fn align_offset(align: TextAlign, avail: Pt, used: Pt) -> Pt {
    let slack = (avail - used).max(Pt::ZERO);
    match align {
        TextAlign::Left => Pt::ZERO,
        TextAlign::Center => slack / 2,
        TextAlign::Right => slack,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: Pt,
    pub leading: Pt,
    pub space_before: Pt,
    pub space_after: Pt,
    pub color: Color,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        let font_size = Pt::from_i32(10);
        Self {
            font_size,
            leading: font_size.mul_ratio(6, 5),
            space_before: Pt::ZERO,
            space_after: Pt::ZERO,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }
}

impl TextStyle {
    pub fn sized(font_size: f32, leading: f32) -> Self {
        Self {
            font_size: Pt::from_f32(font_size),
            leading: Pt::from_f32(leading),
            ..Self::default()
        }
    }

    pub fn with_spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = Pt::from_f32(before);
        self.space_after = Pt::from_f32(after);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Word {
    text: String,
    bold: bool,
}

#[derive(Debug, Clone)]
struct LineSegment {
    text: String,
    font: BaseFont,
    width: Pt,
}

#[derive(Debug, Clone)]
struct LineLayout {
    segments: Vec<LineSegment>,
    width: Pt,
    words: usize,
}

/// Word-wrapped text made of bold and plain runs.
#[derive(Debug, Clone)]
pub struct Paragraph {
    words: Vec<Word>,
    style: TextStyle,
    pagination: Pagination,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>) -> Self {
        let words = runs
            .into_iter()
            .flat_map(|run| {
                let bold = run.bold;
                run.text
                    .split_whitespace()
                    .map(|w| Word {
                        text: w.to_string(),
                        bold,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            words,
            style: TextStyle::default(),
            pagination: Pagination::default(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![TextRun::plain(text)])
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn word_width(&self, word: &Word) -> Pt {
        BaseFont::for_weight(word.bold).string_width(self.style.font_size, &word.text)
    }

    fn space_width(&self, bold: bool) -> Pt {
        BaseFont::for_weight(bold).string_width(self.style.font_size, " ")
    }

    fn layout_lines(&self, avail_width: Pt) -> Vec<LineLayout> {
        let mut lines = Vec::new();
        let mut current: Vec<&Word> = Vec::new();
        let mut width = Pt::ZERO;
        for word in &self.words {
            let word_width = self.word_width(word);
            let gap = if current.is_empty() {
                Pt::ZERO
            } else {
                self.space_width(word.bold)
            };
            if !current.is_empty() && width + gap + word_width > avail_width {
                lines.push(self.build_line(&current));
                current.clear();
                width = word_width;
            } else {
                width += gap + word_width;
            }
            current.push(word);
        }
        if !current.is_empty() {
            lines.push(self.build_line(&current));
        }
        lines
    }

    fn build_line(&self, words: &[&Word]) -> LineLayout {
        let mut segments: Vec<LineSegment> = Vec::new();
        for (idx, word) in words.iter().enumerate() {
            let font = BaseFont::for_weight(word.bold);
            match segments.last_mut() {
                Some(last) if last.font == font => {
                    last.text.push(' ');
                    last.text.push_str(&word.text);
                }
                _ => {
                    let text = if idx == 0 {
                        word.text.clone()
                    } else {
                        format!(" {}", word.text)
                    };
                    segments.push(LineSegment {
                        text,
                        font,
                        width: Pt::ZERO,
                    });
                }
            }
        }
        for segment in &mut segments {
            segment.width = segment
                .font
                .string_width(self.style.font_size, &segment.text);
        }
        let width = segments.iter().map(|s| s.width).sum();
        LineLayout {
            segments,
            width,
            words: words.len(),
        }
    }

    fn with_words(&self, words: Vec<Word>, style: TextStyle) -> Paragraph {
        Paragraph {
            words,
            style,
            pagination: self.pagination,
        }
    }
}

impl Flowable for Paragraph {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let lines = self.layout_lines(avail_width);
        Size {
            width: avail_width,
            height: self.style.space_before
                + self.style.leading * (lines.len() as i32)
                + self.style.space_after,
        }
    }

    fn intrinsic_width(&self) -> Option<Pt> {
        Some(self.layout_lines(huge_pt()).first().map_or(Pt::ZERO, |l| l.width))
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let lines = self.layout_lines(avail_width);
        if lines.len() < 2 || self.style.leading <= Pt::ZERO {
            return None;
        }
        let room = avail_height - self.style.space_before;
        let mut fit = 0usize;
        while fit < lines.len() && self.style.leading * ((fit + 1) as i32) <= room {
            fit += 1;
        }
        if fit == 0 || fit >= lines.len() {
            return None;
        }
        let head_words: usize = lines[..fit].iter().map(|l| l.words).sum();
        let mut head_style = self.style;
        head_style.space_after = Pt::ZERO;
        let mut tail_style = self.style;
        tail_style.space_before = Pt::ZERO;
        let head = self.with_words(self.words[..head_words].to_vec(), head_style);
        let tail = self.with_words(self.words[head_words..].to_vec(), tail_style);
        Some((Box::new(head), Box::new(tail)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        canvas.set_fill_color(self.style.color);
        let mut line_y = y + self.style.space_before;
        for line in self.layout_lines(avail_width) {
            let mut cursor_x = x + align_offset(self.style.align, avail_width, line.width);
            for segment in &line.segments {
                canvas.set_font(segment.font, self.style.font_size);
                canvas.draw_string(cursor_x, line_y, segment.text.clone());
                cursor_x += segment.width;
            }
            line_y += self.style.leading;
        }
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[derive(Debug, Clone)]
pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self::new_pt(Pt::from_f32(height))
    }

    pub fn new_pt(height: Pt) -> Self {
        Self { height }
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height.max(Pt::ZERO),
        }
    }

    fn intrinsic_width(&self) -> Option<Pt> {
        // A spacer contributes vertical rhythm, not horizontal demand.
        Some(Pt::ZERO)
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}
}

/// Ends the current page unconditionally, even when nothing but page
/// decoration has been drawn on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageBreak;

impl Flowable for PageBreak {
    fn wrap(&self, _avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: Pt::ZERO,
            height: Pt::ZERO,
        }
    }

    fn intrinsic_width(&self) -> Option<Pt> {
        Some(Pt::ZERO)
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt, _avail_height: Pt) {}

    fn pagination(&self) -> Pagination {
        Pagination {
            break_after: BreakAfter::Page,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFlowable {
    pub width: Pt,
    pub height: Pt,
    pub resource_id: String,
}

impl ImageFlowable {
    pub fn new(width: f32, height: f32, resource_id: impl Into<String>) -> Self {
        Self::new_pt(Pt::from_f32(width), Pt::from_f32(height), resource_id)
    }

    pub fn new_pt(width: Pt, height: Pt, resource_id: impl Into<String>) -> Self {
        Self {
            width,
            height,
            resource_id: resource_id.into(),
        }
    }
}

impl Flowable for ImageFlowable {
    fn wrap(&self, _avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    fn intrinsic_width(&self) -> Option<Pt> {
        Some(self.width)
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, _avail_width: Pt, _avail_height: Pt) {
        canvas.draw_image(x, y, self.width, self.height, self.resource_id.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Padding {
    /// Default cell padding: 6pt left/right, 3pt top/bottom.
    pub fn cell_default() -> Self {
        Self {
            top: Pt::from_i32(3),
            right: Pt::from_i32(6),
            bottom: Pt::from_i32(3),
            left: Pt::from_i32(6),
        }
    }

    fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    fn vertical(&self) -> Pt {
        self.top + self.bottom
    }
}

#[derive(Clone)]
pub struct TableCell {
    content: Vec<Box<dyn Flowable>>,
    padding: Padding,
    align: TextAlign,
    valign: VerticalAlign,
    background: Option<Color>,
}

impl TableCell {
    pub fn new(content: Vec<Box<dyn Flowable>>) -> Self {
        Self {
            content,
            padding: Padding::cell_default(),
            align: TextAlign::Left,
            valign: VerticalAlign::Top,
            background: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_left_padding(mut self, left: f32) -> Self {
        self.padding.left = Pt::from_f32(left);
        self
    }

    pub fn with_vertical_padding(mut self, top: f32, bottom: f32) -> Self {
        self.padding.top = Pt::from_f32(top);
        self.padding.bottom = Pt::from_f32(bottom);
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_valign(mut self, valign: VerticalAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    fn natural_width(&self) -> Pt {
        let content = self
            .content
            .iter()
            .filter_map(|f| f.intrinsic_width())
            .fold(Pt::ZERO, Pt::max);
        content + self.padding.horizontal()
    }

    fn content_height(&self, content_width: Pt) -> Pt {
        self.content
            .iter()
            .map(|f| f.wrap(content_width, huge_pt()).height)
            .sum()
    }

    fn height(&self, col_width: Pt) -> Pt {
        let content_width = (col_width - self.padding.horizontal()).max(Pt::ZERO);
        self.content_height(content_width) + self.padding.vertical()
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, width: Pt, height: Pt) {
        if let Some(color) = self.background {
            canvas.save_state();
            canvas.set_fill_color(color);
            canvas.fill_rect(x, y, width, height);
            canvas.restore_state();
        }
        let content_width = (width - self.padding.horizontal()).max(Pt::ZERO);
        let content_height = self.content_height(content_width);
        let inner_height = height - self.padding.vertical();
        let slack = (inner_height - content_height).max(Pt::ZERO);
        let offset = match self.valign {
            VerticalAlign::Top => Pt::ZERO,
            VerticalAlign::Middle => slack / 2,
            VerticalAlign::Bottom => slack,
        };
        let mut cursor_y = y + self.padding.top + offset;
        for flowable in &self.content {
            let size = flowable.wrap(content_width, huge_pt());
            let dx = align_offset(self.align, content_width, size.width);
            flowable.draw(
                canvas,
                x + self.padding.left + dx,
                cursor_y,
                content_width,
                size.height,
            );
            cursor_y += size.height;
        }
    }
}

impl std::fmt::Debug for TableCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCell")
            .field("content_len", &self.content.len())
            .field("padding", &self.padding)
            .field("align", &self.align)
            .field("valign", &self.valign)
            .field("background", &self.background)
            .finish()
    }
}

/// A grid of cells. Column widths are either fixed or derived from content;
/// rows split across pages, repeating the leading `repeat_rows` rows.
#[derive(Debug, Clone)]
pub struct TableFlowable {
    rows: Vec<Vec<TableCell>>,
    col_widths: Option<Vec<Pt>>,
    h_align: TextAlign,
    grid: Option<(Pt, Color)>,
    repeat_rows: usize,
}

impl TableFlowable {
    pub fn new(rows: Vec<Vec<TableCell>>) -> Self {
        Self {
            rows,
            col_widths: None,
            h_align: TextAlign::Center,
            grid: None,
            repeat_rows: 0,
        }
    }

    pub fn with_col_widths(mut self, widths: &[f32]) -> Self {
        self.col_widths = Some(widths.iter().map(|w| Pt::from_f32(*w)).collect());
        self
    }

    pub fn with_h_align(mut self, align: TextAlign) -> Self {
        self.h_align = align;
        self
    }

    pub fn with_grid(mut self, width: f32, color: Color) -> Self {
        self.grid = Some((Pt::from_f32(width), color));
        self
    }

    pub fn repeat_rows(mut self, count: usize) -> Self {
        self.repeat_rows = count;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn col_widths(&self, avail_width: Pt) -> Vec<Pt> {
        let columns = self.column_count();
        let mut widths: Vec<Pt> = (0..columns)
            .map(|col| {
                self.col_widths
                    .as_ref()
                    .and_then(|fixed| fixed.get(col).copied())
                    .unwrap_or_else(|| {
                        self.rows
                            .iter()
                            .filter_map(|row| row.get(col))
                            .map(TableCell::natural_width)
                            .fold(Pt::ZERO, Pt::max)
                    })
            })
            .collect();
        if self.col_widths.is_none() {
            let total: Pt = widths.iter().sum();
            if total > avail_width && total > Pt::ZERO {
                let scale = avail_width.to_f32() / total.to_f32();
                for width in &mut widths {
                    *width = *width * scale;
                }
            }
        }
        widths
    }

    fn row_heights(&self, col_widths: &[Pt]) -> Vec<Pt> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(col_widths)
                    .map(|(cell, width)| cell.height(*width))
                    .fold(Pt::ZERO, Pt::max)
            })
            .collect()
    }

    fn with_rows(&self, rows: Vec<Vec<TableCell>>) -> TableFlowable {
        TableFlowable {
            rows,
            col_widths: self.col_widths.clone(),
            h_align: self.h_align,
            grid: self.grid,
            repeat_rows: self.repeat_rows,
        }
    }
}

impl Flowable for TableFlowable {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let col_widths = self.col_widths(avail_width);
        Size {
            width: col_widths.iter().sum(),
            height: self.row_heights(&col_widths).iter().sum(),
        }
    }

    fn intrinsic_width(&self) -> Option<Pt> {
        Some(self.col_widths(huge_pt()).iter().sum())
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let col_widths = self.col_widths(avail_width);
        let heights = self.row_heights(&col_widths);
        let header = self.repeat_rows.min(self.rows.len());
        let mut used: Pt = heights[..header].iter().sum();
        let mut fit = header;
        while fit < heights.len() && used + heights[fit] <= avail_height {
            used += heights[fit];
            fit += 1;
        }
        if fit == header || fit >= self.rows.len() {
            return None;
        }
        let head = self.with_rows(self.rows[..fit].to_vec());
        let mut tail_rows = self.rows[..header].to_vec();
        tail_rows.extend_from_slice(&self.rows[fit..]);
        let tail = self.with_rows(tail_rows);
        Some((Box::new(head), Box::new(tail)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt, _avail_height: Pt) {
        let col_widths = self.col_widths(avail_width);
        let heights = self.row_heights(&col_widths);
        let table_width: Pt = col_widths.iter().sum();
        let origin_x = x + align_offset(self.h_align, avail_width, table_width);
        let mut cursor_y = y;
        for (row, row_height) in self.rows.iter().zip(&heights) {
            let mut cursor_x = origin_x;
            for (col, width) in col_widths.iter().enumerate() {
                if let Some(cell) = row.get(col) {
                    cell.draw(canvas, cursor_x, cursor_y, *width, *row_height);
                }
                if let Some((line_width, color)) = self.grid {
                    canvas.set_line_width(line_width);
                    canvas.set_stroke_color(color);
                    canvas.stroke_rect(cursor_x, cursor_y, *width, *row_height);
                }
                cursor_x += *width;
            }
            cursor_y += *row_height;
        }
    }
}
