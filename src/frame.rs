use crate::canvas::Canvas;
use crate::flowable::Flowable;
use crate::types::{Pt, Rect};

pub enum AddResult {
    Placed,
    Split(Box<dyn Flowable>),
    Overflow(Box<dyn Flowable>),
}

impl std::fmt::Debug for AddResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddResult::Placed => f.write_str("Placed"),
            AddResult::Split(rest) => write!(f, "Split({})", rest.debug_name()),
            AddResult::Overflow(rest) => write!(f, "Overflow({})", rest.debug_name()),
        }
    }
}

#[derive(Debug)]
pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    fn place(&mut self, flowable: &dyn Flowable, canvas: &mut Canvas, height: Pt) {
        let avail_height = self.remaining_height();
        flowable.draw(
            canvas,
            self.rect.x,
            self.rect.y + self.cursor_y,
            self.rect.width,
            avail_height,
        );
        self.cursor_y = (self.cursor_y + height).min(self.rect.height);
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        let size = flowable.wrap(avail_width, avail_height);

        // Zero-height flowables (breaks, empty spacers) always fit.
        if size.height <= avail_height {
            self.place(flowable.as_ref(), canvas, size.height);
            return AddResult::Placed;
        }

        if avail_height > Pt::ZERO {
            if let Some((first, second)) = flowable.split(avail_width, avail_height) {
                let first_size = first.wrap(avail_width, avail_height);
                if first_size.height > Pt::ZERO && first_size.height <= avail_height {
                    self.place(first.as_ref(), canvas, first_size.height);
                    return AddResult::Split(second);
                }
            }
        }

        // A flowable taller than a whole frame that cannot split is placed on
        // an empty frame anyway so pagination keeps moving forward.
        if self.is_empty() {
            self.place(flowable.as_ref(), canvas, self.rect.height);
            return AddResult::Placed;
        }

        AddResult::Overflow(flowable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowable::{PageBreak, Spacer};
    use crate::types::Size;

    fn frame(height: i32) -> Frame {
        Frame::new(Rect {
            x: Pt::ZERO,
            y: Pt::ZERO,
            width: Pt::from_i32(100),
            height: Pt::from_i32(height),
        })
    }

    #[test]
    fn overflow_when_not_empty_and_too_tall() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(50);
        assert!(matches!(
            frame.add(Box::new(Spacer::new(30.0)), &mut canvas),
            AddResult::Placed
        ));
        assert!(matches!(
            frame.add(Box::new(Spacer::new(30.0)), &mut canvas),
            AddResult::Overflow(_)
        ));
    }

    #[test]
    fn zero_height_fits_a_full_frame() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(50);
        frame.add(Box::new(Spacer::new(50.0)), &mut canvas);
        assert_eq!(frame.remaining_height(), Pt::ZERO);
        assert!(matches!(
            frame.add(Box::new(PageBreak), &mut canvas),
            AddResult::Placed
        ));
    }

    #[test]
    fn oversized_flowable_is_forced_onto_empty_frame() {
        let mut canvas = Canvas::new(Size::a4());
        let mut frame = frame(50);
        assert!(matches!(
            frame.add(Box::new(Spacer::new(80.0)), &mut canvas),
            AddResult::Placed
        ));
        assert_eq!(frame.remaining_height(), Pt::ZERO);
    }
}
