/// Layout and output statistics for one physical page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub page_number: usize,
    pub template: String,
    pub flowable_count: usize,
    pub command_count: usize,
    pub image_draws: usize,
    pub layout_ms: f64,
    /// Uncompressed content stream size, filled in by the PDF writer.
    pub content_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub layout_ms: f64,
    pub total_bytes: usize,
}

impl DocumentMetrics {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn flowable_count(&self) -> usize {
        self.pages.iter().map(|p| p.flowable_count).sum()
    }

    pub fn image_draws(&self) -> usize {
        self.pages.iter().map(|p| p.image_draws).sum()
    }

    pub fn pages_using(&self, template: &str) -> usize {
        self.pages.iter().filter(|p| p.template == template).count()
    }

    /// Entry for a 1-based page number, created on demand.
    pub(crate) fn page_mut(&mut self, page_number: usize) -> &mut PageMetrics {
        let index = page_number.saturating_sub(1);
        if self.pages.len() <= index {
            let start = self.pages.len();
            self.pages.extend((start..=index).map(|i| PageMetrics {
                page_number: i + 1,
                ..PageMetrics::default()
            }));
        }
        &mut self.pages[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_mut_fills_gaps_with_numbered_entries() {
        let mut metrics = DocumentMetrics::default();
        metrics.page_mut(3).content_bytes = 10;
        assert_eq!(metrics.page_count(), 3);
        let numbers: Vec<usize> = metrics.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(metrics.pages[2].content_bytes, 10);
    }

    #[test]
    fn totals_sum_over_pages() {
        let mut metrics = DocumentMetrics::default();
        for (n, template) in [(1, "First"), (2, "Later"), (3, "Later")] {
            let page = metrics.page_mut(n);
            page.template = template.to_string();
            page.flowable_count = n;
            page.image_draws = 1;
        }
        assert_eq!(metrics.flowable_count(), 6);
        assert_eq!(metrics.image_draws(), 3);
        assert_eq!(metrics.pages_using("Later"), 2);
    }
}
