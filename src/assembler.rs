use crate::config::{CatalogField, FieldSpec, VariantConfig};
use crate::eligibility::{Exclusion, is_eligible};
use crate::flowable::{
    Flowable, ImageFlowable, PageBreak, Paragraph, Spacer, TableCell, TableFlowable, TextAlign,
    TextRun, VerticalAlign,
};
use crate::image_resolver::ImageResolver;
use crate::record::ProductRecord;
use crate::types::{Pt, Size};

/// One labelled line of a block's text stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockField {
    pub label: String,
    pub value: String,
}

/// Image plus text stack for one accepted product.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBlock {
    pub image: ImageFlowable,
    pub name: String,
    pub fields: Vec<BlockField>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocElement {
    /// A single block laid out as a two-column row (list mode).
    Block(LayoutBlock),
    /// Blocks arranged in rows. `complete` is false for the trailing partial
    /// group of a run.
    Grid {
        rows: Vec<Vec<LayoutBlock>>,
        complete: bool,
    },
    Spacer(Pt),
    PageBreak,
}

impl DocElement {
    pub fn is_page_break(&self) -> bool {
        matches!(self, DocElement::PageBreak)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    pub considered: usize,
    pub accepted: usize,
    /// Input index and reason for every dropped record, in input order.
    pub excluded: Vec<(usize, Exclusion)>,
    pub reserved_breaks: usize,
    pub content_breaks: usize,
}

impl AssemblyReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn count(&self, reason: Exclusion) -> usize {
        self.excluded.iter().filter(|(_, r)| *r == reason).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub elements: Vec<DocElement>,
    pub report: AssemblyReport,
}

impl Assembly {
    pub fn page_break_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_page_break()).count()
    }
}

/// Groups accepted products into page-sized blocks. List mode (one column)
/// emits blocks directly; grid mode collects rows into full grids.
pub struct BlockAssembler<'a> {
    variant: &'a VariantConfig,
    reserved_pages: usize,
}

impl<'a> BlockAssembler<'a> {
    pub fn new(variant: &'a VariantConfig, reserved_pages: usize) -> Self {
        Self {
            variant,
            reserved_pages,
        }
    }

    fn image_size(&self) -> Size {
        let side = self.variant.block.image_size;
        Size::new(side, side)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn assemble(&self, records: &[ProductRecord], resolver: &mut ImageResolver<'_>) -> Assembly {
        let mut report = AssemblyReport {
            considered: records.len(),
            reserved_breaks: self.reserved_pages,
            ..Default::default()
        };
        let mut elements: Vec<DocElement> = (0..self.reserved_pages)
            .map(|_| DocElement::PageBreak)
            .collect();

        let grid = self.variant.grid;
        let mut on_page = 0usize;
        let mut row: Vec<LayoutBlock> = Vec::new();
        let mut rows: Vec<Vec<LayoutBlock>> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let image = if is_eligible(record) {
                resolver.resolve(record, self.image_size())
            } else {
                Err(Exclusion::BelowStockThreshold)
            };
            let image = match image {
                Ok(image) => image,
                Err(reason) => {
                    tracing::debug!(
                        index,
                        name = %record.product.name,
                        %reason,
                        "record excluded"
                    );
                    report.excluded.push((index, reason));
                    continue;
                }
            };
            let block = self.build_block(record, image);
            report.accepted += 1;

            if grid.is_list() {
                elements.push(DocElement::Block(block));
                let spacing = self.variant.block.block_spacing;
                if spacing > 0.0 {
                    elements.push(DocElement::Spacer(Pt::from_f32(spacing)));
                }
                on_page += 1;
                if on_page == grid.capacity() {
                    elements.push(DocElement::PageBreak);
                    report.content_breaks += 1;
                    on_page = 0;
                }
                continue;
            }

            row.push(block);
            if row.len() == grid.columns {
                rows.push(std::mem::take(&mut row));
            }
            if rows.len() == grid.rows {
                elements.push(DocElement::Grid {
                    rows: std::mem::take(&mut rows),
                    complete: true,
                });
                elements.push(DocElement::PageBreak);
                report.content_breaks += 1;
            }
        }

        if !row.is_empty() {
            rows.push(row);
        }
        if !rows.is_empty() {
            elements.push(DocElement::Grid {
                rows,
                complete: false,
            });
        }

        Assembly { elements, report }
    }

    pub fn build_block(&self, record: &ProductRecord, image: ImageFlowable) -> LayoutBlock {
        LayoutBlock {
            image,
            name: record.product.name.to_uppercase(),
            fields: self
                .variant
                .fields
                .iter()
                .map(|spec| BlockField {
                    label: spec.label.clone(),
                    value: field_value(record, spec),
                })
                .collect(),
        }
    }

    pub fn to_flowable(&self, element: &DocElement) -> Box<dyn Flowable> {
        match element {
            DocElement::Block(block) => Box::new(self.block_table(block)),
            DocElement::Grid { rows, complete } => Box::new(self.grid_table(rows, *complete)),
            DocElement::Spacer(height) => Box::new(Spacer::new_pt(*height)),
            DocElement::PageBreak => Box::new(PageBreak),
        }
    }

    pub fn to_flowables(&self, elements: &[DocElement]) -> Vec<Box<dyn Flowable>> {
        elements.iter().map(|e| self.to_flowable(e)).collect()
    }

    fn text_stack(&self, block: &LayoutBlock) -> Vec<Box<dyn Flowable>> {
        let layout = &self.variant.block;
        let field_style = self.variant.field_style.to_style();
        let mut stack: Vec<Box<dyn Flowable>> = Vec::with_capacity(block.fields.len() * 2 + 2);
        stack.push(Box::new(
            Paragraph::new(vec![TextRun::bold(block.name.clone())])
                .with_style(self.variant.name_style.to_style()),
        ));
        stack.push(Box::new(Spacer::new(layout.name_spacing)));
        for (idx, field) in block.fields.iter().enumerate() {
            if idx > 0 {
                stack.push(Box::new(Spacer::new(layout.field_spacing)));
            }
            stack.push(Box::new(
                Paragraph::new(vec![
                    TextRun::bold(format!("{}:", field.label)),
                    TextRun::plain(field.value.clone()),
                ])
                .with_style(field_style),
            ));
        }
        stack
    }

    fn block_table(&self, block: &LayoutBlock) -> TableFlowable {
        let layout = &self.variant.block;
        let image = TableCell::new(vec![Box::new(block.image.clone())])
            .with_valign(VerticalAlign::Middle);
        let text = TableCell::new(self.text_stack(block))
            .with_valign(VerticalAlign::Middle)
            .with_align(TextAlign::Left)
            .with_left_padding(layout.text_left_padding);
        TableFlowable::new(vec![vec![image, text]]).with_col_widths(&layout.col_widths)
    }

    fn grid_table(&self, rows: &[Vec<LayoutBlock>], complete: bool) -> TableFlowable {
        let layout = &self.variant.block;
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                (0..columns)
                    .map(|col| {
                        let mut cell = match row.get(col) {
                            Some(block) => TableCell::new(vec![Box::new(self.block_table(block))]),
                            None => TableCell::empty(),
                        }
                        .with_valign(VerticalAlign::Middle);
                        if complete {
                            cell = cell.with_vertical_padding(
                                layout.grid_vertical_padding,
                                layout.grid_vertical_padding,
                            );
                        }
                        // Only the first row's second cell gets the wider gap.
                        if row_idx == 0 && col == 1 {
                            cell = cell.with_left_padding(layout.grid_left_padding);
                        }
                        cell
                    })
                    .collect()
            })
            .collect();
        let widths = vec![layout.grid_col_width; columns];
        let table = TableFlowable::new(cells).with_col_widths(&widths);
        if complete {
            table
        } else {
            table.with_h_align(TextAlign::Left)
        }
    }
}

fn field_value(record: &ProductRecord, spec: &FieldSpec) -> String {
    let product = &record.product;
    match spec.field {
        CatalogField::Color => product.color.to_uppercase(),
        CatalogField::Size => product.height.to_uppercase(),
        CatalogField::Group => product.group_product.to_uppercase(),
        CatalogField::Price => format!("R$ {:.2}", product.cost),
        CatalogField::Material => product.material.as_deref().unwrap_or_default().to_uppercase(),
        CatalogField::Inches => product.inches.as_deref().unwrap_or_default().to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_resolver::ImageFetcher;
    use crate::record::{ImageReference, ProductDetails};

    /// Serves a small PNG for every URL except those containing "missing".
    struct StubFetcher;

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Option<Vec<u8>> {
            if url.contains("missing") {
                return None;
            }
            let shade = url.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
            let img = image::RgbImage::from_pixel(1, 1, image::Rgb([shade, 0, 0]));
            let mut out = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut out, image::ImageFormat::Png)
                .ok()?;
            Some(out.into_inner())
        }
    }

    fn product(name: &str, stock: f64, url: Option<&str>) -> ProductRecord {
        ProductRecord {
            product: ProductDetails {
                name: name.to_string(),
                color: "azul".to_string(),
                height: "m".to_string(),
                group_product: "vasos".to_string(),
                cost: 12.5,
                calibrated_quantity: stock,
                general_quantity: 0.0,
                material: Some("vidro".to_string()),
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

    fn eligible(count: usize) -> Vec<ProductRecord> {
        (0..count)
            .map(|i| product(&format!("p{i}"), 500.0, Some(&format!("https://img/{i}.png"))))
            .collect()
    }

    fn run(variant: &VariantConfig, records: &[ProductRecord]) -> Assembly {
        let fetcher = StubFetcher;
        let mut resolver = ImageResolver::new(&fetcher);
        BlockAssembler::new(variant, 4).assemble(records, &mut resolver)
    }

    fn block_names(elements: &[DocElement]) -> Vec<String> {
        let mut names = Vec::new();
        for element in elements {
            match element {
                DocElement::Block(block) => names.push(block.name.clone()),
                DocElement::Grid { rows, .. } => {
                    names.extend(rows.iter().flatten().map(|b| b.name.clone()))
                }
                _ => {}
            }
        }
        names
    }

    #[test]
    fn standard_breaks_every_three_blocks() {
        let assembly = run(&VariantConfig::standard(), &eligible(7));
        assert_eq!(assembly.page_break_count(), 6);
        assert_eq!(assembly.report.content_breaks, 2);
        assert_eq!(assembly.report.accepted, 7);
        assert!(assembly.elements[..4].iter().all(DocElement::is_page_break));
        // One leftover block followed by its spacer; no trailing break.
        assert!(matches!(assembly.elements.last(), Some(DocElement::Spacer(_))));
        assert!(matches!(
            assembly.elements[assembly.elements.len() - 2],
            DocElement::Block(_)
        ));
    }

    #[test]
    fn zero_eligible_records_only_reserve_pages() {
        let records = vec![product("low", 10.0, Some("https://img/low.png"))];
        let assembly = run(&VariantConfig::standard(), &records);
        assert_eq!(assembly.elements, vec![DocElement::PageBreak; 4]);
        assert_eq!(assembly.report.count(Exclusion::BelowStockThreshold), 1);
    }

    #[test]
    fn excluded_records_do_not_advance_the_counter() {
        let records = vec![
            product("a", 500.0, Some("https://img/a.png")),
            product("no-image", 500.0, None),
            product("b", 500.0, Some("https://img/b.png")),
            product("gone", 500.0, Some("https://img/missing.png")),
            product("low", 199.0, Some("https://img/low.png")),
            product("c", 500.0, Some("https://img/c.png")),
            product("d", 500.0, Some("https://img/d.png")),
        ];
        let assembly = run(&VariantConfig::standard(), &records);
        assert_eq!(block_names(&assembly.elements), vec!["A", "B", "C", "D"]);
        assert_eq!(assembly.report.content_breaks, 1);
        assert_eq!(
            assembly.report.excluded,
            vec![
                (1, Exclusion::MissingImageReference),
                (3, Exclusion::ImageUnavailable),
                (4, Exclusion::BelowStockThreshold),
            ]
        );
        // The break lands right after C's spacer, the third accepted block.
        let break_at = assembly.elements[4..]
            .iter()
            .position(DocElement::is_page_break)
            .unwrap();
        assert_eq!(block_names(&assembly.elements[4..4 + break_at]), vec!["A", "B", "C"]);
    }

    #[test]
    fn large_format_five_records_make_full_and_single_cell_grids() {
        let assembly = run(&VariantConfig::large_format(), &eligible(5));
        let tail = &assembly.elements[4..];
        assert_eq!(tail.len(), 3);
        match (&tail[0], &tail[1], &tail[2]) {
            (
                DocElement::Grid {
                    rows: full,
                    complete: true,
                },
                DocElement::PageBreak,
                DocElement::Grid {
                    rows: rest,
                    complete: false,
                },
            ) => {
                assert_eq!(full.len(), 2);
                assert!(full.iter().all(|row| row.len() == 2));
                assert_eq!(rest.len(), 1);
                assert_eq!(rest[0].len(), 1);
            }
            other => panic!("unexpected elements: {other:?}"),
        }
        assert_eq!(block_names(tail), vec!["P0", "P1", "P2", "P3", "P4"]);
    }

    #[test]
    fn large_format_partial_groups_keep_every_block() {
        for (count, shape) in [(1, vec![1]), (2, vec![2]), (3, vec![2, 1])] {
            let assembly = run(&VariantConfig::large_format(), &eligible(count));
            assert_eq!(assembly.page_break_count(), 4);
            match assembly.elements.last() {
                Some(DocElement::Grid {
                    rows,
                    complete: false,
                }) => {
                    assert_eq!(rows.iter().map(Vec::len).collect::<Vec<_>>(), shape);
                }
                other => panic!("unexpected last element: {other:?}"),
            }
        }
    }

    #[test]
    fn partial_grid_uses_longest_row_for_columns() {
        let variant = VariantConfig::large_format();
        let assembly = run(&variant, &eligible(3));
        let assembler = BlockAssembler::new(&variant, 4);
        let last = assembly.elements.last().unwrap();
        let DocElement::Grid { rows, complete } = last else {
            panic!("expected grid");
        };
        let table = assembler.grid_table(rows, *complete);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.col_widths(Pt::from_i32(3938)),
            vec![Pt::from_i32(1950), Pt::from_i32(1950)]
        );
    }

    #[test]
    fn block_text_follows_variant_fields() {
        let assembly = run(&VariantConfig::large_format(), &eligible(1));
        let DocElement::Grid { rows, .. } = assembly.elements.last().unwrap() else {
            panic!("expected grid");
        };
        let block = &rows[0][0];
        let values: Vec<(&str, &str)> = block
            .fields
            .iter()
            .map(|f| (f.label.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Cor", "AZUL"),
                ("Tamanho", "M"),
                ("Grupo", "VASOS"),
                ("Preço", "R$ 12.50"),
                ("Material", "VIDRO"),
                ("Polegadas", ""),
            ]
        );
        assert_eq!(block.image.width, Pt::from_i32(800));
    }

    #[test]
    fn assembly_is_deterministic() {
        let mut records = eligible(8);
        records.insert(2, product("x", 500.0, Some("https://img/missing.png")));
        let variant = VariantConfig::large_format();
        assert_eq!(run(&variant, &records), run(&variant, &records));
    }
}
