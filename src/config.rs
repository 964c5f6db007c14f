use crate::error::{CatalogError, Result};
use crate::flowable::TextStyle;
use crate::types::{Color, Margins, Size};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutVariant {
    /// A4 list layout, three products per page.
    #[default]
    Standard,
    /// 4000x2250 poster layout, two by two products per page.
    LargeFormat,
}

impl LayoutVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutVariant::Standard => "standard",
            LayoutVariant::LargeFormat => "large-format",
        }
    }
}

impl std::fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayoutVariant {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" | "a4" => Ok(LayoutVariant::Standard),
            "large-format" | "large_format" | "large" => Ok(LayoutVariant::LargeFormat),
            other => Err(CatalogError::invalid_configuration(format!(
                "unknown layout variant '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarginConfig {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl MarginConfig {
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn to_margins(self) -> Margins {
        Margins::new(self.top, self.right, self.bottom, self.left)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageConfig {
    pub width: f32,
    pub height: f32,
    pub margins: MarginConfig,
}

impl PageConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Bar-overlay settings for content pages. Distances are measured from the
/// top edge of the page.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecorationGeometry {
    pub bar_height: f32,
    pub label_font_size: f32,
    pub label_baseline: f32,
    /// How far the bottom bar extends below the page edge.
    pub bottom_bar_drop: f32,
    pub bar_color: [f32; 3],
}

impl DecorationGeometry {
    pub fn bar_color(&self) -> Color {
        Color::rgb(self.bar_color[0], self.bar_color[1], self.bar_color[2])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridShape {
    pub columns: usize,
    pub rows: usize,
}

impl GridShape {
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_list(&self) -> bool {
        self.columns == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    Color,
    Size,
    Group,
    /// Printed from the record's cost, formatted as currency.
    Price,
    Material,
    Inches,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldSpec {
    pub label: String,
    pub field: CatalogField,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, field: CatalogField) -> Self {
        Self {
            label: label.into(),
            field,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyleSpec {
    pub font_size: f32,
    pub leading: f32,
    #[serde(default)]
    pub space_before: f32,
    #[serde(default)]
    pub space_after: f32,
}

impl TextStyleSpec {
    pub fn to_style(self) -> TextStyle {
        TextStyle::sized(self.font_size, self.leading)
            .with_spacing(self.space_before, self.space_after)
    }
}

/// Geometry of one product block and of the grid that holds blocks.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockTemplate {
    pub image_size: f32,
    /// Image column and text column widths.
    pub col_widths: Vec<f32>,
    pub text_left_padding: f32,
    /// Space below each block in list mode.
    #[serde(default)]
    pub block_spacing: f32,
    pub name_spacing: f32,
    pub field_spacing: f32,
    /// Grid mode only.
    #[serde(default)]
    pub grid_col_width: f32,
    #[serde(default)]
    pub grid_vertical_padding: f32,
    #[serde(default)]
    pub grid_left_padding: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariantConfig {
    pub page: PageConfig,
    pub decoration: DecorationGeometry,
    pub grid: GridShape,
    pub block: BlockTemplate,
    pub name_style: TextStyleSpec,
    pub field_style: TextStyleSpec,
    pub fields: Vec<FieldSpec>,
}

impl VariantConfig {
    pub fn standard() -> Self {
        let page = PageConfig {
            width: 595.28,
            height: 841.89,
            margins: MarginConfig::all(72.0),
        };
        Self {
            decoration: DecorationGeometry {
                bar_height: 68.0,
                label_font_size: 20.0,
                label_baseline: 42.0,
                bottom_bar_drop: 2.0,
                bar_color: [0.0, 0.47, 0.35],
            },
            page,
            grid: GridShape {
                columns: 1,
                rows: 3,
            },
            block: BlockTemplate {
                image_size: 200.0,
                col_widths: vec![170.0, 350.0],
                text_left_padding: 40.0,
                block_spacing: 20.0,
                name_spacing: 10.0,
                field_spacing: 10.0,
                grid_col_width: 0.0,
                grid_vertical_padding: 0.0,
                grid_left_padding: 0.0,
            },
            name_style: TextStyleSpec {
                font_size: 14.0,
                leading: 18.0,
                space_before: 12.0,
                space_after: 6.0,
            },
            field_style: TextStyleSpec {
                font_size: 10.0,
                leading: 12.0,
                space_before: 0.0,
                space_after: 0.0,
            },
            fields: vec![
                FieldSpec::new("Cor", CatalogField::Color),
                FieldSpec::new("Tamanho", CatalogField::Size),
                FieldSpec::new("Grupo", CatalogField::Group),
                FieldSpec::new("Preço", CatalogField::Price),
            ],
        }
    }

    pub fn large_format() -> Self {
        let page = PageConfig {
            width: 4000.0,
            height: 2250.0,
            margins: MarginConfig {
                top: 310.0,
                right: 50.0,
                bottom: 50.0,
                left: 0.0,
            },
        };
        Self {
            decoration: DecorationGeometry {
                bar_height: 180.0,
                label_font_size: 80.0,
                label_baseline: 120.0,
                bottom_bar_drop: 2.0,
                bar_color: [0.0, 0.47, 0.35],
            },
            page,
            grid: GridShape {
                columns: 2,
                rows: 2,
            },
            block: BlockTemplate {
                image_size: 800.0,
                col_widths: vec![750.0, 1500.0],
                text_left_padding: 20.0,
                block_spacing: 0.0,
                name_spacing: 80.0,
                field_spacing: 60.0,
                grid_col_width: 1950.0,
                grid_vertical_padding: 20.0,
                grid_left_padding: 20.0,
            },
            name_style: TextStyleSpec {
                font_size: 60.0,
                leading: 75.0,
                space_before: 12.0,
                space_after: 15.0,
            },
            field_style: TextStyleSpec {
                font_size: 50.0,
                leading: 14.0,
                space_before: 0.0,
                space_after: 0.0,
            },
            fields: vec![
                FieldSpec::new("Cor", CatalogField::Color),
                FieldSpec::new("Tamanho", CatalogField::Size),
                FieldSpec::new("Grupo", CatalogField::Group),
                FieldSpec::new("Preço", CatalogField::Price),
                FieldSpec::new("Material", CatalogField::Material),
                FieldSpec::new("Polegadas", CatalogField::Inches),
            ],
        }
    }

    fn validate(&self, variant: LayoutVariant) -> Result<()> {
        let invalid = |msg: String| {
            Err(CatalogError::invalid_configuration(format!("{variant}: {msg}")))
        };
        if !(self.page.width > 0.0 && self.page.height > 0.0) {
            return invalid(format!(
                "page size must be positive, got {}x{}",
                self.page.width, self.page.height
            ));
        }
        let m = self.page.margins;
        if [m.top, m.right, m.bottom, m.left].iter().any(|v| *v < 0.0)
            || m.left + m.right >= self.page.width
            || m.top + m.bottom >= self.page.height
        {
            return invalid("margins leave no content area".to_string());
        }
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return invalid(format!(
                "grid shape must be non-zero, got {}x{}",
                self.grid.columns, self.grid.rows
            ));
        }
        if self.block.col_widths.len() != 2 {
            return invalid(format!(
                "a block has an image column and a text column, got {} widths",
                self.block.col_widths.len()
            ));
        }
        if !self.grid.is_list() && self.block.grid_col_width <= 0.0 {
            return invalid("grid layouts need a positive grid_col_width".to_string());
        }
        if self.block.image_size <= 0.0 {
            return invalid("image_size must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Full-page artwork for the leading pages, one page per entry.
    pub default_backgrounds: Vec<String>,
    pub label_text: String,
    pub standard: VariantConfig,
    pub large_format: VariantConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_backgrounds: (1..=4)
                .map(|n| format!("default_images/IMAGEM{n}.png"))
                .collect(),
            label_text: "NOME DA EMPRESA".to_string(),
            standard: VariantConfig::standard(),
            large_format: VariantConfig::large_format(),
        }
    }
}

impl CatalogConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_backgrounds.is_empty() {
            return Err(CatalogError::invalid_configuration(
                "default_backgrounds must not be empty",
            ));
        }
        self.standard.validate(LayoutVariant::Standard)?;
        self.large_format.validate(LayoutVariant::LargeFormat)?;
        Ok(())
    }

    pub fn variant(&self, variant: LayoutVariant) -> &VariantConfig {
        match variant {
            LayoutVariant::Standard => &self.standard,
            LayoutVariant::LargeFormat => &self.large_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CatalogConfig::default();
        config.validate().unwrap();
        assert_eq!(config.default_backgrounds.len(), 4);
        assert_eq!(config.default_backgrounds[3], "default_images/IMAGEM4.png");
        assert_eq!(config.standard.grid.capacity(), 3);
        assert_eq!(config.large_format.grid.capacity(), 4);
        assert_eq!(config.large_format.fields.len(), 6);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CatalogConfig::from_json(r#"{"label_text": "LOJA"}"#).unwrap();
        assert_eq!(config.label_text, "LOJA");
        assert_eq!(config.standard, VariantConfig::standard());
    }

    #[test]
    fn rejects_empty_backgrounds() {
        let err = CatalogConfig::from_json(r#"{"default_backgrounds": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_zero_grid_and_bad_widths() {
        let mut config = CatalogConfig::default();
        config.large_format.grid.rows = 0;
        assert!(config.validate().is_err());

        let mut config = CatalogConfig::default();
        config.standard.block.col_widths = vec![520.0];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("standard"));

        let mut config = CatalogConfig::default();
        config.standard.page.height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn variant_names_parse() {
        assert_eq!("standard".parse::<LayoutVariant>().unwrap(), LayoutVariant::Standard);
        assert_eq!(
            "Large-Format".parse::<LayoutVariant>().unwrap(),
            LayoutVariant::LargeFormat
        );
        assert!("poster".parse::<LayoutVariant>().is_err());
        let json = serde_json::to_string(&LayoutVariant::LargeFormat).unwrap();
        assert_eq!(json, "\"large-format\"");
    }
}
