use crate::error::Result;
use std::path::Path;

/// One catalog input entry. Records are read once and never mutated.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProductRecord {
    pub product: ProductDetails,
    #[serde(default)]
    pub images: Vec<ImageReference>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProductDetails {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub color: String,
    /// Size label, printed as "Tamanho".
    pub height: String,
    #[serde(rename = "groupProduct")]
    pub group_product: String,
    #[serde(rename = "custo")]
    pub cost: f64,
    #[serde(rename = "quantidadeCalibrada")]
    pub calibrated_quantity: f64,
    #[serde(rename = "quantidadeGeral")]
    pub general_quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(rename = "polegadas", skip_serializing_if = "Option::is_none")]
    pub inches: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageReference {
    #[serde(default)]
    pub url: Option<String>,
}

impl ProductRecord {
    /// URL of the first image reference, if present and not blank.
    pub fn first_image_url(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|image| image.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

pub fn parse_records(json: &str) -> Result<Vec<ProductRecord>> {
    Ok(serde_json::from_str(json)?)
}

#[tracing::instrument(level = "debug")]
pub fn load_records(path: &Path) -> Result<Vec<ProductRecord>> {
    let data = std::fs::read_to_string(path)?;
    let records = parse_records(&data)?;
    tracing::debug!(count = records.len(), "records loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "product": {
                "name": "Vaso Ming",
                "price": 120.5,
                "description": "Ceramica",
                "color": "azul",
                "height": "m",
                "groupProduct": "decoracao",
                "custo": 80,
                "quantidadeCalibrada": 250,
                "quantidadeGeral": 10,
                "polegadas": "12"
            },
            "images": [{"url": "https://img.example/vaso.png"}, {"url": "https://img.example/2.png"}]
        },
        {
            "product": {"name": "Sem foto", "quantidadeCalibrada": 0, "quantidadeGeral": 500},
            "images": []
        },
        {
            "product": {"name": "Url nula"},
            "images": [{"url": null}, {"url": "https://img.example/ignored.png"}]
        }
    ]"#;

    #[test]
    fn parses_wire_shape() {
        let records = parse_records(SAMPLE).unwrap();
        assert_eq!(records.len(), 3);
        let first = &records[0].product;
        assert_eq!(first.group_product, "decoracao");
        assert_eq!(first.cost, 80.0);
        assert_eq!(first.calibrated_quantity, 250.0);
        assert_eq!(first.material, None);
        assert_eq!(first.inches.as_deref(), Some("12"));
        assert_eq!(records[1].product.general_quantity, 500.0);
        assert_eq!(records[1].product.color, "");
    }

    #[test]
    fn only_the_first_image_reference_counts() {
        let records = parse_records(SAMPLE).unwrap();
        assert_eq!(records[0].first_image_url(), Some("https://img.example/vaso.png"));
        assert_eq!(records[1].first_image_url(), None);
        assert_eq!(records[2].first_image_url(), None);

        let blank = ProductRecord {
            images: vec![ImageReference {
                url: Some("   ".to_string()),
            }],
            ..Default::default()
        };
        assert_eq!(blank.first_image_url(), None);
    }

    #[test]
    fn malformed_input_is_a_json_error() {
        let err = parse_records("{\"product\": 3}").unwrap_err();
        assert!(matches!(err, crate::error::CatalogError::Json(_)));
    }
}
