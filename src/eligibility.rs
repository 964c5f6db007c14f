use crate::record::ProductRecord;

/// Either stock counter reaching this value makes a product eligible.
pub const MIN_STOCK_QUANTITY: f64 = 200.0;

/// Why a record was left out of the catalog. Exclusions never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclusion {
    BelowStockThreshold,
    MissingImageReference,
    ImageUnavailable,
    /// The payload is not a PNG or JPEG the PDF writer can embed.
    UndecodableImage,
}

impl Exclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusion::BelowStockThreshold => "below_stock_threshold",
            Exclusion::MissingImageReference => "missing_image_reference",
            Exclusion::ImageUnavailable => "image_unavailable",
            Exclusion::UndecodableImage => "undecodable_image",
        }
    }
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_eligible(record: &ProductRecord) -> bool {
    let product = &record.product;
    product.calibrated_quantity >= MIN_STOCK_QUANTITY
        || product.general_quantity >= MIN_STOCK_QUANTITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProductDetails;

    fn record(calibrated: f64, general: f64) -> ProductRecord {
        ProductRecord {
            product: ProductDetails {
                calibrated_quantity: calibrated,
                general_quantity: general,
                ..Default::default()
            },
            images: Vec::new(),
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_eligible(&record(200.0, 0.0)));
        assert!(is_eligible(&record(0.0, 200.0)));
        assert!(!is_eligible(&record(199.0, 199.0)));
        assert!(!is_eligible(&record(199.99, 0.0)));
    }

    #[test]
    fn either_counter_is_enough() {
        assert!(is_eligible(&record(1000.0, 0.0)));
        assert!(is_eligible(&record(0.0, 1000.0)));
        assert!(is_eligible(&record(300.0, 300.0)));
    }

    #[test]
    fn exclusion_names_are_stable() {
        assert_eq!(Exclusion::ImageUnavailable.to_string(), "image_unavailable");
        assert_eq!(Exclusion::UndecodableImage.to_string(), "undecodable_image");
    }
}
