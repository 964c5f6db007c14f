pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("no page template available")]
    MissingPageTemplate,

    #[error("flowable cannot fit on any page: {0}")]
    UnplaceableFlowable(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("cannot decode image '{resource_id}': {message}")]
    ImageDecode {
        resource_id: String,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pdf inspection failed: {0}")]
    Inspect(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CatalogError::asset("x")
                .to_string()
                .starts_with("asset error:")
        );
        assert!(
            CatalogError::invalid_configuration("x")
                .to_string()
                .starts_with("invalid configuration:")
        );
        assert_eq!(
            CatalogError::MissingPageTemplate.to_string(),
            "no page template available"
        );
    }

    #[test]
    fn io_preserves_source() {
        use std::error::Error as _;
        let err = CatalogError::from(std::io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
        assert!(err.source().is_some());
    }
}
