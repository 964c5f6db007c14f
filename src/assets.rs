use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Fetched per product record.
    ProductImage,
    /// Full-page artwork for the reserved leading pages.
    Background,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::ProductImage => "product_image",
            AssetKind::Background => "background",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub resource_id: String,
    pub kind: AssetKind,
    pub data: Vec<u8>,
    pub source: Option<String>,
}

impl Asset {
    pub fn bytes_len(&self) -> usize {
        self.data.len()
    }
}

/// Image payloads referenced by `DrawImage` commands, keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    assets: BTreeMap<String, Asset>,
}

/// Resource id derived from the payload so identical images share one
/// XObject and repeated runs produce identical ids.
pub fn content_resource_id(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("img-{hex}")
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `data` under its content id and returns that id.
    pub fn insert_content(
        &mut self,
        kind: AssetKind,
        data: Vec<u8>,
        source: Option<String>,
    ) -> String {
        let resource_id = content_resource_id(&data);
        self.assets
            .entry(resource_id.clone())
            .or_insert_with(|| Asset {
                resource_id: resource_id.clone(),
                kind,
                data,
                source,
            });
        resource_id
    }

    /// Registers `data` under a caller-chosen id, replacing any previous entry.
    pub fn insert_named(&mut self, resource_id: impl Into<String>, kind: AssetKind, data: Vec<u8>) {
        let resource_id = resource_id.into();
        self.assets.insert(
            resource_id.clone(),
            Asset {
                source: Some(resource_id.clone()),
                resource_id,
                kind,
                data,
            },
        );
    }

    pub fn get(&self, resource_id: &str) -> Option<&Asset> {
        self.assets.get(resource_id)
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.assets.contains_key(resource_id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn total_bytes(&self) -> usize {
        self.assets.values().map(Asset::bytes_len).sum()
    }
}
