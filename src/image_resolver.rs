use crate::assets::{AssetKind, ImageStore};
use crate::eligibility::Exclusion;
use crate::flowable::ImageFlowable;
use crate::record::ProductRecord;
use crate::types::Size;
use std::path::PathBuf;

/// Source of image payloads. `None` means "not available"; callers treat it
/// as an exclusion rather than an error.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

impl<F: ImageFetcher + ?Sized> ImageFetcher for &F {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// True when `data` is a PNG or JPEG that decodes cleanly.
pub fn is_embeddable_image(data: &[u8]) -> bool {
    match image::guess_format(data) {
        Ok(format @ (image::ImageFormat::Png | image::ImageFormat::Jpeg)) => {
            image::load_from_memory_with_format(data, format).is_ok()
        }
        _ => false,
    }
}

/// Blocking HTTP fetcher. Only a 200 response yields a payload; there is no
/// retry and no cache.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpImageFetcher {
    pub fn new() -> crate::error::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url, error = %err, "image request failed");
                return None;
            }
        };
        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(url, status = %response.status(), "image not available");
            return None;
        }
        match response.bytes() {
            Ok(body) => Some(body.to_vec()),
            Err(err) => {
                tracing::warn!(url, error = %err, "image body could not be read");
                None
            }
        }
    }
}

/// Reads images from the local filesystem, optionally relative to a root.
#[derive(Debug, Clone, Default)]
pub struct FileImageFetcher {
    root: Option<PathBuf>,
}

impl FileImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve_path(&self, location: &str) -> PathBuf {
        let location = location.strip_prefix("file://").unwrap_or(location);
        match &self.root {
            Some(root) => root.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl ImageFetcher for FileImageFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.resolve_path(url);
        match std::fs::read(&path) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "image file not readable");
                None
            }
        }
    }
}

/// Maps a record's first image reference to a fixed-size image element and
/// keeps the fetched payloads for the renderer.
pub struct ImageResolver<'a> {
    fetcher: &'a dyn ImageFetcher,
    store: ImageStore,
    fetches: usize,
}

impl<'a> ImageResolver<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self::with_store(fetcher, ImageStore::new())
    }

    pub fn with_store(fetcher: &'a dyn ImageFetcher, store: ImageStore) -> Self {
        Self {
            fetcher,
            store,
            fetches: 0,
        }
    }

    pub fn resolve(
        &mut self,
        record: &ProductRecord,
        size: Size,
    ) -> Result<ImageFlowable, Exclusion> {
        let url = record
            .first_image_url()
            .ok_or(Exclusion::MissingImageReference)?;
        self.fetches += 1;
        let data = self
            .fetcher
            .fetch(url)
            .ok_or(Exclusion::ImageUnavailable)?;
        if !is_embeddable_image(&data) {
            tracing::debug!(url, bytes = data.len(), "image payload is not a decodable png or jpeg");
            return Err(Exclusion::UndecodableImage);
        }
        let resource_id =
            self.store
                .insert_content(AssetKind::ProductImage, data, Some(url.to_string()));
        Ok(ImageFlowable::new_pt(size.width, size.height, resource_id))
    }

    /// Number of fetch attempts made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn into_store(self) -> ImageStore {
        self.store
    }
}
