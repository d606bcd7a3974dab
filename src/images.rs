//! Best-effort acquisition of article thumbnail images.
//!
//! The results page exposes each thumbnail as a `srcset` attribute. The first
//! candidate URL is downloaded into the images directory under a name derived
//! from the URL itself. Any failure yields [`ImageFile::NoImage`]; nothing in
//! this module aborts article extraction.

use crate::error::ImageError;
use crate::models::ImageFile;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Pick the download URL out of a `srcset`-style attribute.
///
/// Takes the first comma-separated candidate, then its first whitespace
/// delimited token (dropping the width/density descriptor).
///
/// # Errors
///
/// [`ImageError::EmptyAttribute`] when there is no candidate at all and
/// [`ImageError::InvalidUrl`] when the candidate is not an absolute URL.
pub fn candidate_url(raw_attribute: &str) -> Result<Url, ImageError> {
    let first = raw_attribute
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .ok_or(ImageError::EmptyAttribute)?;
    Url::parse(first).map_err(|_| ImageError::InvalidUrl(first.to_string()))
}

/// Derive a local file name from an image URL.
///
/// The name is whatever follows the last `%` (the site nests the original
/// asset path percent-encoded inside the CDN URL), or the last path segment
/// when the URL carries no percent-encoding. Query and fragment remnants are
/// cut off and `.jpg` is appended when the name does not already end with it.
///
/// # Errors
///
/// [`ImageError::UnusableName`] when the result would be empty or would
/// escape the images directory.
pub fn derive_file_name(url: &str) -> Result<String, ImageError> {
    let tail = match url.rsplit_once('%') {
        Some((_, after)) => after,
        None => url.rsplit('/').next().unwrap_or_default(),
    };
    let name = tail
        .split(['?', '&', '#'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ImageError::UnusableName(url.to_string()));
    }

    if name.to_ascii_lowercase().ends_with(".jpg") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.jpg"))
    }
}

/// Downloads thumbnails into a fixed directory.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    client: Client,
    images_dir: PathBuf,
}

impl ImageResolver {
    /// Build a resolver writing into `images_dir`, with every request bounded
    /// by `timeout`.
    pub fn new(images_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            images_dir: images_dir.into(),
        })
    }

    /// Resolve a raw `srcset` attribute into a downloaded file.
    ///
    /// Returns [`ImageFile::NoImage`] on any failure, after logging it.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, raw_attribute: &str) -> ImageFile {
        match self.try_resolve(raw_attribute).await {
            Ok(path) => ImageFile::Downloaded(path),
            Err(e) => {
                warn!(error = %e, raw_attribute, "Image acquisition failed; using sentinel");
                ImageFile::NoImage
            }
        }
    }

    async fn try_resolve(&self, raw_attribute: &str) -> Result<PathBuf, ImageError> {
        let url = candidate_url(raw_attribute)?;
        let file_name = derive_file_name(url.as_str())?;
        let path = self.images_dir.join(file_name);
        self.download(&url, &path).await?;
        Ok(path)
    }

    /// Fetch `url` and write its body to `path`.
    ///
    /// A partially written file is removed before the error is returned.
    #[instrument(level = "info", skip_all, fields(%url, path = %path.display()))]
    async fn download(&self, url: &Url, path: &Path) -> Result<(), ImageError> {
        info!("Downloading image");
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Err(e) = fs::write(path, &bytes).await {
            let _ = fs::remove_file(path).await;
            return Err(e.into());
        }
        debug!(bytes = bytes.len(), "Wrote image");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn resolver(dir: &Path) -> ImageResolver {
        ImageResolver::new(dir, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_candidate_url_takes_first_token_of_first_candidate() {
        let url = candidate_url("https://img.example/a%2Fone.jpg 320w, https://img.example/b 640w")
            .unwrap();
        assert_eq!(url.as_str(), "https://img.example/a%2Fone.jpg");
    }

    #[test]
    fn test_candidate_url_rejects_garbage() {
        assert!(matches!(candidate_url(""), Err(ImageError::EmptyAttribute)));
        assert!(matches!(candidate_url(" , x"), Err(ImageError::EmptyAttribute)));
        assert!(matches!(
            candidate_url("not a url"),
            Err(ImageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_derive_file_name_after_last_percent() {
        assert_eq!(
            derive_file_name("https://img.example/x%2Fphoto").unwrap(),
            "2Fphoto.jpg"
        );
        assert_eq!(
            derive_file_name("https://cdn.example/?url=https%3A%2F%2Fs3%2F9a%2Fabc.jpg").unwrap(),
            "2Fabc.jpg"
        );
    }

    #[test]
    fn test_derive_file_name_without_percent_uses_last_segment() {
        assert_eq!(
            derive_file_name("https://img.example/images/cat.jpg?w=300").unwrap(),
            "cat.jpg"
        );
    }

    #[test]
    fn test_derive_file_name_rejects_empty() {
        assert!(matches!(
            derive_file_name("https://img.example/dir/"),
            Err(ImageError::UnusableName(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_downloads_into_images_dir() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex("photo$".to_string()))
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(b"\xff\xd8\xff fake jpeg")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let raw = format!("{}/x%2Fphoto, 2x", server.url());
        let image = resolver(dir.path()).resolve(&raw).await;

        mock.assert_async().await;
        let expected = dir.path().join("2Fphoto.jpg");
        assert_eq!(image, ImageFile::Downloaded(expected.clone()));
        assert!(image.to_string().ends_with(".jpg"));
        assert_eq!(std::fs::read(expected).unwrap(), b"\xff\xd8\xff fake jpeg");
    }

    #[tokio::test]
    async fn test_resolve_http_error_yields_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let raw = format!("{}/x%2Fphoto 1x", server.url());
        let image = resolver(dir.path()).resolve(&raw).await;

        assert_eq!(image, ImageFile::NoImage);
        assert!(!dir.path().join("2Fphoto.jpg").exists());
    }

    #[tokio::test]
    async fn test_resolve_network_failure_yields_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let image = resolver(dir.path())
            .resolve("http://127.0.0.1:1/x%2Fphoto, 2x")
            .await;

        assert_eq!(image, ImageFile::NoImage);
        assert!(!dir.path().join("2Fphoto.jpg").exists());
    }

    #[tokio::test]
    async fn test_resolve_write_failure_yields_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("jpeg")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let raw = format!("{}/x%2Fphoto", server.url());
        let image = resolver(&missing).resolve(&raw).await;

        assert_eq!(image, ImageFile::NoImage);
    }
}
