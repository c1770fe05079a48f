//! Video catalogue: categories, paged video lists and certificates.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    api::ApiService,
    error::{Result, VidzproError},
    types::{Certificate, Video},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateKind {
    Toolbox,
    IsoVideos,
}

impl CertificateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CertificateKind::Toolbox => "toolbox",
            CertificateKind::IsoVideos => "isovideos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CertificateKind::Toolbox => "Tool Box",
            CertificateKind::IsoVideos => "ISO 9001",
        }
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateKind {
    type Err = VidzproError;

    /// Category types map onto certificate kinds case-insensitively.
    fn from_str(category_type: &str) -> Result<Self> {
        match category_type.trim().to_lowercase().as_str() {
            "toolbox" => Ok(CertificateKind::Toolbox),
            "isovideos" => Ok(CertificateKind::IsoVideos),
            other => Err(VidzproError::validation(
                "category",
                format!("No certificate available for category \"{other}\""),
            )),
        }
    }
}

pub async fn generate_certificate<A: ApiService + ?Sized>(
    api: &A,
    category_type: &str,
) -> Result<Certificate> {
    let kind: CertificateKind = category_type.parse()?;
    api.generate_certificate(kind.as_str()).await
}

/// Name a downloaded certificate after the last path segment of its URL,
/// or `certificate_<kind>.pdf` when the URL has none.
pub fn certificate_file_name(file_url: &str, kind: CertificateKind) -> String {
    let url = file_url.split(['?', '#']).next().unwrap_or_default();
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let segment = after_scheme
        .split_once('/')
        .and_then(|(_, path)| path.rsplit('/').next());

    match segment {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_string(),
        _ => format!("certificate_{}.pdf", kind.as_str()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedCertificate {
    pub kind: CertificateKind,
    pub path: PathBuf,
    pub bytes: u64,
    pub message: String,
}

/// Generate the certificate for `category_type` and save the PDF into `dir`.
pub async fn download_certificate<A: ApiService + ?Sized>(
    api: &A,
    category_type: &str,
    dir: &Path,
) -> Result<SavedCertificate> {
    let kind: CertificateKind = category_type.parse()?;
    let certificate = generate_certificate(api, kind.as_str()).await?;
    let path = dir.join(certificate_file_name(&certificate.file_url, kind));

    let bytes = api.download(&certificate.file_url, &path).await?;
    info!(%kind, path = %path.display(), bytes, "certificate saved");

    Ok(SavedCertificate {
        kind,
        path,
        bytes,
        message: certificate.message,
    })
}

/// Page cursor over one category's videos.
#[derive(Debug)]
pub struct VideoPager<A: ?Sized> {
    api: Arc<A>,
    category: String,
    next_page: u32,
    last_page: Option<u32>,
}

impl<A: ApiService + ?Sized> VideoPager<A> {
    pub fn new(api: Arc<A>, category: impl Into<String>) -> Self {
        Self {
            api,
            category: category.into(),
            next_page: 1,
            last_page: None,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn has_more(&self) -> bool {
        self.last_page.is_none_or(|last| self.next_page <= last)
    }

    /// Fetch the next page, or `None` once the last page was returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Video>>> {
        if !self.has_more() {
            return Ok(None);
        }
        let page = self
            .api
            .videos_by_category(&self.category, self.next_page)
            .await?;
        debug!(
            category = %self.category,
            page = page.current_page,
            last_page = page.last_page,
            videos = page.data.len(),
            "fetched video page"
        );
        self.last_page = Some(page.last_page);
        self.next_page = page.current_page.max(self.next_page) + 1;
        Ok(Some(page.data))
    }

    /// Drain every remaining page.
    pub async fn collect_all(&mut self) -> Result<Vec<Video>> {
        let mut videos = Vec::new();
        while let Some(mut page) = self.next_page().await? {
            videos.append(&mut page);
        }
        Ok(videos)
    }
}
