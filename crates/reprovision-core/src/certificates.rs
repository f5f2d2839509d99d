// ── Certificate collector ──

use crate::error::CoreError;
use crate::paginate::Paginator;
use crate::remote::CertificateSource;

pub const DEFAULT_CERTIFICATE_PAGE_LIMIT: u32 = 20;

/// Gathers every certificate ID behind a profile's `certificates` link.
pub struct CertificateCollector<'a, S> {
    source: &'a S,
    page_limit: u32,
}

impl<'a, S: CertificateSource> CertificateCollector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            page_limit: DEFAULT_CERTIFICATE_PAGE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// IDs in page order. Duplicates are kept as the portal reports them.
    pub async fn collect_ids(&self, related: &str) -> Result<Vec<String>, CoreError> {
        let certificates = Paginator::new(self.page_limit)
            .collect(|cursor| self.source.list_certificates(related, cursor))
            .await?;
        Ok(certificates.into_iter().map(|c| c.id).collect())
    }
}
