//! Short link resolution
//!
//! Lookup, then visit append, then click increment. Only the lookup can
//! fail the request; the two bookkeeping steps are logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::visit_recorder::{RequestMeta, VisitRecorder};
use crate::errors::{CompactError, Result};
use crate::storage::{LinkStore, ShortLink, bounded};
use crate::utils::{is_valid_header, is_valid_short_code};

/// `/{code}` or `/{header}/{code}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAddress {
    pub header: Option<String>,
    pub code: String,
}

impl LinkAddress {
    /// Parse a request path (leading/trailing slashes ignored)
    pub fn parse(path: &str, max_header_length: usize) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();

        let (header, code) = match segments.as_slice() {
            [code] => (None, *code),
            [header, code] => (Some(*header), *code),
            _ => {
                return Err(CompactError::invalid_format(format!(
                    "Invalid short link path: /{}",
                    trimmed
                )));
            }
        };

        if !is_valid_short_code(code) {
            return Err(CompactError::invalid_format(format!(
                "Invalid short code: '{}'",
                code
            )));
        }
        if let Some(header) = header
            && !is_valid_header(header, max_header_length)
        {
            return Err(CompactError::invalid_format(format!(
                "Invalid header: '{}'",
                header
            )));
        }

        Ok(Self {
            header: header.map(String::from),
            code: code.to_string(),
        })
    }
}

pub struct ResolutionService {
    links: Arc<dyn LinkStore>,
    recorder: Arc<VisitRecorder>,
    timeout: Duration,
    max_header_length: usize,
}

impl ResolutionService {
    pub fn new(
        links: Arc<dyn LinkStore>,
        recorder: Arc<VisitRecorder>,
        timeout: Duration,
        max_header_length: usize,
    ) -> Self {
        Self {
            links,
            recorder,
            timeout,
            max_header_length,
        }
    }

    /// Resolve a raw request path
    pub async fn resolve_path(
        &self,
        path: &str,
        meta: &RequestMeta,
        request_id: &str,
    ) -> Result<ShortLink> {
        let address = LinkAddress::parse(path, self.max_header_length)?;
        self.resolve(&address, meta, request_id).await
    }

    pub async fn resolve(
        &self,
        address: &LinkAddress,
        meta: &RequestMeta,
        request_id: &str,
    ) -> Result<ShortLink> {
        let found = bounded(
            "link.find",
            self.timeout,
            self.links.find_link(&address.code, address.header.as_deref()),
        )
        .await?;

        let Some(link) = found else {
            debug!(
                "Short link not found: header={:?} code={}",
                address.header, address.code
            );
            return Err(CompactError::not_found("URL not found"));
        };

        if let Err(e) = self.recorder.record(link.id, meta).await {
            warn!(
                request_id,
                "Failed to record visit for link {}: {}", link.id, e
            );
        }

        if let Err(e) = bounded(
            "link.increment_click",
            self.timeout,
            self.links.increment_click(link.id),
        )
        .await
        {
            warn!(
                request_id,
                "Failed to increment click count for link {}: {}", link.id, e
            );
        }

        debug!("Resolved {} -> {}", link.path(), link.target);
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segment() {
        let address = LinkAddress::parse("/abc1234", 50).unwrap();
        assert_eq!(address.code, "abc1234");
        assert!(address.header.is_none());
    }

    #[test]
    fn test_parse_header_and_code() {
        let address = LinkAddress::parse("promo/abc1234", 50).unwrap();
        assert_eq!(address.header.as_deref(), Some("promo"));
        assert_eq!(address.code, "abc1234");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for path in ["", "/", "a/b/c", "a//b", "bad.code", "x/bad%20", "héllo"] {
            assert!(
                matches!(
                    LinkAddress::parse(path, 50),
                    Err(CompactError::InvalidFormat(_))
                ),
                "{:?} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_parse_enforces_header_length() {
        let path = format!("{}/abc", "h".repeat(51));
        assert!(LinkAddress::parse(&path, 50).is_err());
        let path = format!("{}/abc", "h".repeat(50));
        assert!(LinkAddress::parse(&path, 50).is_ok());
    }
}
