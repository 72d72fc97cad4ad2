//! Locating the queue page among discovered candidates.

use sha2::{Digest, Sha256};
use url::Url;

use crate::types::{HostError, HostFailure, PageId, PageRef};

/// The page being watched: a base URL plus the fragment that selects the
/// document-queue view inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPage {
    base: Url,
    fragment: String,
}

impl TargetPage {
    /// Authenticator front page of the legislative information system.
    pub const DEFAULT_BASE: &'static str = "https://infoleg-sileg.camara.leg.br/autenticador/";
    /// Fragment of the document-queue view inside the authenticator.
    pub const DEFAULT_FRAGMENT: &'static str = "filaDocumento";

    pub fn new(base: &str, fragment: &str) -> Result<Self, HostError> {
        let base = Url::parse(base)
            .map_err(|err| HostError::new(HostFailure::InvalidUrl, err.to_string()))?;
        Ok(Self {
            base,
            fragment: fragment.trim_start_matches('#').to_string(),
        })
    }

    /// The built-in authenticator target.
    pub fn sileg_default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_FRAGMENT)
            .expect("built-in target URL parses")
    }

    /// URL to request when probing; fragments are client-side only and are
    /// never sent to the server.
    pub fn request_url(&self) -> &Url {
        &self.base
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Full user-facing URL with the queue-view fragment.
    pub fn full_url(&self) -> String {
        format!("{}#{}", self.base, self.fragment)
    }

    /// Whether `url` lives under the monitored base, fragment or not.
    pub fn matches_base(&self, url: &str) -> bool {
        url.starts_with(self.base.as_str())
    }

    /// Candidate URL for a fetched page: the fragment is attached only when
    /// the served document actually renders the queue view.
    pub fn candidate_url(&self, final_url: &str, shows_queue_view: bool) -> String {
        if shows_queue_view {
            format!("{}#{}", final_url, self.fragment)
        } else {
            final_url.to_string()
        }
    }
}

/// Identity of a page, stable across polls of the same resolved URL.
///
/// Four hash bytes keep the id well inside the range JSON clients can
/// represent exactly, since it travels as the `tabId` number on the wire.
pub fn page_id(url: &str) -> PageId {
    let digest = Sha256::digest(url.as_bytes());
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&digest[..4]);
    u64::from(u32::from_be_bytes(prefix))
}

/// Picks the page to monitor among discovered candidates.
///
/// Only candidates under the target base qualify, and among those only one
/// whose URL carries the queue-view fragment is acceptable. A base page
/// sitting on the login view is deliberately not selected; the queue cannot
/// be read from it.
pub fn select_candidate<'a>(candidates: &'a [PageRef], target: &TargetPage) -> Option<&'a PageRef> {
    let marker = format!("#{}", target.fragment());
    candidates
        .iter()
        .filter(|candidate| target.matches_base(&candidate.url))
        .find(|candidate| candidate.url.contains(&marker))
}
