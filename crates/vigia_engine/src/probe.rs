//! One full check of the monitored queue.

use std::sync::Arc;

use vigia_logging::vigia_warn;

use crate::extract::QueueExtractor;
use crate::fetch::QueueHost;
use crate::locate::{select_candidate, TargetPage};
use crate::types::{ProbeReport, QueueSnapshot};

/// Runs one probe: discover candidates, pick the queue page, reload it and
/// count pending documents.
///
/// Probes never fail. Discovery trouble or a missing candidate reports the
/// page as absent; a reload that fails while a candidate exists reports the
/// page as present with an empty queue, since an unreadable queue must not
/// raise "page unavailable" alerts.
pub async fn run_probe(
    host: &dyn QueueHost,
    extractor: &dyn QueueExtractor,
    target: &TargetPage,
) -> ProbeReport {
    let candidates = match host.discover().await {
        Ok(candidates) => candidates,
        Err(err) => {
            vigia_warn!("Queue page discovery failed: {}", err);
            return ProbeReport::absent();
        }
    };

    let Some(page) = select_candidate(&candidates, target) else {
        vigia_warn!("No open page shows {}", target.full_url());
        return ProbeReport::absent();
    };
    let page = page.clone();

    let snapshot = match host.reload(&page).await {
        Ok(html) => extractor.extract(&html),
        Err(err) => {
            vigia_warn!("Reload of {} failed: {}", page.url, err);
            QueueSnapshot::empty()
        }
    };

    ProbeReport {
        page: Some(page),
        snapshot,
    }
}

/// Everything needed to run probes, bundled for sharing across tasks.
pub struct ProbeContext {
    host: Arc<dyn QueueHost>,
    extractor: Arc<dyn QueueExtractor>,
    target: TargetPage,
}

impl ProbeContext {
    pub fn new(
        host: Arc<dyn QueueHost>,
        extractor: Arc<dyn QueueExtractor>,
        target: TargetPage,
    ) -> Self {
        Self {
            host,
            extractor,
            target,
        }
    }

    pub async fn run(&self) -> ProbeReport {
        run_probe(self.host.as_ref(), self.extractor.as_ref(), &self.target).await
    }

    /// Snapshot for on-demand queries. Same degradation rules as a probe,
    /// but the caller only sees the queue contents.
    pub async fn live_snapshot(&self) -> QueueSnapshot {
        self.run().await.snapshot
    }
}
