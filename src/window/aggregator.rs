//! Cross-group report aggregation.
//!
//! This module combines the per-group reports of one window into a single
//! document, asks the backend for a rollup and forwards it to the notifier.

use crate::backend::{complete_within, AnalysisBackend, PromptTemplate};
use crate::error::AggregateError;
use crate::models::{GlobalSummary, GroupReport};
use crate::notifier::Notifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Delimiter between group sections in the combined document.
pub const SECTION_DELIMITER: &str = "\n\n---\n\n";

/// Rolls a window's group reports into a [`GlobalSummary`].
pub struct GlobalAggregator {
    backend: Arc<dyn AnalysisBackend>,
    template: PromptTemplate,
    notifier: Option<Arc<dyn Notifier>>,
}

impl GlobalAggregator {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        template: PromptTemplate,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            backend,
            template,
            notifier,
        }
    }

    /// Summarize `reports` and notify on success.
    ///
    /// On failure nothing is sent; the individual reports are not forwarded
    /// as a fallback. Cancellation during the rollup call counts as a failure.
    pub async fn aggregate(
        &self,
        reports: &[GroupReport],
        cancel: &CancellationToken,
    ) -> Result<GlobalSummary, AggregateError> {
        if reports.is_empty() {
            return Err(AggregateError::NoReports);
        }

        debug!("Generating global summary from {} reports", reports.len());
        let combined = combine_reports(reports);

        let text = complete_within(self.backend.as_ref(), &self.template, &combined, cancel).await?;
        let summary = GlobalSummary { text };

        info!(
            "\n====== GLOBAL INTELLIGENCE SUMMARY ======\n{}\n=========================================",
            summary.text
        );

        if let Some(ref notifier) = self.notifier {
            // Delivery is best-effort; the summary is already recorded above.
            if let Err(e) = notifier.send(&summary.notification_text()).await {
                error!("Notifier send failed: {}", e);
            }
        }

        Ok(summary)
    }
}

/// Join reports into one document, one delimited section per group.
pub fn combine_reports(reports: &[GroupReport]) -> String {
    reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(SECTION_DELIMITER)
}
