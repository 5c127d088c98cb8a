//! Ticket resolution and linking pipeline.
//!
//! For every artifact: extract ticket candidates, check which exist in the
//! tracker, then link the existing ones. Both tracker phases fan out
//! concurrently and wait for the whole batch. Tracker failures only drop the
//! affected ticket from the result.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::events::Artifact;
use crate::tickets::{extract_ticket_candidates, TicketKey};
use crate::tracker::TrackerGateway;

/// A ticket that was linked to a GitLab artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    /// Tracker issue key.
    pub issue: TicketKey,
    /// Artifact path the issue now links to.
    pub path: String,
}

/// Drives candidate extraction, existence checks and link creation.
#[derive(Clone)]
pub struct Linker {
    tracker: Arc<dyn TrackerGateway>,
}

impl Linker {
    /// Create a linker on top of a tracker gateway.
    #[must_use]
    pub fn new(tracker: Arc<dyn TrackerGateway>) -> Self {
        Self { tracker }
    }

    /// Link all artifacts and return the successful links.
    ///
    /// Results keep artifact order, and ticket order within an artifact.
    pub async fn process(&self, artifacts: &[Artifact]) -> Vec<LinkResult> {
        join_all(artifacts.iter().map(|artifact| self.process_artifact(artifact)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Link a single artifact.
    pub async fn process_artifact(&self, artifact: &Artifact) -> Vec<LinkResult> {
        let path = artifact.path();
        let candidates = extract_ticket_candidates(artifact.text_fields());
        debug!(path = %path, candidates = ?candidates, "Extracted ticket candidates");

        if candidates.is_empty() {
            info!(path = %path, "No ticket candidates found");
            return Vec::new();
        }

        let existing = self.existing_tickets(candidates).await;
        if existing.is_empty() {
            info!(path = %path, "No existing tickets to link");
            return Vec::new();
        }

        info!(path = %path, tickets = ?existing, "Linking tickets");
        self.link_tickets(existing, path).await
    }

    /// Keep candidates the tracker confirms. Failed checks count as missing.
    async fn existing_tickets(&self, candidates: Vec<TicketKey>) -> Vec<TicketKey> {
        let checks = join_all(candidates.iter().map(|key| self.tracker.issue_exists(key))).await;

        candidates
            .into_iter()
            .zip(checks)
            .filter_map(|(key, exists)| match exists {
                Ok(true) => Some(key),
                Ok(false) => {
                    debug!(issue = %key, "Ticket does not exist");
                    None
                }
                Err(e) => {
                    warn!(issue = %key, error = %e, "Failed to check ticket existence");
                    None
                }
            })
            .collect()
    }

    /// Create remote links. Failed links are left out, never retried.
    async fn link_tickets(&self, tickets: Vec<TicketKey>, path: &str) -> Vec<LinkResult> {
        let links = join_all(tickets.iter().map(|key| self.tracker.link_issue(key, path))).await;

        tickets
            .into_iter()
            .zip(links)
            .filter_map(|(issue, linked)| match linked {
                Ok(()) => Some(LinkResult {
                    issue,
                    path: path.to_string(),
                }),
                Err(e) => {
                    warn!(issue = %issue, path = %path, error = %e, "Failed to link ticket");
                    None
                }
            })
            .collect()
    }
}
