//! GitLab webhook payloads and their normalization into linkable artifacts.
//!
//! Only merge request and push hooks are understood. Both are reduced to a list
//! of [`Artifact`]s: one per merge request, one per pushed commit.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::LinkerError;

/// `object_kind` of merge request hooks.
pub const MERGE_REQUEST_KIND: &str = "merge_request";

/// `object_kind` of push hooks.
pub const PUSH_KIND: &str = "push";

// =============================================================================
// Payload types
// =============================================================================

/// Project section shared by all hooks.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// e.g. `alvassin/example`
    pub path_with_namespace: String,
}

/// Merge request hook (only the fields the linker reads).
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestHook {
    /// Project the merge request belongs to.
    pub project: Project,
    /// Merge request details.
    pub object_attributes: MergeRequestAttributes,
}

/// `object_attributes` of a merge request hook.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestAttributes {
    /// Web URL of the merge request.
    pub url: String,
    /// Source branch name.
    pub source_branch: String,
    /// Target branch name.
    pub target_branch: String,
    /// Merge request title.
    pub title: String,
    /// Merge request description.
    pub description: String,
    /// Head commit of the source branch.
    pub last_commit: LastCommit,
}

/// `last_commit` of a merge request hook.
#[derive(Debug, Clone, Deserialize)]
pub struct LastCommit {
    /// First line of the commit message.
    pub title: String,
    /// Full commit message.
    pub message: String,
}

/// Push hook (only the fields the linker reads).
#[derive(Debug, Clone, Deserialize)]
pub struct PushHook {
    /// Project pushed to.
    pub project: Project,
    /// Pushed commits, oldest first.
    pub commits: Vec<PushCommit>,
}

/// One commit of a push hook.
#[derive(Debug, Clone, Deserialize)]
pub struct PushCommit {
    /// Full commit message.
    pub message: String,
    /// First line of the commit message.
    pub title: String,
    /// Web URL of the commit.
    pub url: String,
}

// =============================================================================
// Normalized model
// =============================================================================

/// A single linkable git entity: a merge request or one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: String,
    text_fields: Vec<String>,
}

impl Artifact {
    /// Create an artifact. The path must not be empty.
    pub fn new(path: impl Into<String>, text_fields: Vec<String>) -> Result<Self, LinkerError> {
        let path = path.into();
        if path.is_empty() {
            return Err(LinkerError::MalformedEvent(
                "unable to derive artifact path".to_string(),
            ));
        }
        Ok(Self { path, text_fields })
    }

    /// URL path identifying the artifact, used as the remote link key.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Text fields scanned for ticket keys, in payload order.
    #[must_use]
    pub fn text_fields(&self) -> &[String] {
        &self.text_fields
    }
}

/// A recognized GitLab event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitEvent {
    /// Merge request opened, updated, merged, ...
    MergeRequest {
        /// The merge request itself.
        artifact: Artifact,
    },
    /// Commits pushed to a branch.
    PushCommits {
        /// One artifact per commit, in payload order.
        artifacts: Vec<Artifact>,
    },
}

impl GitEvent {
    /// Classify a decoded webhook body.
    ///
    /// Returns `Ok(None)` for event kinds the linker does not handle; those are
    /// acknowledged without doing anything.
    pub fn from_value(payload: Value) -> Result<Option<Self>, LinkerError> {
        if !payload.is_object() {
            return Err(LinkerError::MalformedEvent(
                "expected a JSON object".to_string(),
            ));
        }

        let kind = event_kind(&payload)
            .ok_or_else(|| LinkerError::MalformedEvent("missing event kind".to_string()))?
            .to_string();

        match kind.as_str() {
            MERGE_REQUEST_KIND => {
                let hook: MergeRequestHook = decode(payload)?;
                Ok(Some(Self::from_merge_request(hook)?))
            }
            PUSH_KIND => {
                let hook: PushHook = decode(payload)?;
                Ok(Some(Self::from_push(hook)?))
            }
            _ => Ok(None),
        }
    }

    /// Build a merge request event.
    pub fn from_merge_request(hook: MergeRequestHook) -> Result<Self, LinkerError> {
        let namespace = &hook.project.path_with_namespace;
        let attrs = hook.object_attributes;

        let path = artifact_path(&attrs.url, namespace).unwrap_or_default();
        let artifact = Artifact::new(
            path,
            vec![
                attrs.last_commit.title,
                attrs.last_commit.message,
                attrs.source_branch,
                attrs.target_branch,
                attrs.title,
                attrs.description,
            ],
        )?;

        Ok(Self::MergeRequest { artifact })
    }

    /// Build a push event.
    pub fn from_push(hook: PushHook) -> Result<Self, LinkerError> {
        let namespace = &hook.project.path_with_namespace;
        let artifacts = hook
            .commits
            .into_iter()
            .map(|commit| {
                let path = artifact_path(&commit.url, namespace).unwrap_or_default();
                Artifact::new(path, vec![commit.message, commit.title])
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::PushCommits { artifacts })
    }

    /// Event kind as sent by GitLab.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MergeRequest { .. } => MERGE_REQUEST_KIND,
            Self::PushCommits { .. } => PUSH_KIND,
        }
    }

    /// Consume the event, yielding its artifacts.
    #[must_use]
    pub fn into_artifacts(self) -> Vec<Artifact> {
        match self {
            Self::MergeRequest { artifact } => vec![artifact],
            Self::PushCommits { artifacts } => artifacts,
        }
    }
}

/// Event kind of a raw payload.
///
/// Every hook carries `object_kind`; merge request hooks also have `event_type`.
fn event_kind(payload: &Value) -> Option<&str> {
    payload
        .get("object_kind")
        .and_then(Value::as_str)
        .or_else(|| payload.get("event_type").and_then(Value::as_str))
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, LinkerError> {
    serde_json::from_value(payload).map_err(|e| LinkerError::MalformedEvent(e.to_string()))
}

/// Path of a GitLab web URL, starting at the project namespace.
///
/// `https://gitlab.net/alvassin/example/-/merge_requests/1` with namespace
/// `alvassin/example` gives `alvassin/example/-/merge_requests/1`. Returns
/// `None` when the namespace does not occur in the URL.
#[must_use]
pub fn artifact_path<'a>(url: &'a str, path_with_namespace: &str) -> Option<&'a str> {
    url.find(path_with_namespace).map(|index| &url[index..])
}
