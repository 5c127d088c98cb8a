//! GitLab to issue tracker linker.
//!
//! This crate provides:
//! - Authorization of GitLab webhook deliveries (`X-Gitlab-Token`)
//! - Normalization of merge request and push hooks into linkable artifacts
//! - Ticket key extraction from branch names, commits and descriptions
//! - Tracker REST client for existence checks and remote link creation
//! - HTTP server for webhook handling (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Tracker and payload handling can fail

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod linker;
pub mod server;
pub mod tickets;
pub mod tracker;

pub use auth::{GitlabTokens, GITLAB_TOKEN_HEADER};
pub use config::Config;
pub use error::{LinkerError, TrackerError};
pub use events::{Artifact, GitEvent};
pub use linker::{LinkResult, Linker};
pub use tickets::{extract_ticket_candidates, TicketKey};
pub use tracker::{TrackerClient, TrackerGateway};
