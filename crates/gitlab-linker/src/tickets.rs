//! Ticket key extraction from free text.
//!
//! Branch names, commit messages and merge request titles reference tracker
//! tickets as `QUEUE-123`. Matching is case-insensitive; keys are normalized to
//! upper case, deduplicated and returned in ascending order.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern for ticket keys inside free text.
///
/// ASCII classes only: Unicode case folding would also accept `ſ` or the
/// Kelvin sign, which do not uppercase to ASCII.
const TICKET_PATTERN: &str = r"[A-Za-z0-9]+-[0-9]+";

fn ticket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TICKET_PATTERN).expect("ticket pattern is a valid regex"))
}

/// A normalized tracker ticket key, e.g. `EXAMPLETASK-123`.
///
/// Always upper case and of the form `[A-Z0-9]+-[0-9]+`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketKey(String);

impl TicketKey {
    /// Parse and normalize a single ticket key.
    ///
    /// Returns `None` unless the whole input is one key.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let m = ticket_regex().find(raw)?;
        if m.start() != 0 || m.end() != raw.len() {
            return None;
        }
        Some(Self(raw.to_ascii_uppercase()))
    }

    /// Key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TicketKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid ticket key: {value:?}"))
    }
}

impl From<TicketKey> for String {
    fn from(key: TicketKey) -> Self {
        key.0
    }
}

/// Collect ticket key candidates referenced in the given text fields.
///
/// Every field is scanned independently for non-overlapping matches, left to
/// right. `branch-name-ticket-1-1` therefore yields only `TICKET-1`.
#[must_use]
pub fn extract_ticket_candidates<I, S>(fields: I) -> Vec<TicketKey>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates = BTreeSet::new();
    for field in fields {
        for m in ticket_regex().find_iter(field.as_ref()) {
            candidates.insert(TicketKey(m.as_str().to_ascii_uppercase()));
        }
    }
    candidates.into_iter().collect()
}
