//! Fetch outcomes: found ads versus an explicit empty result with a reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ads::AdRecord;

/// Classified reason a fetch operation stopped early or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Token exchange failed or produced an unusable token.
    Auth,
    /// Timeout, connection, or TLS failure.
    Transport,
    /// Non-2xx status after retries were exhausted.
    HttpStatus,
    /// 2xx response with an unexpected shape.
    MalformedResponse,
    /// The caller cancelled the operation.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Auth => "auth failure",
            FailureKind::Transport => "transport failure",
            FailureKind::HttpStatus => "http status failure",
            FailureKind::MalformedResponse => "malformed response",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "failure")]
pub enum EmptyReason {
    /// The source answered successfully but nothing matched.
    NoMatch,
    Failed(FailureKind),
}

/// Result of one acquisition.
///
/// `Found` always holds at least one record. When paging stopped because of a
/// failure after some records were collected, the failure is kept in
/// `interrupted` so partial results stay distinguishable from complete ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FetchResult {
    Found {
        ads: Vec<AdRecord>,
        interrupted: Option<FailureKind>,
    },
    Empty {
        reason: EmptyReason,
    },
}

impl FetchResult {
    /// Builds a result from whatever a strategy accumulated, truncating to
    /// `cap`.
    #[must_use]
    pub fn from_accumulated(
        mut ads: Vec<AdRecord>,
        failure: Option<FailureKind>,
        cap: usize,
    ) -> Self {
        ads.truncate(cap);
        if ads.is_empty() {
            let reason = failure.map_or(EmptyReason::NoMatch, EmptyReason::Failed);
            Self::Empty { reason }
        } else {
            Self::Found {
                ads,
                interrupted: failure,
            }
        }
    }

    #[must_use]
    pub fn failed(kind: FailureKind) -> Self {
        Self::Empty {
            reason: EmptyReason::Failed(kind),
        }
    }

    #[must_use]
    pub fn no_match() -> Self {
        Self::Empty {
            reason: EmptyReason::NoMatch,
        }
    }

    /// Enforces `cap` on an existing result.
    #[must_use]
    pub fn capped(self, cap: usize) -> Self {
        match self {
            Self::Found { ads, interrupted } => Self::from_accumulated(ads, interrupted, cap),
            empty @ Self::Empty { .. } => empty,
        }
    }

    #[must_use]
    pub fn ads(&self) -> &[AdRecord] {
        match self {
            Self::Found { ads, .. } => ads,
            Self::Empty { .. } => &[],
        }
    }

    #[must_use]
    pub fn into_ads(self) -> Vec<AdRecord> {
        match self {
            Self::Found { ads, .. } => ads,
            Self::Empty { .. } => Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ads().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// The failure that ended the fetch, whether or not records were found.
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Self::Found { interrupted, .. } => *interrupted,
            Self::Empty {
                reason: EmptyReason::Failed(kind),
            } => Some(*kind),
            Self::Empty {
                reason: EmptyReason::NoMatch,
            } => None,
        }
    }
}
