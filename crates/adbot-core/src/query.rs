use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Access mode chosen by the caller for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Api,
    Scrape,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Api => write!(f, "api"),
            Strategy::Scrape => write!(f, "scrape"),
        }
    }
}

impl FromStr for Strategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Strategy::Api),
            "scrape" => Ok(Strategy::Scrape),
            other => Err(CoreError::UnknownStrategy(other.to_owned())),
        }
    }
}

/// A validated keyword search.
///
/// `max_results` is a hard cap on returned records; `page_budget` bounds how
/// many result pages a strategy may request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    keywords: Vec<String>,
    max_results: usize,
    page_budget: usize,
}

impl SearchQuery {
    /// Builds a query, trimming keywords and dropping blank ones.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] if no non-blank keyword remains or
    /// if `max_results` or `page_budget` is zero.
    pub fn new<I, S>(keywords: I, max_results: usize, page_budget: usize) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(CoreError::InvalidQuery(
                "at least one keyword is required".to_owned(),
            ));
        }
        if max_results == 0 {
            return Err(CoreError::InvalidQuery(
                "max_results must be at least 1".to_owned(),
            ));
        }
        if page_budget == 0 {
            return Err(CoreError::InvalidQuery(
                "page_budget must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            keywords,
            max_results,
            page_budget,
        })
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    #[must_use]
    pub fn page_budget(&self) -> usize {
        self.page_budget
    }

    /// Returns a copy of this query with a different page budget.
    ///
    /// A budget of zero is raised to one.
    #[must_use]
    pub fn with_page_budget(&self, page_budget: usize) -> Self {
        Self {
            page_budget: page_budget.max(1),
            ..self.clone()
        }
    }

    /// Keywords joined with single spaces, as sent in the API `q` parameter.
    #[must_use]
    pub fn joined_keywords(&self) -> String {
        self.keywords.join(" ")
    }
}
