//! Listing acquisition for the classified-ads site.
//!
//! Two strategies produce the same normalized [`adbot_core::AdRecord`]s:
//! - [`api::ApiClient`] calls the bearer-authenticated search API, with tokens
//!   managed by [`token::TokenManager`].
//! - [`scrape::ScrapeClient`] fetches and parses public search-results pages.
//!
//! [`acquire::Acquirer`] selects between them and enforces the result cap.
//! Seller details can be looked up afterwards, by id through the API or from
//! a listing's detail page.
//! All outbound traffic goes through [`http::HttpClient`] and is paced by
//! [`pacing::Pacer`].

pub mod acquire;
pub mod annotate;
pub mod api;
pub mod error;
pub mod http;
pub mod normalize;
pub mod pacing;
pub mod retry;
pub mod scrape;
pub mod token;

pub use acquire::Acquirer;
pub use annotate::{annotate_ads, AnnotatedAd, OpenAiPromoGenerator, PromoGenerator};
pub use api::types::SellerProfile;
pub use api::ApiClient;
pub use error::{AcquireError, AnnotationError};
pub use http::{HttpClient, HttpSettings};
pub use pacing::Pacer;
pub use retry::RetryPolicy;
pub use scrape::ScrapeClient;
pub use token::{AccessToken, Credentials, TokenCache, TokenManager, TokenSession};
