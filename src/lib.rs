//! Typed client for a storefront-scoped music catalog search API.
pub mod client;
pub mod config;
pub mod latest;
pub mod model;
pub mod request;
pub mod session;

pub use client::{CatalogClient, ClientError, ClientResult, HttpTransport, Transport};
pub use latest::{LatestResults, SearchTicket};
pub use model::{Artwork, MediaItem, MediaKind, SearchResultSet};
pub use session::Session;
