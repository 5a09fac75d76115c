//! URL validation shared by source provisioning and feed parsing.

mod url_validator;

pub use url_validator::{resolve_link, validate_feed_url, UrlValidationError};
