//! Page module: the boundary to the page session and the link pass run against it
//!
//! This module contains:
//! - The `PageSession` capability and its plain-HTTP implementation
//! - The text-substitution dictionary
//! - The single link normalization / classification / rewrite pass
//! - The retrying page extractor

mod extractor;
mod rewrite;
mod session;
mod substitute;

pub use extractor::{parse_sentinel, PageExtractor, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use rewrite::{
    resolve_link, rewrite_page, ExtractConfig, Extraction, LinkOutcome, EXTRACT_CONFIG_VERSION,
};
pub use session::{HttpSession, PageSession, PageSnapshot, SessionError};
pub use substitute::TextSubstitutions;
