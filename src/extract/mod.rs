//! Email address extraction from page content

mod emails;

pub use emails::{find_emails, EMAIL_PATTERN};
