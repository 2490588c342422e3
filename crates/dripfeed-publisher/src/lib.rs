//! `dripfeed-publisher`: outbound posting to the social platform.
//!
//! [`TwitterPublisher`] signs requests with OAuth 1.0a user context and
//! posts through the v1.1 endpoint, falling back to v2. [`DryRunPublisher`]
//! only logs, for running the whole pipeline without credentials.

pub mod dry_run;
pub mod error;
pub mod oauth;
pub mod publisher;
pub mod twitter;

pub use dry_run::DryRunPublisher;
pub use error::PublishError;
pub use oauth::Credentials;
pub use publisher::Publisher;
pub use twitter::TwitterPublisher;
