//! Traits for the outbound collaborators that receive the daily summary.

use anyhow::Result;

/// Posts a message to a group feed.
#[async_trait::async_trait]
pub trait FeedPublisher {
    /// Posts `message` with an attached `link` to `group`, returning the
    /// provider's post id.
    async fn post(&self, group: &str, message: &str, link: &str) -> Result<String>;
}

/// Sends a plain-text email.
pub trait Mailer {
    fn send(&self, subject: &str, body: &str) -> Result<()>;
}
