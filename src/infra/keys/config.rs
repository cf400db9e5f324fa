use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Secrets for the feed and email publishers.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "facebook_access_token": "EAAB...",
///   "gmail_username": "someone@gmail.com",
///   "gmail_app_password": "abcd efgh ijkl mnop"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    facebook_access_token: Option<String>,
    gmail_username: Option<String>,
    gmail_app_password: Option<String>,
}

impl Credentials {
    /// Loads the credentials from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials from '{path}'"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn facebook_access_token(&self) -> Result<&str> {
        self.facebook_access_token
            .as_deref()
            .ok_or_else(|| anyhow!("facebook_access_token missing from credentials"))
    }

    /// Returns the `(username, app password)` pair for SMTP login.
    pub fn gmail(&self) -> Result<(&str, &str)> {
        match (&self.gmail_username, &self.gmail_app_password) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => Err(anyhow!("gmail_username and gmail_app_password are required")),
        }
    }
}
