mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::debug;

use crate::error::FetchError;
use crate::parser::{ColumnHint, IndexColumn, Table, parse_table};

/// Issues a GET for `url` and returns the body, failing on any non-2xx status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse()
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?,
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(resp.bytes().await?.to_vec())
}

/// Fetches a UTF-8 CSV resource and parses it into a [`Table`].
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_table<C: HttpClient>(
    client: &C,
    url: &str,
    index: &IndexColumn,
    hints: &[ColumnHint],
) -> Result<Table, FetchError> {
    debug!("Getting data");
    let bytes = fetch_bytes(client, url).await?;
    let body = String::from_utf8(bytes)?;
    let table = parse_table(body.as_bytes(), index, hints)?;
    debug!(rows = table.len(), "Table parsed");
    Ok(table)
}
