mod basic;
mod cache;
mod client;

pub use basic::BasicClient;
pub use cache::{Cache, Provenance};
pub use client::HttpClient;

use anyhow::{Result, bail};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        bail!("GET {} returned status {}", url, resp.status());
    }
    Ok(resp.bytes().await?.to_vec())
}
