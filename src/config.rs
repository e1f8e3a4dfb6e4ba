use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let api_url = Url::parse(api_url.trim())
            .with_context(|| format!("invalid API url '{api_url}'"))?;

        match api_url.scheme() {
            "http" | "https" => {}
            other => bail!("unsupported API url scheme '{other}' (expected http or https)"),
        }
        if api_url.cannot_be_a_base() {
            bail!("API url '{api_url}' cannot be used as a base url");
        }
        if timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
