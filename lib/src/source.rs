use crate::{error::Error, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(Error::from)
    })
}

/// Anything that can hand back the body behind a URL.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    user_agent: String,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String> {
        log::info!("GET {}", url);
        let resp = http_client()?
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text()?;
        log::debug!("{} bytes from {}", body.len(), url);
        Ok(body)
    }
}
