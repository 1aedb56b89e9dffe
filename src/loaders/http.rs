//! Remote JSON loader, for datasets published next to the web app

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::DatasetError;
use crate::loaders::DatasetSource;
use crate::models::Dataset;

const USER_AGENT: &str = concat!("ransomwatch/", env!("CARGO_PKG_VERSION"));

/// Fetches the dataset over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url) -> Result<Self, DatasetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn location(&self) -> String {
        self.url.to_string()
    }

    async fn load(&self) -> Result<Dataset, DatasetError> {
        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(DatasetError::Status {
                url: self.url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        Dataset::from_slice(&body)
    }
}
