use std::time::Duration;

use reqwest::{Client, IntoUrl, header::HeaderMap};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::{RequestBuilder, Result, error::BuildSnafu};

#[derive(Debug, Clone)]
pub struct HttpClient(ClientWithMiddleware);

#[derive(Default, Debug)]
pub struct HttpClientBuilder {
    client: reqwest::ClientBuilder,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::new_with(Client::new())
    }

    fn new_with(inner: Client) -> Self {
        let client = ClientBuilder::new(inner)
            .with(TracingMiddleware::default())
            .build();

        Self(client)
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder(self.0.get(url))
    }

    /// Single GET request decoding a JSON body, non-success statuses are returned as errors.
    pub async fn download<T: DeserializeOwned>(&self, url: impl IntoUrl) -> Result<T> {
        self.get(url).send().await?.json().await
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.timeout(timeout);
        self
    }

    pub fn gzip(mut self, enable: bool) -> Self {
        self.client = self.client.gzip(enable);
        self
    }

    /// Headers sent with every request made by the client.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.client = self.client.default_headers(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let inner = self.client.build().context(BuildSnafu)?;
        Ok(HttpClient::new_with(inner))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
