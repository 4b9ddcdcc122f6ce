use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::{Result, error::ReqwestSnafu};

#[derive(Debug)]
pub struct Response(pub(crate) reqwest::Response);

impl Response {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.0.json().await.context(ReqwestSnafu)
    }

    pub async fn text(self) -> Result<String> {
        self.0.text().await.context(ReqwestSnafu)
    }
}
