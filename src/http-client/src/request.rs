use snafu::ResultExt;

use crate::{
    Response, Result,
    error::{FailedRequestSnafu, MiddlewareSnafu, ReqwestSnafu},
};

#[derive(Debug)]
pub struct RequestBuilder(pub(crate) reqwest_middleware::RequestBuilder);

impl RequestBuilder {
    /// This method will check the status of the response and return an error if it fails
    pub async fn send(self) -> Result<Response> {
        let response = self.0.send().await.context(MiddlewareSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            return FailedRequestSnafu {
                url,
                status,
                body: response.text().await.context(ReqwestSnafu)?,
            }
            .fail();
        }

        Ok(Response(response))
    }
}
