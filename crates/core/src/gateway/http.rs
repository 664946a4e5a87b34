//! HTTP client for the remote task service

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::TaskGateway;
use crate::config::GatewayConfig;
use crate::sync::FilterSignature;
use crate::task::{
    CachePage, CleaningTask, FinalizeRequest, TaskId, TaskListResponse, TaskResponse, TaskUpdate,
};
use crate::{Error, Result};

pub struct HttpTaskGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpTaskGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, req: RequestBuilder) -> Result<String> {
        let res = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = res.status();
        let body = res.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Remote call rejected");
            return Err(Error::remote(status.as_u16(), body));
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let body = self.send_raw(req).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                millis: u64::try_from(self.config.request_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::transport(e.to_string())
        }
    }
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn list(&self, signature: &FilterSignature) -> Result<CachePage> {
        let req = self
            .request(Method::GET, "tasks")
            .query(&signature.query_pairs());
        let res: TaskListResponse = self.send(req).await?;
        Ok(res.into())
    }

    async fn get(&self, id: TaskId) -> Result<CleaningTask> {
        let res: TaskResponse = self
            .send(self.request(Method::GET, &format!("tasks/{id}")))
            .await?;
        Ok(res.data)
    }

    async fn update(&self, id: TaskId, update: &TaskUpdate) -> Result<CleaningTask> {
        let req = self
            .request(Method::PATCH, &format!("tasks/{id}"))
            .json(update);
        let res: TaskResponse = self.send(req).await?;
        Ok(res.data)
    }

    async fn finalize(&self, id: TaskId, request: &FinalizeRequest) -> Result<CleaningTask> {
        let req = self
            .request(Method::PATCH, &format!("tasks/{id}/finalize"))
            .json(request);
        let res: TaskResponse = self.send(req).await?;
        Ok(res.data)
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.send_raw(self.request(Method::DELETE, &format!("tasks/{id}")))
            .await?;
        Ok(())
    }
}
