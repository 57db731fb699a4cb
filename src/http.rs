//! Typed JSON request helpers over `reqwest`.
//!
//! Request and response shapes are plain serde types. Any non-2xx status is
//! returned as [`AppError::HttpStatus`].

use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }

    /// GET `url` with the fields of `req` sent as query parameters.
    pub async fn get<Req, Resp>(&self, url: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let params = query_params(req)?;
        let request = self.client.get(url).query(&params);
        self.execute(Method::GET, url, request).await
    }

    /// POST `req` as a JSON body.
    pub async fn post<Req, Resp>(&self, url: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let request = self.client.post(url).json(req);
        self.execute(Method::POST, url, request).await
    }

    /// DELETE with `req` as a JSON body.
    pub async fn delete<Req, Resp>(&self, url: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let request = self.client.delete(url).json(req);
        self.execute(Method::DELETE, url, request).await
    }

    async fn execute<Resp>(&self, method: Method, url: &str, request: RequestBuilder) -> Result<Resp>
    where
        Resp: DeserializeOwned,
    {
        let response = request.send().await?;
        let response = check_status(url, response)?;

        debug!(method = %method, url = url, status = response.status().as_u16(), "HTTP request succeeded");
        Ok(response.json::<Resp>().await?)
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Flatten the top-level fields of `req` into query parameters.
///
/// Strings are sent unquoted, other values as their JSON text, nulls are
/// skipped. Anything that does not serialize to an object is rejected.
pub fn query_params<Req: Serialize + ?Sized>(req: &Req) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(req)? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, rendered)
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(AppError::config(format!(
            "query parameters must serialize to an object, got {}",
            other
        ))),
    }
}

pub async fn get_request<Req, Resp>(url: &str, req: &Req) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    HttpClient::new()?.get(url, req).await
}

pub async fn post_request<Req, Resp>(url: &str, req: &Req) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    HttpClient::new()?.post(url, req).await
}

pub async fn delete_request<Req, Resp>(url: &str, req: &Req) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    HttpClient::new()?.delete(url, req).await
}
