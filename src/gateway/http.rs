use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::{list_segments, Envelope, TodoGateway, TodoQuery};
use crate::error::GatewayError;
use crate::models::{Credentials, NewTask, Registration, TaskUpdate};

/// reqwest-backed gateway. The session lives in a cookie jar owned by the client.
pub struct HttpGateway {
    client: Client,
    base: Url,
    jar: Arc<Jar>,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut base = Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::OpaqueUrl(base_url.to_string()));
        }
        base.set_query(None);
        base.set_fragment(None);

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(jar.clone());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(HttpGateway { client, base, jar })
    }

    /// Seeds the jar with a cookie header previously returned by [`TodoGateway::session_cookie`].
    pub fn with_session(self, cookie: &str) -> Self {
        for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.base);
        }
        self
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::OpaqueUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<B: Serialize + Sync>(&self, method: Method, segments: &[&str], body: Option<&B>) -> Envelope {
        match self.send(method.clone(), segments, body).await {
            Ok(envelope) => {
                debug!(%method, path = %segments.join("/"), status = ?envelope.status, success = envelope.success, "gateway call");
                envelope
            }
            Err(err) => {
                debug!(%method, path = %segments.join("/"), error = %err, "gateway transport failure");
                Envelope::failure(None, None, err.to_string())
            }
        }
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Envelope, GatewayError> {
        let url = self.url(segments)?;
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), body = %text, "gateway response");

        let data = decode_body(&text);
        if status.is_success() {
            return Ok(Envelope::ok(status.as_u16(), data));
        }

        let message = data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        Ok(Envelope::failure(Some(status.as_u16()), data, message))
    }
}

fn decode_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl TodoGateway for HttpGateway {
    async fn probe_session(&self) -> Envelope {
        self.call(Method::GET, &["auth", "login"], NO_BODY).await
    }

    async fn login(&self, credentials: &Credentials) -> Envelope {
        self.call(Method::POST, &["auth", "login"], Some(credentials)).await
    }

    async fn register(&self, registration: &Registration) -> Envelope {
        self.call(Method::POST, &["auth", "register"], Some(registration)).await
    }

    async fn logout(&self) -> Envelope {
        self.call(Method::POST, &["auth", "logout"], NO_BODY).await
    }

    async fn list(&self, query: Option<TodoQuery>) -> Envelope {
        self.call(Method::GET, &list_segments(query), NO_BODY).await
    }

    async fn create(&self, text: &str) -> Envelope {
        self.call(Method::POST, &["todos"], Some(&NewTask { task: text })).await
    }

    async fn update(&self, id: &str, text: &str, completed: Option<bool>) -> Envelope {
        let body = TaskUpdate { task: text, completed };
        self.call(Method::PUT, &["todos", id], Some(&body)).await
    }

    async fn soft_delete(&self, id: &str) -> Envelope {
        self.call(Method::DELETE, &["todos", id], NO_BODY).await
    }

    async fn delete_permanent(&self, id: &str) -> Envelope {
        self.call(Method::DELETE, &["todos", id, "permanent"], NO_BODY).await
    }

    async fn restore(&self, id: &str) -> Envelope {
        self.call(Method::PATCH, &["todos", id, "restore"], NO_BODY).await
    }

    fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        header.to_str().ok().map(str::to_owned)
    }
}
