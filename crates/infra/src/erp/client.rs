//! HTTP implementation of the ERP document API
//!
//! The ERP exposes RPC-style document endpoints under `/api/method/`.
//! Writes POST a JSON body, reads GET with query parameters, and every
//! success response wraps its payload in a `message` (sometimes `data`)
//! envelope. Non-success bodies carry exception text that
//! [`ErpError::classify_remote`] turns into typed errors; this adapter
//! never interprets the text itself.
//!
//! The adapter performs exactly one request per call. Conflict retries are
//! the lifecycle driver's job and duplicate recovery belongs to the
//! resource accessors.

use async_trait::async_trait;
use paybridge_core::DocumentApi;
use paybridge_domain::{DocType, Document, ErpConfig, ErpError, ListQuery, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};
use tracing::instrument;

use crate::http::HttpClient;

/// ERP REST client implementing [`DocumentApi`].
#[derive(Debug, Clone)]
pub struct ErpClient {
    http: HttpClient,
    base_url: String,
}

impl ErpClient {
    /// Connect settings from configuration; credentials become a default
    /// `token key:secret` authorization header on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Config`] when the credentials are not valid
    /// header material or the HTTP client cannot be built.
    pub fn new(config: &ErpConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .default_headers(auth_headers(config)?)
            .build()?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/method/{method}", self.base_url)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Value> {
        let request = self.http.request(Method::POST, self.endpoint(method)).json(body);
        let response = self.http.send(request).await?;
        read_payload(response).await
    }

    /// POST a full document to a write endpoint and decode the stored
    /// representation the ERP echoes back.
    async fn write(&self, method: &str, doc: &Document) -> Result<Document> {
        let payload = self.post(method, &json!({ "doc": doc.to_value() })).await?;
        Document::from_value(doc.doctype, payload)
    }
}

#[async_trait]
impl DocumentApi for ErpClient {
    #[instrument(skip(self, doc), fields(doctype = %doc.doctype))]
    async fn insert(&self, doc: &Document) -> Result<Document> {
        self.write("document.insert", doc).await
    }

    #[instrument(skip(self, doc), fields(doctype = %doc.doctype, name = doc.name.as_deref()))]
    async fn save(&self, doc: &Document) -> Result<Document> {
        self.write("document.save", doc).await
    }

    #[instrument(skip(self, doc), fields(doctype = %doc.doctype, name = doc.name.as_deref()))]
    async fn submit(&self, doc: &Document) -> Result<Document> {
        self.write("document.submit", doc).await
    }

    #[instrument(skip(self, doc), fields(doctype = %doc.doctype, name = doc.name.as_deref()))]
    async fn cancel(&self, doc: &Document) -> Result<Document> {
        self.write("document.cancel", doc).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, doctype: DocType, name: &str) -> Result<()> {
        self.post("document.delete", &json!({ "doctype": doctype.as_str(), "name": name }))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, doctype: DocType, name: &str) -> Result<Option<Document>> {
        let request = self
            .http
            .request(Method::GET, self.endpoint("document.get"))
            .query(&[("doctype", doctype.as_str()), ("name", name)]);
        let response = self.http.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let payload = read_payload(response).await?;
        if payload.is_null() {
            return Ok(None);
        }
        Document::from_value(doctype, payload).map(Some)
    }

    #[instrument(skip(self, query), fields(doctype = %query.doctype))]
    async fn list(&self, query: &ListQuery) -> Result<Vec<Document>> {
        let mut params: Vec<(&str, String)> = vec![
            ("doctype", query.doctype.as_str().to_string()),
            ("filters", query.filter_triples().to_string()),
        ];
        if !query.fields.is_empty() {
            params.push(("fields", Value::from(query.fields.clone()).to_string()));
        }
        if let Some(order_by) = &query.order_by {
            params.push(("order_by", order_by.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit_page_length", limit.to_string()));
        }

        let request =
            self.http.request(Method::GET, self.endpoint("document.get_list")).query(&params);
        let response = self.http.send(request).await?;
        let payload = read_payload(response).await?;

        let Value::Array(rows) = payload else {
            return Err(ErpError::Internal(format!(
                "expected a JSON array from the {} list endpoint",
                query.doctype
            )));
        };
        rows.into_iter().map(|row| Document::from_value(query.doctype, row)).collect()
    }

    async fn ping(&self) -> Result<bool> {
        let request = self.http.request(Method::GET, self.endpoint("ping"));
        match self.http.send(request).await {
            Ok(response) => Ok(response.status().is_success()),
            Err(ErpError::Network(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

fn auth_headers(config: &ErpConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let token = format!("token {}:{}", config.api_key, config.api_secret);
    let mut value = HeaderValue::from_str(&token).map_err(|_| {
        ErpError::Config(
            "API key or secret contains characters not valid in an HTTP header".to_string(),
        )
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Read the body, classify non-success statuses and strip the response
/// envelope.
async fn read_payload(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(|err| ErpError::Network(err.to_string()))?;

    if !status.is_success() {
        return Err(ErpError::classify_remote(status.as_u16(), &body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_str(&body)
        .map_err(|err| ErpError::Internal(format!("ERP returned malformed JSON: {err}")))?;
    Ok(unwrap_envelope(value))
}

fn unwrap_envelope(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        if let Some(inner) = map.remove("message") {
            return inner;
        }
        if let Some(inner) = map.remove("data") {
            return inner;
        }
    }
    value
}
