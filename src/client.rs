//! Browser-side REST client.
//!
//! Every call reads the bearer token from the session store, sends JSON and
//! unwraps the backend's `{"success": true, "data": ...}` envelope. Non-2xx
//! responses become [`ClientError::Http`] carrying one readable message.
use gloo_net::http::{Request, RequestBuilder, Response};
use leptos::logging::{error, log};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::envelope::{ApiEnvelope, Deleted, UploadedFile};
use crate::models::Resource;
use crate::session::{LocalStorageStore, SessionStore};

/// Turns an error response body into the message shown to the user.
///
/// Preference order: the `errors` array joined with `", "`, then the
/// `message` field, then a generic line naming the status.
pub fn error_message(status: u16, body: &str) -> String {
    let fallback = format!("Request failed with status {status}");
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return fallback;
    };

    if let Some(errors) = json.get("errors").and_then(Value::as_array) {
        let messages: Vec<String> = errors
            .iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.clone()),
                Value::Object(fields) => fields
                    .get("message")
                    .or_else(|| fields.get("msg"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .filter(|m| !m.is_empty())
            .collect();
        if !messages.is_empty() {
            return messages.join(", ");
        }
    }

    json.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// `Authorization` header value for a stored token.
pub fn bearer(token: Option<&str>) -> Option<String> {
    token
        .filter(|t| !t.is_empty())
        .map(|t| format!("Bearer {t}"))
}

/// Joins the API base and an endpoint without doubling slashes.
pub fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

pub fn item_endpoint<R: Resource>(id: &str) -> String {
    format!("{}/{}", R::ENDPOINT, urlencoding::encode(id))
}

#[derive(Clone)]
pub struct ApiClient<S: SessionStore = LocalStorageStore> {
    config: ClientConfig,
    store: S,
}

impl ApiClient<LocalStorageStore> {
    pub fn browser() -> Self {
        Self::new(ClientConfig::from_build_env(), LocalStorageStore)
    }
}

impl<S: SessionStore + Clone> ApiClient<S> {
    pub fn new(config: ClientConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.config.api_base, endpoint)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match bearer(self.store.token().as_deref()) {
            Some(value) => builder.header("Authorization", &value),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let request = self
            .authorize(Request::get(&self.url(endpoint)))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        self.send(endpoint, request).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self
            .authorize(Request::post(&self.url(endpoint)))
            .json(body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.send(endpoint, request).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self
            .authorize(Request::put(&self.url(endpoint)))
            .json(body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.send(endpoint, request).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Deleted, ClientError> {
        let request = self
            .authorize(Request::delete(&self.url(endpoint)))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        self.send(endpoint, request).await
    }

    /// Sends one file as the `file` field of a multipart form.
    pub async fn upload(&self, file: &web_sys::File) -> Result<UploadedFile, ClientError> {
        let form = web_sys::FormData::new()
            .map_err(|_| ClientError::Network("cannot create form data".into()))?;
        form.append_with_blob_and_filename("file", file, &file.name())
            .map_err(|_| ClientError::Network("cannot attach file".into()))?;
        // No content type here: the browser adds the multipart boundary.
        let request = self
            .authorize(Request::post(&self.url("upload")))
            .body(form)
            .map_err(|e| ClientError::Network(e.to_string()))?;
        self.send("upload", request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: Request,
    ) -> Result<T, ClientError> {
        let method = request.method();
        let response = request.send().await.map_err(|e| {
            error!("[CLIENT] {:?} {} failed: {}", method, endpoint, e);
            ClientError::Network(e.to_string())
        })?;
        log!("[CLIENT] {:?} {} -> {}", method, endpoint, response.status());
        unwrap_response(response).await
    }

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ClientError> {
        self.get(R::ENDPOINT).await
    }

    /// Collection filtered by a query string such as `product_id=p1`.
    pub async fn list_where<R: Resource>(&self, query: &str) -> Result<Vec<R>, ClientError> {
        self.get(&format!("{}?{}", R::ENDPOINT, query)).await
    }

    pub async fn fetch<R: Resource>(&self, id: &str) -> Result<R, ClientError> {
        self.get(&item_endpoint::<R>(id)).await
    }

    pub async fn create<R: Resource>(&self, input: &R::Input) -> Result<R, ClientError> {
        self.post(R::ENDPOINT, input).await
    }

    pub async fn update<R: Resource>(&self, id: &str, input: &R::Input) -> Result<R, ClientError> {
        self.put(&item_endpoint::<R>(id), input).await
    }

    pub async fn remove<R: Resource>(&self, id: &str) -> Result<Deleted, ClientError> {
        self.delete(&item_endpoint::<R>(id)).await
    }
}

async fn unwrap_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    decode_body(status, response.ok(), &body)
}

/// Envelope unwrapping, separated from the transport for testing.
pub fn decode_body<T: DeserializeOwned>(status: u16, ok: bool, body: &str) -> Result<T, ClientError> {
    if !ok {
        return Err(ClientError::Http {
            status,
            message: error_message(status, body),
        });
    }
    serde_json::from_str::<ApiEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::Category;

    #[test]
    fn validation_array_is_joined() {
        let body = r#"{"success":false,"message":"Validation failed","errors":["Name is required","Price must not be negative"]}"#;
        assert_eq!(
            error_message(422, body),
            "Name is required, Price must not be negative"
        );
    }

    #[test]
    fn validator_objects_contribute_their_message() {
        let body = r#"{"errors":[{"msg":"Email taken"},{"message":"Role invalid"},42]}"#;
        assert_eq!(error_message(400, body), "Email taken, Role invalid");
    }

    #[test]
    fn message_field_is_used_without_errors() {
        let body = r#"{"success":false,"message":"Product not found"}"#;
        assert_eq!(error_message(404, body), "Product not found");
        let body = r#"{"message":"Forbidden","errors":[]}"#;
        assert_eq!(error_message(403, body), "Forbidden");
    }

    #[test]
    fn unreadable_body_falls_back_to_status() {
        assert_eq!(
            error_message(502, "<html>Bad gateway</html>"),
            "Request failed with status 502"
        );
        assert_eq!(error_message(500, "{}"), "Request failed with status 500");
    }

    #[test]
    fn bearer_only_for_present_tokens() {
        assert_eq!(bearer(Some("abc")).as_deref(), Some("Bearer abc"));
        assert_eq!(bearer(Some("")), None);
        assert_eq!(bearer(None), None);
    }

    #[test]
    fn urls_are_joined_once() {
        assert_eq!(join_url("/api/", "/products"), "/api/products");
        assert_eq!(join_url("http://h:3000/api", "orders/1/status"), "http://h:3000/api/orders/1/status");
        assert_eq!(item_endpoint::<Category>("a b"), "categories/a%20b");
    }

    #[test]
    fn success_body_yields_data() {
        let body = r#"{"success":true,"data":[{"id":"c1","name":"Spices","active":true}]}"#;
        let categories: Vec<Category> = decode_body(200, true, body).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].product_count, 0);
    }

    #[test]
    fn error_status_yields_http_error() {
        let err = decode_body::<Vec<Category>>(401, false, r#"{"message":"Authentication required"}"#)
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Authentication required");
    }
}
