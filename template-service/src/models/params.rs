//! Request parameters gathered from the query string and a urlencoded form
//! body, the way an HTML form submission delivers them.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use std::collections::HashMap;
use std::convert::Infallible;

use crate::services::ProxyError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(HashMap<String, String>);

impl RequestParams {
    /// Build from `(name, value)` pairs. The first occurrence of a name wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        params.extend(pairs);
        params
    }

    fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.0.entry(name.into()).or_insert_with(|| value.into());
        }
    }

    fn extend_urlencoded(&mut self, input: &str, source: &str) {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(input) {
            Ok(pairs) => self.extend(pairs),
            Err(e) => tracing::warn!(source = source, error = %e, "Ignoring malformed parameters"),
        }
    }

    /// Raw value as sent, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Trimmed value, treating blank as absent.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Trimmed value, or `InvalidInput` carrying `message` when missing or blank.
    pub fn required(&self, name: &str, message: &str) -> Result<&str, ProxyError> {
        self.non_blank(name)
            .ok_or_else(|| ProxyError::InvalidInput(message.to_string()))
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = RequestParams::default();

        if let Some(query) = req.uri().query() {
            params.extend_urlencoded(query, "query");
        }

        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false);

        if is_form {
            match Bytes::from_request(req, state).await {
                Ok(body) => match std::str::from_utf8(&body) {
                    Ok(body) => params.extend_urlencoded(body, "form"),
                    Err(e) => tracing::warn!(error = %e, "Ignoring non UTF-8 form body"),
                },
                Err(e) => tracing::warn!(error = %e, "Failed to read form body"),
            }
        }

        Ok(params)
    }
}
