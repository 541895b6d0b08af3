//! Thin authenticated HTTP client for the Sheets REST API.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{SheetsError, credentials::TokenSource};

#[derive(Debug, Clone)]
pub(crate) struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl SheetsClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, tokens: Arc<TokenSource>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Forces a token exchange so bad credentials surface immediately.
    pub(crate) async fn authenticate(&self) -> Result<(), SheetsError> {
        self.tokens.token().await.map(|_| ())
    }

    pub(crate) fn url_with_segments(&self, segments: &[&str]) -> Result<reqwest::Url, SheetsError> {
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|e| SheetsError::Url(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| SheetsError::Url("base_url must be an absolute URL".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        query: &[(&str, String)],
    ) -> Result<T, SheetsError> {
        self.send(self.http.get(url).query(query)).await
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        body: &impl Serialize,
        query: &[(&str, String)],
    ) -> Result<T, SheetsError> {
        self.send(self.http.put(url).query(query).json(body)).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        body: &impl Serialize,
        query: &[(&str, String)],
    ) -> Result<T, SheetsError> {
        self.send(self.http.post(url).query(query).json(body)).await
    }

    /// Authorizes `request`, sends it and decodes a 2xx JSON body. Any other
    /// status becomes [`SheetsError::Api`] carrying the response text.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SheetsError> {
        let token = self.tokens.token().await?;
        let response = request
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "Sheets API request failed");
            return Err(SheetsError::Api { status, body });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Quotes a sheet title for use in A1 notation (`'It''s'!A1`).
pub(crate) fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;
    use crate::Credentials;

    fn client(base_url: &str) -> SheetsClient {
        let tokens = Arc::new(TokenSource::new(
            Credentials::AccessToken("token".to_string()),
            reqwest::Client::new(),
        ));
        SheetsClient::new(reqwest::Client::new(), base_url, tokens)
    }

    #[test]
    fn test_url_with_segments_appends_to_base_path() {
        let url = client("http://localhost:1234/v4/")
            .url_with_segments(&["spreadsheets", "doc", "values:batchGet"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1234/v4/spreadsheets/doc/values:batchGet"
        );
    }

    #[test]
    fn test_url_with_segments_on_bare_host() {
        let url = client("http://127.0.0.1:8080")
            .url_with_segments(&["spreadsheets", "doc"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/spreadsheets/doc");
    }

    #[test]
    fn test_url_with_segments_escapes_slashes_in_segments() {
        let url = client("http://localhost:1234/v4")
            .url_with_segments(&["spreadsheets", "a/b"])
            .unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/a%2Fb");
    }

    #[test]
    fn test_url_with_segments_rejects_relative_base() {
        let err = client("not-a-url").url_with_segments(&["x"]).unwrap_err();
        assert!(matches!(err, SheetsError::Url(_)));
    }

    #[test]
    fn test_quote_sheet_title_doubles_single_quotes() {
        assert_eq!(quote_sheet_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet_title("Bob's data"), "'Bob''s data'");
    }

    #[tokio::test]
    async fn test_post_json_sends_token_query_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(query_param("mode", "fast"))
            .and(header("authorization", "Bearer token"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"name": "alpha"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let url = client.url_with_segments(&["items"]).unwrap();
        let response: Value = client
            .post_json(url, &json!({"name": "alpha"}), &[("mode", "fast".to_string())])
            .await
            .unwrap();

        assert_eq!(response, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden sheet"))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let url = client.url_with_segments(&["items"]).unwrap();
        let result: Result<Value, _> = client.put_json(url, &json!({}), &[]).await;

        let Err(SheetsError::Api { status, body }) = result else {
            panic!("expected an API error");
        };
        assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
        assert_eq!(body, "forbidden sheet");
    }
}
