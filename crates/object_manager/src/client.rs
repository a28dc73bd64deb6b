//! HTTP client construction and URL resolution for an object manager

use crate::ObjectManager;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use types::utils::DEFAULT_USER_AGENT;
use types::{ManagerError, ManagerResult};
use url::Url;

impl ObjectManager {
    /// Build an HTTP client carrying the configured headers, timeout and
    /// user agent
    pub fn http_client(&self) -> ManagerResult<Client> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ManagerError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ManagerError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }

        // `user_agent` is applied after `default_headers` and would replace
        // any user-agent entry there
        let mut builder = Client::builder().default_headers(headers);
        if !self.default_headers.contains_key(USER_AGENT.as_str()) {
            builder = builder.user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| ManagerError::Client(e.to_string()))
    }

    /// Resolve a path against the base URL, keeping any base path prefix
    pub fn url_for(&self, path: &str) -> ManagerResult<Url> {
        let base = self.base_url.as_ref().ok_or_else(|| ManagerError::InvalidValue {
            field: "baseURL".to_string(),
            message: "No base URL configured".to_string(),
        })?;

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        Url::parse(&joined).map_err(|e| ManagerError::InvalidValue {
            field: "path".to_string(),
            message: format!("Cannot resolve {}: {}", path, e),
        })
    }

    /// Interpolate the `:param` segments of a named route
    pub fn route_path(&self, name: &str, params: &[(&str, &str)]) -> ManagerResult<String> {
        let route = self.named_route(name).ok_or_else(|| ManagerError::RouteNotFound {
            name: name.to_string(),
        })?;

        let segments = route
            .path_pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => params
                    .iter()
                    .find(|(key, _)| *key == param)
                    .map(|(_, value)| value.to_string())
                    .ok_or_else(|| ManagerError::InvalidValue {
                        field: param.to_string(),
                        message: format!("Missing parameter for route {}", name),
                    }),
                None => Ok(segment.to_string()),
            })
            .collect::<ManagerResult<Vec<_>>>()?;

        Ok(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use types::{Manager, RequestMethod, Route};
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_url_for_keeps_base_path() {
        let manager = ObjectManager::with_base_url("https://api.example.com/v1/").unwrap();
        assert_eq!(
            manager.url_for("/articles").unwrap().as_str(),
            "https://api.example.com/v1/articles"
        );

        assert!(ObjectManager::new().url_for("/articles").is_err());
    }

    #[test]
    fn test_route_path() {
        let mut manager = ObjectManager::new();
        manager
            .add_route(Route {
                name: Some("comment".to_string()),
                object_class: None,
                path_pattern: "/articles/:articleID/comments/:commentID".to_string(),
                method: RequestMethod::Get,
            })
            .unwrap();

        let path = manager
            .route_path("comment", &[("articleID", "12"), ("commentID", "3")])
            .unwrap();
        assert_eq!(path, "/articles/12/comments/3");

        assert!(manager.route_path("comment", &[("articleID", "12")]).is_err());
        assert!(matches!(
            manager.route_path("missing", &[]),
            Err(ManagerError::RouteNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_client_sends_configured_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(header("x-api-key", "secret"))
            .and(header("accept", "application/vnd.api+json"))
            .and(header("user-agent", "mapconf-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let mut manager = ObjectManager::with_base_url(&mock_server.uri()).unwrap();
        manager.set_default_header("X-Api-Key", "secret").unwrap();
        manager.set_accept_header("application/vnd.api+json").unwrap();
        manager.set_user_agent("mapconf-test").unwrap();
        manager.set_timeout(Duration::from_secs(5)).unwrap();

        let client = manager.http_client().unwrap();
        let response = client
            .get(manager.url_for("/articles").unwrap())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_user_agent_header_goes_through_user_agent_setter() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("user-agent", "custom/9"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let mut manager = ObjectManager::with_base_url(&mock_server.uri()).unwrap();
        assert!(matches!(
            manager.set_default_header("User-Agent", "custom/9"),
            Err(ManagerError::ReservedHeader { .. })
        ));

        let default_response = manager
            .http_client()
            .unwrap()
            .get(manager.url_for("/articles").unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(default_response.status().as_u16(), 404);

        manager.set_user_agent("custom/9").unwrap();
        let response = manager
            .http_client()
            .unwrap()
            .get(manager.url_for("/articles").unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let requests = mock_server.received_requests().await.unwrap();
        let sent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
        assert_eq!(sent, DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_http_client_without_headers_is_not_matched() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let manager = ObjectManager::with_base_url(&mock_server.uri()).unwrap();
        let response = manager
            .http_client()
            .unwrap()
            .get(manager.url_for("/articles").unwrap())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 404);
    }
}
