use super::{ApiError, Gateway};
use crate::model::{
    CrawlResult, CreateFeedOutcome, Feed, FeedErrors, FeedId, FeedPatch, Folder, FolderId,
    FolderPatch, ItemDetail, ItemId, ItemPage, ItemQuery, ItemStatus, NewFeed, ServerStatus,
    SettingsPatch, TagId, TagSnapshot,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Credentials for servers started with basic auth.
struct Credentials {
    username: String,
    password: SecretString,
}

/// [`Gateway`] over the server's JSON API.
pub struct HttpGateway {
    client: reqwest::Client,
    base: Url,
    auth: Option<Credentials>,
}

impl HttpGateway {
    /// Build a gateway rooted at `server_url`.
    ///
    /// A missing trailing slash is added so that relative endpoints resolve
    /// below any path prefix the server is mounted under.
    pub fn new(
        server_url: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ApiError> {
        let mut base = Url::parse(server_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let auth = username.map(|username| Credentials {
            username,
            password: SecretString::from(password.unwrap_or_default()),
        });

        tracing::debug!(base = %base, auth = auth.is_some(), "Created HTTP gateway");
        Ok(Self { client, base, auth })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let mut req = self.client.request(method, url);
        if let Some(creds) = &self.auth {
            req = req.basic_auth(&creds.username, Some(creds.password.expose_secret()));
        }
        Ok(req)
    }

    /// Send and fail on non-2xx statuses.
    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %response.url(), "Server rejected request");
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(req).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<(), ApiError> {
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn status(&self) -> Result<ServerStatus, ApiError> {
        self.fetch_json(self.request(Method::GET, "api/status")?).await
    }

    async fn list_folders(&self) -> Result<Vec<Folder>, ApiError> {
        self.fetch_json(self.request(Method::GET, "api/folders")?).await
    }

    async fn create_folder(&self, title: &str) -> Result<Folder, ApiError> {
        let req = self
            .request(Method::POST, "api/folders")?
            .json(&json!({ "title": title }));
        self.fetch_json(req).await
    }

    async fn update_folder(&self, id: FolderId, patch: &FolderPatch) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("api/folders/{}", id))?
            .json(patch);
        self.execute(req).await
    }

    async fn delete_folder(&self, id: FolderId) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("api/folders/{}", id))?)
            .await
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>, ApiError> {
        self.fetch_json(self.request(Method::GET, "api/feeds")?).await
    }

    async fn create_feed(&self, feed: &NewFeed) -> Result<CreateFeedOutcome, ApiError> {
        let req = self.request(Method::POST, "api/feeds")?.json(feed);
        self.fetch_json(req).await
    }

    async fn update_feed(&self, id: FeedId, patch: &FeedPatch) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("api/feeds/{}", id))?
            .json(patch);
        self.execute(req).await
    }

    async fn delete_feed(&self, id: FeedId) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("api/feeds/{}", id))?)
            .await
    }

    async fn refresh_feeds(&self) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "api/feeds/refresh")?)
            .await
    }

    async fn list_feed_errors(&self) -> Result<FeedErrors, ApiError> {
        self.fetch_json(self.request(Method::GET, "api/feeds/errors")?)
            .await
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage, ApiError> {
        let req = self
            .request(Method::GET, "api/items")?
            .query(&query.to_params());
        self.fetch_json(req).await
    }

    async fn get_item(&self, id: ItemId) -> Result<ItemDetail, ApiError> {
        self.fetch_json(self.request(Method::GET, &format!("api/items/{}", id))?)
            .await
    }

    async fn update_item(&self, id: ItemId, status: ItemStatus) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("api/items/{}", id))?
            .json(&json!({ "status": status }));
        self.execute(req).await
    }

    async fn mark_read(&self, query: &ItemQuery) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, "api/items")?
            .query(&query.to_params());
        self.execute(req).await
    }

    async fn list_tags(&self) -> Result<TagSnapshot, ApiError> {
        self.fetch_json(self.request(Method::GET, "api/tags")?).await
    }

    async fn update_tags(&self, feed_id: FeedId, tags: &str) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("api/feeds/{}/tags", feed_id))?
            .json(&json!({ "tags": tags }));
        self.execute(req).await
    }

    async fn update_tag_parent(&self, tag: TagId, parent: Option<TagId>) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("api/tags/{}", tag))?
            .json(&json!({ "parent_id": parent }));
        self.execute(req).await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<(), ApiError> {
        let req = self.request(Method::PUT, "api/settings")?.json(patch);
        self.execute(req).await
    }

    async fn crawl(&self, url: &str) -> Result<CrawlResult, ApiError> {
        let req = self.request(Method::GET, "page")?.query(&[("url", url)]);
        self.fetch_json(req).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "logout")?).await
    }

    async fn upload_opml(&self, path: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "subscriptions.opml".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("opml", part);

        tracing::info!(path = %path.display(), "Uploading OPML");
        self.execute(self.request(Method::POST, "opml/import")?.multipart(form))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(&server.uri(), None, None).unwrap()
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let gw = HttpGateway::new("http://localhost:7070/reader", None, None).unwrap();
        assert_eq!(
            gw.endpoint("api/status").unwrap().as_str(),
            "http://localhost:7070/reader/api/status"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpGateway::new("not a url", None, None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_status_parses_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "running": 2,
                "stats": [{"feed_id": 1, "unread": 5, "starred": 2}]
            })))
            .mount(&server)
            .await;

        let status = gateway(&server).await.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.stats.len(), 1);
        assert_eq!(status.stats[0].unread, 5);
    }

    #[tokio::test]
    async fn test_list_items_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/items"))
            .and(query_param("folder_id", "3"))
            .and(query_param("status", "unread"))
            .and(query_param("after", "41"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{"id": 40, "feed_id": 7, "title": "Hello", "status": "unread",
                          "date": "2024-03-01T10:00:00Z"}],
                "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ItemQuery {
            folder_id: Some(3),
            status: Some(ItemStatus::Unread),
            after: Some(41),
            ..ItemQuery::default()
        };
        let page = gateway(&server).await.list_items(&query).await.unwrap();
        assert!(!page.has_more);
        assert_eq!(page.list[0].id, 40);
        assert!(page.list[0].date.is_some());
    }

    #[tokio::test]
    async fn test_update_item_sends_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/items/9"))
            .and(body_json(json!({"status": "starred"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server)
            .await
            .update_item(9, ItemStatus::Starred)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/feeds/4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = gateway(&server).await.delete_feed(4).await.unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/folders"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server).await.list_folders().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_feed_multiple_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/feeds"))
            .and(body_json(json!({"url": "https://blog.example", "folder_id": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "multiple",
                "choice": [
                    {"url": "https://blog.example/rss", "title": "RSS"},
                    {"url": "https://blog.example/atom", "title": "Atom"}
                ]
            })))
            .mount(&server)
            .await;

        let outcome = gateway(&server)
            .await
            .create_feed(&NewFeed {
                url: "https://blog.example".to_string(),
                folder_id: None,
            })
            .await
            .unwrap();
        match outcome {
            CreateFeedOutcome::Multiple { choice } => assert_eq!(choice.len(), 2),
            other => panic!("expected multiple, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tag_parent_null() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/tags/5"))
            .and(body_json(json!({"parent_id": null})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server)
            .await
            .update_tag_parent(5, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_feed_errors_keyed_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feeds/errors"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"12": "connection refused"})),
            )
            .mount(&server)
            .await;

        let errors = gateway(&server).await.list_feed_errors().await.unwrap();
        assert_eq!(errors.get(&12).map(String::as_str), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_crawl_passes_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(query_param("url", "https://news.example/a?b=1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": "<p>full</p>"})),
            )
            .mount(&server)
            .await;

        let result = gateway(&server)
            .await
            .crawl("https://news.example/a?b=1")
            .await
            .unwrap();
        assert_eq!(result.content.as_deref(), Some("<p>full</p>"));
    }

    #[tokio::test]
    async fn test_basic_auth_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/feeds/refresh"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let gw = HttpGateway::new(
            &server.uri(),
            Some("ana".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();
        gw.refresh_feeds().await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let err = gateway(&server)
            .await
            .upload_opml(Path::new("/tmp/feedwire_no_such_file.opml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
