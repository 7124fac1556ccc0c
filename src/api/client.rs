use crate::api::source::{Operation, RecordSource};
use crate::api::types::{decode_list, decode_record, decode_with_id, Record, RecordFields};
use crate::config::{Config, FieldMap, ResourceConfig};
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for one REST collection
#[derive(Clone)]
pub struct RestClient {
  http: reqwest::Client,
  endpoint: Arc<Endpoint>,
}

/// Everything a request needs besides the HTTP client
#[derive(Debug)]
struct Endpoint {
  collection_url: Url,
  resource: String,
  fields: FieldMap,
  token: Option<String>,
}

impl Endpoint {
  fn item_url(&self, id: u64) -> Result<Url> {
    let mut url = self.collection_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| eyre!("Base URL cannot hold a path: {}", self.collection_url))?
      .push(&id.to_string());
    Ok(url)
  }

  fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Log the real cause and replace it with the generic operation error.
  fn fail(&self, operation: Operation, cause: impl std::fmt::Display) -> color_eyre::Report {
    warn!(resource = %self.resource, ?operation, error = %cause, "request failed");
    eyre!(operation.failure_message(&self.resource))
  }
}

/// Join a resource path onto the base URL, keeping any base path prefix.
pub fn collection_url(base: &Url, path: &str) -> Result<Url> {
  let mut url = base.clone();
  {
    let mut segments = url
      .path_segments_mut()
      .map_err(|_| eyre!("Base URL cannot hold a path: {}", base))?;
    segments.pop_if_empty();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
      segments.push(segment);
    }
  }
  Ok(url)
}

impl RestClient {
  pub fn new(config: &Config, resource: &ResourceConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("restdeck/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let collection_url = collection_url(&config.base_url()?, resource.path())?;
    debug!(url = %collection_url, "using collection endpoint");

    Ok(Self {
      http,
      endpoint: Arc::new(Endpoint {
        collection_url,
        resource: resource.name.clone(),
        fields: resource.fields.clone(),
        token: Config::api_token(),
      }),
    })
  }

  /// Fetch the whole collection
  pub async fn list_records(&self) -> Result<Vec<Record>> {
    let ep = &self.endpoint;
    let op = Operation::List;

    let value: Value = ep
      .authorize(self.http.get(ep.collection_url.clone()))
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| ep.fail(op, e))?
      .json()
      .await
      .map_err(|e| ep.fail(op, e))?;

    decode_list(&value, &ep.fields).map_err(|e| ep.fail(op, e))
  }

  /// Create a record and return it with its server-assigned id
  pub async fn create_record(&self, fields: &RecordFields) -> Result<Record> {
    let ep = &self.endpoint;
    let op = Operation::Create;

    let value: Value = ep
      .authorize(self.http.post(ep.collection_url.clone()))
      .json(&fields.to_json(&ep.fields))
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| ep.fail(op, e))?
      .json()
      .await
      .map_err(|e| ep.fail(op, e))?;

    decode_record(&value, &ep.fields).map_err(|e| ep.fail(op, e))
  }

  /// Replace a record; the returned record always carries `id`
  pub async fn update_record(&self, id: u64, fields: &RecordFields) -> Result<Record> {
    let ep = &self.endpoint;
    let op = Operation::Update;
    let url = ep.item_url(id).map_err(|e| ep.fail(op, e))?;

    let value: Value = ep
      .authorize(self.http.put(url))
      .json(&fields.to_json(&ep.fields))
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| ep.fail(op, e))?
      .json()
      .await
      .map_err(|e| ep.fail(op, e))?;

    decode_with_id(&value, id, &ep.fields).map_err(|e| ep.fail(op, e))
  }

  /// Delete a record; any response body is ignored
  pub async fn delete_record(&self, id: u64) -> Result<()> {
    let ep = &self.endpoint;
    let op = Operation::Delete;
    let url = ep.item_url(id).map_err(|e| ep.fail(op, e))?;

    ep.authorize(self.http.delete(url))
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| ep.fail(op, e))?;

    Ok(())
  }
}

impl RecordSource for RestClient {
  fn list(&self) -> BoxFuture<'static, Result<Vec<Record>>> {
    let client = self.clone();
    async move { client.list_records().await }.boxed()
  }

  fn create(&self, fields: RecordFields) -> BoxFuture<'static, Result<Record>> {
    let client = self.clone();
    async move { client.create_record(&fields).await }.boxed()
  }

  fn update(&self, id: u64, fields: RecordFields) -> BoxFuture<'static, Result<Record>> {
    let client = self.clone();
    async move { client.update_record(id, &fields).await }.boxed()
  }

  fn delete(&self, id: u64) -> BoxFuture<'static, Result<()>> {
    let client = self.clone();
    async move { client.delete_record(id).await }.boxed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  #[test]
  fn test_collection_url() {
    let base = url("https://jsonplaceholder.typicode.com");
    assert_eq!(
      collection_url(&base, "posts").unwrap().as_str(),
      "https://jsonplaceholder.typicode.com/posts"
    );
  }

  #[test]
  fn test_collection_url_keeps_base_path() {
    let base = url("http://localhost:3000/api/");
    assert_eq!(
      collection_url(&base, "v2/notes").unwrap().as_str(),
      "http://localhost:3000/api/v2/notes"
    );

    let base = url("http://localhost:3000/api");
    assert_eq!(
      collection_url(&base, "posts").unwrap().as_str(),
      "http://localhost:3000/api/posts"
    );
  }

  #[test]
  fn test_item_url() {
    let config = Config::default();
    let resource = config.initial_resource().unwrap().clone();
    let client = RestClient::new(&config, &resource).unwrap();
    assert_eq!(
      client.endpoint.item_url(42).unwrap().as_str(),
      "https://jsonplaceholder.typicode.com/posts/42"
    );
  }

  #[test]
  fn test_fail_hides_cause() {
    let config = Config::default();
    let resource = config.initial_resource().unwrap().clone();
    let client = RestClient::new(&config, &resource).unwrap();
    let err = client.endpoint.fail(Operation::List, "dns error");
    assert_eq!(err.to_string(), "Failed to fetch posts");
  }

  #[tokio::test]
  async fn test_unreachable_server_reports_generic_error() {
    let config = Config {
      api: crate::config::ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
      },
      ..Config::default()
    };
    let resource = config.initial_resource().unwrap().clone();
    let client = RestClient::new(&config, &resource).unwrap();

    let err = client.delete_record(1).await.unwrap_err();
    assert_eq!(err.to_string(), "Delete request failed");
  }
}
