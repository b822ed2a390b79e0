//! Mock server helpers for repository testing
//!
//! Provides utilities for setting up wiremock mock servers that speak the
//! repository protocol.

use plugvault_core::types::{NetworkConfig, RepositoryConfig};
use plugvault_repository::RepositoryClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Build a client pointed at the mock server
pub fn client_for(server: &MockServer) -> RepositoryClient {
    client_for_url(&server.uri())
}

/// Build a client pointed at an arbitrary base URL
pub fn client_for_url(base_url: &str) -> RepositoryClient {
    let repository = RepositoryConfig {
        base_url: base_url.to_string(),
        api_path: API_PATH.to_string(),
    };
    RepositoryClient::new(&repository, &NetworkConfig::default()).unwrap()
}

fn endpoint(name: &str) -> String {
    format!("{}/{}", API_PREFIX, name)
}

/// Serve the catalog schema and tables
pub async fn mock_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(endpoint("schema")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHEMA_DDL))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(endpoint("tables")))
        .respond_with(ResponseTemplate::new(200).set_body_string(TABLES_JSON))
        .mount(server)
        .await;
}

/// Description of one file in a chained plugin download
pub struct MockFile<'a> {
    pub index: u32,
    pub name: &'a str,
    pub content: &'a [u8],
    pub next: Option<u32>,
    pub is_main: bool,
}

/// Serve one plugin file at `plugins/{id}` for the given `fileIndex`
pub async fn mock_plugin_file(server: &MockServer, plugin_id: i64, file: MockFile<'_>) {
    let mut response = ResponseTemplate::new(200)
        .set_body_bytes(file.content.to_vec())
        .insert_header("filename", file.name)
        .insert_header("pluginId", plugin_id.to_string().as_str())
        .insert_header("version", "1.2")
        .insert_header("sdkVersion", "4.9.0")
        .insert_header("isMainFile", if file.is_main { "1" } else { "0" })
        .insert_header("timestamp", "1700000000");
    if let Some(next) = file.next {
        response = response.insert_header("nextFileIndex", next.to_string().as_str());
    }

    Mock::given(method("GET"))
        .and(path(endpoint(&format!("plugins/{}", plugin_id))))
        .and(header("fileIndex", file.index.to_string().as_str()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Answer every request to `name` with a bare status code
pub async fn mock_status(server: &MockServer, http_method: &str, name: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(endpoint(name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
