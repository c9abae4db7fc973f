#![allow(dead_code)]
use async_trait::async_trait;
use http_client::{Error, HttpClient, Request, Response};
use http_types::StatusCode;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use vk_album_stats::{HttpPageLoader, VkScraper};

pub const ALBUM_URL: &str = "https://vk.com/music/album/-2000600197_20600197_805b14b56dae3b32e9";
pub const PLAYLIST_URL: &str = "https://vk.com/music/playlist/-147845620_2949";
pub const MISSING_URL: &str = "https://vk.com/music/playlist/264577489_28";

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

/// HTTP client that serves saved pages instead of hitting vk.com.
///
/// Pages can be swapped while a test runs to simulate a changing listen
/// count; unknown URLs get a 404.
#[derive(Debug, Clone, Default)]
pub struct FixtureClient {
    pages: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: String) {
        self.pages.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FixtureClient {
    async fn send(&self, req: Request) -> Result<Response, Error> {
        let url = req.url().to_string();
        self.requests.lock().unwrap().push(url.clone());

        let body = self.pages.lock().unwrap().get(&url).cloned();
        let mut response = match body {
            Some(body) => {
                let mut response = Response::new(StatusCode::Ok);
                response.set_body(body);
                response
            }
            None => Response::new(StatusCode::NotFound),
        };
        response.insert_header("Content-Type", "text/html; charset=utf-8");
        Ok(response)
    }
}

/// Fixture client preloaded with the album, playlist and error pages.
pub fn fixture_client() -> FixtureClient {
    let client = FixtureClient::new();
    client.serve(ALBUM_URL, fixture("album_page.html"));
    client.serve(PLAYLIST_URL, fixture("playlist_page.html"));
    client.serve(MISSING_URL, fixture("missing_page.html"));
    client
}

pub fn fixture_scraper(client: &FixtureClient) -> VkScraper<HttpPageLoader> {
    VkScraper::new(HttpPageLoader::new(Box::new(client.clone())))
}
