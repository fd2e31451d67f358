#![allow(dead_code)]

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use virtual_tourist::config::FlickrConfig;
use virtual_tourist::db::{create_pool, run_migrations};
use virtual_tourist::http_client::HttpClient;
use virtual_tourist::storage::LocalImageStore;
use virtual_tourist::App;

pub const API_KEY: &str = "test-api-key";

/// What the stub answers to the next searches.
#[derive(Debug, Clone)]
pub enum SearchReply {
    /// `count` photos out of `pages` pages. Photos at the `broken` positions
    /// point at images that answer 404.
    Page {
        pages: u32,
        count: usize,
        broken: Vec<usize>,
    },
    Failure { code: i64, message: String },
    Status(u16),
}

impl SearchReply {
    pub fn page(pages: u32, count: usize) -> Self {
        SearchReply::Page {
            pages,
            count,
            broken: Vec::new(),
        }
    }
}

struct StubState {
    reply: SearchReply,
    queries: Vec<String>,
    image_requests: usize,
    next_image: usize,
    missing_images: HashSet<String>,
}

/// Local stand-in for the Flickr REST endpoint and its image host.
pub struct StubFlickr {
    origin: String,
    state: Arc<Mutex<StubState>>,
}

impl StubFlickr {
    pub async fn start(reply: SearchReply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(StubState {
            reply,
            queries: Vec::new(),
            image_requests: 0,
            next_image: 0,
            missing_images: HashSet::new(),
        }));

        let server_state = state.clone();
        let server_origin = origin.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = server_state.clone();
                let origin = server_origin.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let response = respond(&req, &state, &origin);
                        async move { Ok::<_, Infallible>(response) }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { origin, state }
    }

    pub fn base_url(&self) -> String {
        format!("{}/services/rest/", self.origin)
    }

    pub fn set_reply(&self, reply: SearchReply) {
        self.state.lock().unwrap().reply = reply;
    }

    /// Raw query strings of every search request, oldest first.
    pub fn search_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    /// `page` parameter of every search request.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.search_queries()
            .iter()
            .map(|query| {
                query_value(query, "page")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn image_requests(&self) -> usize {
        self.state.lock().unwrap().image_requests
    }

    /// Let every previously broken image download succeed.
    pub fn repair_images(&self) {
        self.state.lock().unwrap().missing_images.clear();
    }
}

pub fn query_value(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

pub fn image_bytes(path: &str) -> Vec<u8> {
    format!("jpeg:{}", path).into_bytes()
}

fn respond<B>(req: &Request<B>, state: &Mutex<StubState>, origin: &str) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    let mut state = state.lock().unwrap();

    if path.starts_with("/services/rest") {
        state.queries.push(req.uri().query().unwrap_or_default().to_string());
        return match state.reply.clone() {
            SearchReply::Page {
                pages,
                count,
                broken,
            } => {
                let mut photos = Vec::with_capacity(count);
                for position in 0..count {
                    state.next_image += 1;
                    let image_path = format!("/images/{}.jpg", state.next_image);
                    if broken.contains(&position) {
                        state.missing_images.insert(image_path.clone());
                    }
                    photos.push(json!({
                        "id": state.next_image.to_string(),
                        "title": format!("photo {}", state.next_image),
                        "url_m": format!("{}{}", origin, image_path),
                    }));
                }
                let page = req
                    .uri()
                    .query()
                    .and_then(|q| query_value(q, "page"))
                    .unwrap_or_else(|| "1".into());
                json_response(
                    StatusCode::OK,
                    json!({
                        "photos": {
                            "page": page.parse::<u32>().unwrap_or(1),
                            "pages": pages,
                            "perpage": 21,
                            "photo": photos,
                        },
                        "stat": "ok",
                    }),
                )
            }
            SearchReply::Failure { code, message } => json_response(
                StatusCode::OK,
                json!({ "stat": "fail", "code": code, "message": message }),
            ),
            SearchReply::Status(code) => Response::builder()
                .status(code)
                .body(Full::new(Bytes::from_static(b"<html>unavailable</html>")))
                .unwrap(),
        };
    }

    if path.starts_with("/images/") {
        state.image_requests += 1;
        if state.missing_images.contains(&path) {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::new()))
                .unwrap();
        }
        return Response::builder()
            .header("content-type", "image/jpeg")
            .body(Full::new(Bytes::from(image_bytes(&path))))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

pub struct TestApp {
    pub app: App,
    pub stub: StubFlickr,
    pub documents: TempDir,
}

impl TestApp {
    pub async fn start(reply: SearchReply) -> Self {
        let stub = StubFlickr::start(reply).await;
        let documents = TempDir::new().unwrap();

        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let images = LocalImageStore::new(documents.path().to_path_buf())
            .await
            .unwrap();
        let http = HttpClient::new(stub.base_url(), Duration::from_secs(5)).unwrap();
        let flickr = FlickrConfig::new(API_KEY, stub.base_url());

        let app = App::assemble(pool, Arc::new(images), http, flickr)
            .await
            .unwrap();

        Self {
            app,
            stub,
            documents,
        }
    }

    /// Files currently in the documents directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.documents.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
