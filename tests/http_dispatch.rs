//! HTTP dispatch through the route registry.

use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use route_registry::config::FallbackMode;
use route_registry::http::{HttpServer, X_REQUEST_ID};
use route_registry::routing::{NamedHandler, RouteRegistry, NOT_FOUND};

mod common;

async fn get(server: &HttpServer, uri: &str) -> Response {
    server
        .app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_registered_path_returns_handler_body() {
    let server = HttpServer::new(common::config_with_routes(&[
        ("/home", "Strona główna"),
        ("/about", "O nas"),
    ]));

    let response = get(&server, "/home").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, "Strona główna");

    let response = get(&server, "/about").await;
    assert_eq!(body_text(response).await, "O nas");
}

#[tokio::test]
async fn test_unknown_path_returns_sentinel() {
    let server = HttpServer::new(common::config_with_routes(&[("/home", "Strona główna")]));

    let response = get(&server, "/xxx").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, NOT_FOUND);
    assert_eq!(server.registry().len(), 1);
}

#[tokio::test]
async fn test_root_path_dispatches() {
    let server = HttpServer::new(common::config_with_routes(&[("/", "root")]));
    let response = get(&server, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "root");
}

#[tokio::test]
async fn test_request_id_assigned_and_propagated() {
    let server = HttpServer::new(common::config_with_routes(&[]));

    let response = get(&server, "/anything").await;
    assert!(response.headers().contains_key(X_REQUEST_ID));

    let response = server
        .app()
        .oneshot(
            Request::builder()
                .uri("/anything")
                .header(X_REQUEST_ID, "client-chosen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "client-chosen");
}

#[tokio::test]
async fn test_echo_fallback() {
    let mut config = common::config_with_routes(&[("/home", "Strona główna")]);
    config.fallback.mode = FallbackMode::Echo;
    let server = HttpServer::new(config);

    let response = get(&server, "/some/path?x=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Requested path: /some/path?x=1\nPath length: 14"
    );

    let response = get(&server, "/home").await;
    assert_eq!(body_text(response).await, "Strona główna");
}

#[tokio::test]
async fn test_code_registered_handlers() {
    let mut registry = RouteRegistry::new();
    registry.register("/contact", NamedHandler::new("contact", || "Kontakt".to_string()));
    let server = HttpServer::with_registry(common::config_with_routes(&[]), registry);

    let response = get(&server, "/contact").await;
    assert_eq!(body_text(response).await, "Kontakt");
}

#[tokio::test]
async fn test_handler_returning_sentinel_text_is_still_a_hit() {
    let mut registry = RouteRegistry::new();
    registry.register("/odd", || NOT_FOUND.to_string());
    let server = HttpServer::with_registry(common::config_with_routes(&[]), registry);

    let response = get(&server, "/odd").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "zażółć").unwrap();
    std::fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();

    let mut config = common::config_with_routes(&[("/static/notes.txt", "from registry")]);
    config.files.enabled = true;
    config.files.mount = "/static".into();
    config.files.root = dir.path().to_string_lossy().into_owned();
    let server = HttpServer::new(config);

    // Registry takes precedence over files.
    let response = get(&server, "/static/notes.txt").await;
    assert_eq!(body_text(response).await, "from registry");

    let response = get(&server, "/static/data.bin").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );

    let response = get(&server, "/static/../secret").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&server, "/static/missing.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, NOT_FOUND);
}

#[tokio::test]
async fn test_served_over_socket_with_reload() {
    let server = common::start_server(common::config_with_routes(&[("/home", "Strona główna")])).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/home", server.addr))
        .send()
        .await
        .expect("Server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Strona główna");

    server
        .config_updates
        .send(common::config_with_routes(&[("/home", "Nowa strona"), ("/about", "O nas")]))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client
        .get(format!("http://{}/home", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "Nowa strona");

    let res = client
        .get(format!("http://{}/about", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("Server did not stop");
    assert!(result.unwrap().is_ok());
}

#[tokio::test]
async fn test_percent_encoded_paths_are_decoded() {
    let server = HttpServer::new(common::config_with_routes(&[
        ("/żółw", "turtle"),
        ("/a b", "space"),
    ]));

    let response = get(&server, "/%C5%BC%C3%B3%C5%82w").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "turtle");

    let response = get(&server, "/a%20b").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "space");

    // Undecodable bytes fall back to the raw path and miss.
    let response = get(&server, "/%FF").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn files_config(root: &std::path::Path) -> route_registry::RouterConfig {
    let mut config = common::config_with_routes(&[]);
    config.files.enabled = true;
    config.files.mount = "/static".into();
    config.files.root = root.to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn test_static_file_with_encoded_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("my notes.txt"), "notatki").unwrap();
    let server = HttpServer::new(files_config(dir.path()));

    let response = get(&server, "/static/my%20notes.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "notatki");

    // Encoded dot segments are still refused after decoding.
    let response = get(&server, "/static/%2E%2E/secret").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(&server, "/static/..%5Csecret").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_listing_without_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("a.txt"), "a").unwrap();
    let server = HttpServer::new(files_config(dir.path()));

    let response = get(&server, "/static/sub/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let html = body_text(response).await;
    assert!(html.contains(r#"<a href="/static/sub/a.txt">a.txt</a>"#));

    let response = get(&server, "/static/sub/a.txt").await;
    assert_eq!(body_text(response).await, "a");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_limit_shared_across_routes() {
    let slow = || {
        std::thread::sleep(Duration::from_millis(300));
        "slow".to_string()
    };
    let mut registry = RouteRegistry::new();
    registry.register("/", slow);
    registry.register("/x", slow);

    let mut config = common::config_with_routes(&[]);
    config.listener.max_connections = 1;
    let app = HttpServer::with_registry(config, registry).app();

    let start = Instant::now();
    let requests: Vec<_> = ["/", "/x"]
        .into_iter()
        .map(|uri| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::OK);
    }

    // "/" and "/{*path}" are separate axum routes; one permit serves both.
    assert!(start.elapsed() >= Duration::from_millis(550));
}

#[tokio::test]
async fn test_code_registered_handlers_survive_reload() {
    let mut registry = RouteRegistry::new();
    registry.register("/contact", NamedHandler::new("contact", || "Kontakt".to_string()));
    let server = HttpServer::with_registry(
        common::config_with_routes(&[("/home", "Strona główna")]),
        registry,
    );
    let server = common::start(server).await;
    let client = common::client();
    let url = |path: &str| format!("http://{}{}", server.addr, path);

    let res = client.get(url("/home")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "Strona główna");

    server
        .config_updates
        .send(common::config_with_routes(&[("/about", "O nas")]))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(url("/contact")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Kontakt");

    let res = client.get(url("/about")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "O nas");

    // Routes dropped from the config are gone.
    let res = client.get(url("/home")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.shutdown.trigger();
}
