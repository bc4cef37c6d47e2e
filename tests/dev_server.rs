//! End-to-end tests against a running dev server.

use std::sync::atomic::Ordering;
use std::time::Duration;

use comments_dev_server::config::{load_config, DevServerConfig, RouteConfig};
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_root_redirects_to_register() {
    let (backend, _) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/register");
}

#[tokio::test]
async fn test_following_root_lands_on_register_page() {
    let (backend, _) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client.get(server.url("/?ref=mail")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.url().path(), "/register");
    assert_eq!(res.url().query(), Some("ref=mail"));
    assert!(res.text().await.unwrap().contains("data-component=\"RegisterPage\""));
}

#[tokio::test]
async fn test_each_page_path_renders_its_own_component() {
    let (backend, hits) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;
    let client = common::client();

    for (path, component) in [
        ("/register", "RegisterPage"),
        ("/login", "LoginPage"),
        ("/comments", "CommentsPage"),
    ] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert!(res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let body = res.text().await.unwrap();
        assert!(
            body.contains(&format!("data-component=\"{component}\"")),
            "{path} should render {component}"
        );
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0, "pages are never proxied");
}

#[tokio::test]
async fn test_page_lookup_ignores_case_and_trailing_slash() {
    let (backend, hits) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;
    let client = common::client();

    let res = client.get(server.url("/LOGIN/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("data-component=\"LoginPage\""));

    let res = client.head(server.url("/Comments")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (backend, hits) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;

    let res = common::client().get(server.url("/unknown")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_media_forwarded_with_rewritten_host() {
    let (backend, hits) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;

    let res = common::client()
        .get(server.url("/media/avatars/1.png?size=64"))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "trace-42");

    let body = res.text().await.unwrap();
    assert!(body.contains("method=GET"), "{body}");
    assert!(body.contains("target=/media/avatars/1.png?size=64"), "{body}");
    assert!(body.contains(&format!("host={backend}")), "{body}");
    assert!(body.contains("request_id=trace-42"), "{body}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_host_preserved_without_change_origin() {
    let (backend, _) = common::start_echo_backend().await;
    let mut config = common::config_for(backend);
    config.proxy[0].change_origin = false;
    let server = common::start_server(config).await;

    let body = common::client()
        .get(server.url("/media/x"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains(&format!("host={}", server.addr)), "{body}");
}

#[tokio::test]
async fn test_xfwd_adds_client_address() {
    let (backend, _) = common::start_echo_backend().await;
    let mut config = common::config_for(backend);
    config.proxy[0].xfwd = true;
    let server = common::start_server(config).await;

    let body = common::client()
        .get(server.url("/media/x"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("forwarded_for=127.0.0.1"), "{body}");
}

#[tokio::test]
async fn test_media_upload_body_streamed() {
    let (backend, _) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;

    let res = common::client()
        .post(server.url("/media/upload"))
        .body("avatar-bytes")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("method=POST"), "{body}");
    assert!(body.contains("body=avatar-bytes"), "{body}");
}

#[tokio::test]
async fn test_non_media_paths_not_forwarded() {
    let (backend, hits) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;
    let client = common::client();

    for path in ["/", "/login", "/comments", "/api/comments", "/static/media/x"] {
        let _ = client.get(server.url(path)).send().await.unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let backend = common::closed_addr().await;
    let server = common::start_server(common::config_for(backend)).await;

    let res = common::client().get(server.url("/media/x")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_upstream_is_gateway_timeout() {
    let backend = common::start_slow_backend(Duration::from_secs(3)).await;
    let mut config = common::config_for(backend);
    config.timeouts.upstream_secs = 1;
    let server = common::start_server(config).await;

    let res = common::client().get(server.url("/media/x")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_config_update_swaps_route_table() {
    let (backend, _) = common::start_echo_backend().await;
    let config = common::config_for(backend);
    let server = common::start_server(config.clone()).await;

    let mut next = config;
    next.routes.retain(|r| r.path != "/");
    next.routes.push(RouteConfig::redirect("/", "/login"));
    server.updates.send(next).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.headers()["location"], "/login");
}

#[tokio::test]
async fn test_graceful_shutdown_stops_listener() {
    let (backend, _) = common::start_echo_backend().await;
    let server = common::start_server(common::config_for(backend)).await;
    let url = server.url("/login");

    assert!(common::client().get(&url).send().await.is_ok());

    drop(server);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(common::client().get(&url).send().await.is_err());
}

#[test]
fn test_sample_config_file_matches_builtin() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("devserver.toml");
    let config = load_config(&path).unwrap();
    let builtin = DevServerConfig::default();

    assert_eq!(config.routes, builtin.routes);
    assert_eq!(config.proxy, builtin.proxy);
}
