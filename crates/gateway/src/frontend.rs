//! Landing page and static Mini App assets.
//!
//! The landing page is compiled into the binary; everything under `/static`
//! is served from the configured directory.

use axum::{Router, response::Html, routing::get};
use tower_http::services::ServeDir;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>SEO Bot</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
</head>
<body>
    <h1>SEO Assistant Bot</h1>
    <p>Open this page inside the Telegram Mini App.</p>
    <script src="https://telegram.org/js/telegram-web-app.js"></script>
</body>
</html>
"#;

/// Build a router serving the landing page and `static_dir` under `/static`.
pub fn frontend_router<S>(static_dir: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index_handler))
        .nest_service("/static", ServeDir::new(static_dir))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn serves_index_html() {
        let app: Router = frontend_router("static");

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("<!DOCTYPE html>"));
        assert!(text.contains("telegram-web-app.js"));
    }

    #[tokio::test]
    async fn serves_static_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('seo');").unwrap();
        let app: Router = frontend_router(dir.path().to_str().unwrap());

        let req = Request::builder()
            .uri("/static/app.js")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn missing_static_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app: Router = frontend_router(dir.path().to_str().unwrap());

        let req = Request::builder()
            .uri("/static/nope.css")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
