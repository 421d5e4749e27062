use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>, static_dir: &str) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        // Health
        .route("/health", get(handlers::healthcheck))
        // Template routes
        .route("/api/templates", get(handlers::templates::list_templates))
        .route("/api/templates/move", post(handlers::templates::move_template))
        .route("/api/templates/:category", get(handlers::templates::list_category_templates))
        .route("/api/templates/:category/:file/move", get(handlers::templates::move_options))
        .route("/api/overview", get(handlers::templates::overview))
        .route("/template/:category/:name", get(handlers::templates::get_template))
        .route("/render", post(handlers::templates::render))
        .route("/search", get(handlers::search::search_templates))
        // File routes
        .route("/download/:category/:name", get(handlers::files::download_template))
        .route("/preview/:category/:name", get(handlers::files::preview_template))
        .route("/bulk-download", post(handlers::files::bulk_download))
        .route("/upload", post(handlers::files::upload_template))
        // Category routes
        .route(
            "/api/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route("/create-category", post(handlers::categories::create_category))
        .route(
            "/api/categories/:id",
            put(handlers::categories::update_category).delete(handlers::categories::delete_category),
        )
        // Catalyst Center routes
        .route("/api/catalyst/devices", get(handlers::catalyst::get_devices))
        .route("/api/catalyst/sites", get(handlers::catalyst::get_sites))
        .route("/api/catalyst/health", get(handlers::catalyst::get_network_health))
        .route("/api/catalyst/templates", get(handlers::catalyst::get_templates))
        .route("/api/catalyst/deploy", post(handlers::catalyst::deploy_template))
        // Static files (frontend)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(format!("{}/index.html", static_dir))),
        )
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::store::Store;

    struct TestApp {
        router: Router,
        dir: TempDir,
    }

    impl TestApp {
        async fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let templates_dir = dir.path().join("templates");
            let categories_file = dir.path().join("data/categories.json");
            let static_dir = dir.path().join("static");
            std::fs::create_dir_all(&static_dir).unwrap();
            std::fs::write(static_dir.join("index.html"), "<html>catalog</html>").unwrap();

            let store = Store::new(&templates_dir, &categories_file);
            store.init().await.unwrap();

            let config = Config {
                listen_addr: "127.0.0.1:0".into(),
                templates_dir: templates_dir.display().to_string(),
                categories_file: categories_file.display().to_string(),
                static_dir: static_dir.display().to_string(),
                max_upload_bytes: 1024 * 1024,
                catalyst: None,
            };
            let state = Arc::new(AppState {
                store,
                config: config.clone(),
                catalyst: None,
            });

            Self {
                router: build(state, &config.static_dir),
                dir,
            }
        }

        fn templates(&self) -> std::path::PathBuf {
            self.dir.path().join("templates")
        }

        fn write(&self, category: &str, filename: &str, content: &str) {
            let dir = self.templates().join(category);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(filename), content).unwrap();
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, headers, body.to_vec())
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let (status, _, body) = self.send(req).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }

        async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let (status, _, body) = self.send(req).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }

    const SWITCH: &str = "template_name: Access Switch\ntemplate_description: Campus access\nauthor: NetOps\nversion: \"1.2\"\nconfiguration:\n  - hostname {{ hostname }}\n  - \"!\"\n";

    fn multipart(filename: &str, content: &str, category: Option<&str>) -> Request<Body> {
        let boundary = "catalog-test-boundary";
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{c}\r\n",
            b = boundary,
            f = filename,
            c = content
        );
        if let Some(category) = category {
            body.push_str(&format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{c}\r\n",
                b = boundary,
                c = category
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_and_detail() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);
        app.write("security", "acl.json", r#"{"name": "ACL", "templateContent": "ip access-list extended X"}"#);

        let (status, body) = app.get("/api/templates").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = app.get("/api/templates/security").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["template_name"], "ACL");
        assert_eq!(body[0]["file_type"], "json");

        let (status, _) = app.get("/api/templates/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.get("/template/network/switch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["template_name"], "Access Switch");
        assert_eq!(body["category"], "network");

        let (status, body) = app.get("/template/network/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_render_success_and_embedded_error() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);

        let (status, body) = app
            .json(
                "POST",
                "/render",
                json!({"template_name": "switch", "category": "network", "parameters": {"hostname": "SW1"}}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["rendered_config"], "hostname SW1\n!");
        assert_eq!(body["template_name"], "switch");

        let (status, body) = app
            .json(
                "POST",
                "/render",
                json!({"template_name": "switch", "category": "network", "parameters": {}}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["rendered_config"]
            .as_str()
            .unwrap()
            .starts_with("Error rendering template:"));
        assert!(body["error"].is_string());

        let (status, _) = app
            .json("POST", "/render", json!({"template_name": "nope", "category": "network"}))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.json("POST", "/render", json!({"category": "network"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_redirects_when_unfiltered() {
        let app = TestApp::new().await;
        let req = Request::get("/search?sort=version&order=desc").body(Body::empty()).unwrap();
        let (status, headers, _) = app.send(req).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_search_groups_results() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);
        app.write("monitoring", "snmp.yaml", "template_name: SNMP\nauthor: netops-team\n");
        app.write("security", "acl.json", r#"{"name": "ACL", "author": "SecOps"}"#);

        let (status, body) = app.get("/search?author=netops&type=yaml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["categories"]["network"][0]["template_name"], "Access Switch");
        assert_eq!(body["categories"]["monitoring"][0]["template_name"], "SNMP");
        assert!(body["categories"].get("security").is_none());

        let (status, body) = app.get("/search?q=snmp&category=ghost").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_results"], 0);
    }

    #[tokio::test]
    async fn test_download_and_preview() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);

        let req = Request::get("/download/network/switch").body(Body::empty()).unwrap();
        let (status, headers, body) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"switch.yaml\""
        );
        assert_eq!(body, SWITCH.as_bytes());

        let (status, body) = app.get("/preview/network/switch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], SWITCH);
        assert_eq!(body["filename"], "switch.yaml");
        assert_eq!(body["file_type"], "yaml");

        let (status, _) = app.get("/preview/ghost/switch").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.get("/download/network/router").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_download_skips_unresolvable_ids() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);

        let req = Request::post("/bulk-download")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"templates": ["network:switch", "security:nope", "malformed", "ghost:switch"]})
                    .to_string(),
            ))
            .unwrap();
        let (status, headers, body) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"templates_bulk_4_files.zip\""
        );

        let mut archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut content = String::new();
        archive
            .by_name("network/switch.yaml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, SWITCH);

        let (status, _) = app.json("POST", "/bulk-download", json!({"templates": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_template() {
        let app = TestApp::new().await;
        app.write("network", "switch.yaml", SWITCH);
        app.write("security", "switch.yaml", "template_name: Other\n");
        app.write("network", "router.yaml", "template_name: Router\n");

        let (status, _) = app
            .json(
                "POST",
                "/api/templates/move",
                json!({"template_name": "switch.yaml", "from_category": "network", "to_category": "security"}),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(app.templates().join("network/switch.yaml").exists());

        let (status, _) = app
            .json(
                "POST",
                "/api/templates/move",
                json!({"template_name": "router.yaml", "from_category": "network", "to_category": "network"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .json(
                "POST",
                "/api/templates/move",
                json!({"template_name": "router.yaml", "from_category": "network", "to_category": "ghost"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .json(
                "POST",
                "/api/templates/move",
                json!({"template_name": "absent.yaml", "from_category": "network", "to_category": "automation"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .json(
                "POST",
                "/api/templates/move",
                json!({"template_name": "router.yaml", "from_category": "network", "to_category": "automation"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(app.templates().join("automation/router.yaml").exists());
        assert!(!app.templates().join("network/router.yaml").exists());
    }

    #[tokio::test]
    async fn test_move_options_exclude_current_category() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api/templates/network/switch/move").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_category"], "network");
        let available = body["available_categories"].as_object().unwrap();
        assert!(!available.contains_key("network"));
        assert_eq!(available["security"]["display_name"], "Security");
        assert_eq!(available.len(), 4);
    }

    #[tokio::test]
    async fn test_upload() {
        let app = TestApp::new().await;

        let (status, _, body) = app
            .send(multipart("Edge Router.yml", "template_name: Edge\n", Some("network")))
            .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["filename"], "Edge_Router.yaml");
        assert_eq!(body["category"], "network");
        assert!(app.templates().join("network/Edge_Router.yaml").exists());

        let (status, _, _) = app
            .send(multipart("Edge Router.yml", "template_name: Again\n", Some("network")))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, body) = app.send(multipart("notes.json", "{\"name\": \"n\"}", None)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["category"], "community");

        let (status, _, _) = app.send(multipart("notes.txt", "hello", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = app.send(multipart("x.yaml", "a: b", Some("ghost"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let app = TestApp::new().await;

        let (status, body) = app
            .json("POST", "/api/categories", json!({"name": "  Data-Center ", "description": "DC fabric"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["category"]["name"], "data-center");
        assert_eq!(body["category"]["display_name"], "Data-Center");
        assert_eq!(body["category"]["icon"], "fas fa-folder");

        let (status, _) = app.json("POST", "/create-category", json!({"name": "data-center"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = app.json("POST", "/api/categories", json!({"name": "bad_name"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .json("PUT", "/api/categories/data-center", json!({"color": "danger"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["color"], "danger");
        assert_eq!(body["category"]["description"], "DC fabric");
        assert!(body["category"]["updated_at"].is_string());

        let (status, body) = app.get("/api/categories").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data-center"]["color"], "danger");

        app.write("data-center", "leaf.yaml", "template_name: Leaf\n");
        let (status, body) = app.get("/api/overview").await;
        assert_eq!(status, StatusCode::OK);
        let tile = body
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["id"] == "data-center")
            .cloned()
            .unwrap();
        assert_eq!(tile["count"], 1);

        let req = Request::delete("/api/categories/data-center").body(Body::empty()).unwrap();
        let (status, _, _) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(app.templates().join("community/leaf.yaml").exists());
        assert!(!app.templates().join("data-center").exists());

        let (status, _) = app.get("/api/templates/data-center").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = Request::delete("/api/categories/network").body(Body::empty()).unwrap();
        let (status, _, _) = app.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.json("PUT", "/api/categories/ghost", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_catalyst_unconfigured() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api/catalyst/devices").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_static_fallback_serves_index() {
        let app = TestApp::new().await;
        let req = Request::get("/").body(Body::empty()).unwrap();
        let (status, _, body) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>catalog</html>");
    }
}
