use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use relreg_core::{
    error::{BuildError, ErrorContext},
    layout::package_document,
    BuildResult,
};
use relreg_events::Domain;
use relreg_operations::BuildOptions;
use relreg_registry::{canonical::is_safe_segment, CanonicalId, JSON_EXTENSION};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::build::run_build;

struct ServeState {
    root: PathBuf,
}

/// Maps a request path to a file below the output tree.
///
/// `/packages/<canonical>/<version>` accepts the canonical id raw
/// (`npm:@sentry/react`) or percent-encoded (`npm%3A%40sentry%2Freact`).
/// Every other path maps to `<path>.json`. Returns `None` for an empty path
/// or one that would leave the output tree.
pub fn resolve_request_path(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let trimmed = decoded.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if let [domain, canonical @ .., version] = segments.as_slice() {
        let is_canonical = canonical.first().is_some_and(|s| s.contains(':'));
        if *domain == Domain::Packages.as_str() && is_canonical {
            let id = CanonicalId::parse(&canonical.join("/")).ok()?;
            let version = version.strip_suffix(JSON_EXTENSION).unwrap_or(*version);
            if !is_safe_segment(version) {
                return None;
            }
            return Some(package_document(&id, version));
        }
    }

    if !segments.iter().all(|segment| is_safe_segment(segment)) {
        return None;
    }
    if trimmed.ends_with(JSON_EXTENSION) {
        Some(trimmed.to_string())
    } else {
        Some(format!("{trimmed}{JSON_EXTENSION}"))
    }
}

pub fn router<P: Into<PathBuf>>(root: P) -> Router {
    let state = Arc::new(ServeState {
        root: root.into(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback(serve_document)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn serve_document(
    State(state): State<Arc<ServeState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let Some(relative) = resolve_request_path(uri.path()) else {
        return not_found();
    };

    let path = state.root.join(&relative);
    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "failed to read document: {err}");
            }
            not_found()
        }
    }
}

/// Builds the registry unless `skip_build` is set, then serves the output
/// tree until interrupted.
pub async fn serve(
    options: BuildOptions,
    host: &str,
    port: u16,
    skip_build: bool,
) -> BuildResult<()> {
    let output = options.output.clone();

    if skip_build {
        if !output.is_dir() {
            return Err(BuildError::Custom(format!(
                "Output directory {} does not exist, run `relreg build` first",
                output.display()
            )));
        }
    } else {
        tokio::task::spawn_blocking(move || run_build(options))
            .await
            .map_err(|err| BuildError::Custom(format!("Build task failed: {err}")))??;
    }

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Serving {} on http://{addr}", output.display());

    axum::serve(listener, router(output))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "serving HTTP requests".to_string())?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_resolve_package_paths() {
        assert_eq!(
            resolve_request_path("/packages/npm%3A%40sentry%2Freact/latest").as_deref(),
            Some("packages/npm/@sentry/react/latest.json")
        );
        assert_eq!(
            resolve_request_path("/packages/npm:@sentry/react/versions").as_deref(),
            Some("packages/npm/@sentry/react/versions.json")
        );
        assert_eq!(
            resolve_request_path("/packages/maven:io.sentry:sentry/6.0.0").as_deref(),
            Some("packages/maven/io.sentry/sentry/6.0.0.json")
        );
        assert_eq!(
            resolve_request_path("/packages/pypi:sentry-sdk/1.0.0.json").as_deref(),
            Some("packages/pypi/sentry-sdk/1.0.0.json")
        );
    }

    #[test]
    fn test_resolve_plain_paths() {
        assert_eq!(
            resolve_request_path("/sdks/sentry.javascript.react/versions").as_deref(),
            Some("sdks/sentry.javascript.react/versions.json")
        );
        assert_eq!(
            resolve_request_path("/apps/sentry-cli/latest").as_deref(),
            Some("apps/sentry-cli/latest.json")
        );
        assert_eq!(
            resolve_request_path("/marketing-slugs/react").as_deref(),
            Some("marketing-slugs/react.json")
        );
        assert_eq!(
            resolve_request_path("/packages").as_deref(),
            Some("packages.json")
        );
        assert_eq!(
            resolve_request_path("/packages/npm/react/latest").as_deref(),
            Some("packages/npm/react/latest.json")
        );
        assert_eq!(
            resolve_request_path("/sdks.json").as_deref(),
            Some("sdks.json")
        );
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        assert_eq!(resolve_request_path("/"), None);
        assert_eq!(resolve_request_path(""), None);
        assert_eq!(resolve_request_path("/../etc/passwd"), None);
        assert_eq!(resolve_request_path("/sdks/%2E%2E/latest"), None);
        assert_eq!(resolve_request_path("/packages/npm:../x/latest"), None);
        assert_eq!(resolve_request_path("/packages/npm:react/.."), None);
        assert_eq!(resolve_request_path("/apps//latest"), None);
    }

    fn output_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/npm/@sentry/react")).unwrap();
        fs::write(root.join("packages.json"), r#"{"npm:@sentry/react":{}}"#).unwrap();
        fs::write(
            root.join("packages/npm/@sentry/react/latest.json"),
            r#"{"version":"7.0.0"}"#,
        )
        .unwrap();
        dir
    }

    async fn get_path(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_healthz() {
        let dir = output_tree();
        let (status, _, body) = get_path(router(dir.path()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_serves_documents() {
        let dir = output_tree();

        let (status, content_type, body) =
            get_path(router(dir.path()), "/packages/npm%3A%40sentry%2Freact/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, r#"{"version":"7.0.0"}"#);

        let (status, _, body) = get_path(router(dir.path()), "/packages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"npm:@sentry/react":{}}"#);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let dir = output_tree();
        let (status, _, body) = get_path(router(dir.path()), "/sdks/unknown/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not found");
    }
}
