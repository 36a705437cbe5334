use crate::addresses::SharedStreetAddressLineRepository;
use anyhow::Result;
use axum::{
    body::Body,
    extract::Extension,
    http::{uri::PathAndQuery, HeaderName, HeaderValue, Method, Request, Uri},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::{util::MapRequest, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePath,
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug, debug_span, info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use handlers::street_address_lines::{
    ControllerError, StreetAddressLinesController, RESOURCE_PATH,
};
pub use openapi::openapi;

const REQUEST_ID: &str = "x-request-id";

/// Build the application router around `repository`.
///
/// Resource paths match case-insensitively and a trailing slash is ignored, so
/// `/api/StreetAddressLines/1/` reaches the same handler as `/api/streetaddresslines/1`.
///
/// # Errors
/// Returns an error if the controller cannot be constructed.
pub fn router(repository: SharedStreetAddressLineRepository) -> Result<Router> {
    let controller = StreetAddressLinesController::builder()
        .logger(info_span!("street_address_lines"))
        .repository(repository.clone())
        .build()?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_origin(Any);

    let item_path = format!("{RESOURCE_PATH}/:id");

    let routes = Router::new()
        .route(
            &item_path,
            get(handlers::street_address_lines::get_street_address_line)
                .head(handlers::street_address_lines::head_street_address_line),
        )
        .route(
            RESOURCE_PATH,
            post(handlers::street_address_lines::post_street_address_line),
        )
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(Arc::new(controller)))
                .layer(Extension(repository)),
        );

    // paths are rewritten before the inner router picks a route
    let normalized = NormalizePath::trim_trailing_slash(MapRequest::new(
        routes,
        lowercase_resource_path as fn(Request<Body>) -> Request<Body>,
    ));

    Ok(Router::new().fallback_service(normalized))
}

/// Lowercase the path of requests addressed to the resource, whatever its casing.
fn lowercase_resource_path(mut request: Request<Body>) -> Request<Body> {
    let path = request.uri().path();
    let prefix = RESOURCE_PATH.as_bytes();

    let is_resource = path.len() >= prefix.len()
        && path.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
        && matches!(path.as_bytes().get(prefix.len()), None | Some(b'/'));

    if !is_resource || !path.bytes().any(|b| b.is_ascii_uppercase()) {
        return request;
    }

    let lowered = match request.uri().query() {
        Some(query) => format!("{}?{query}", path.to_ascii_lowercase()),
        None => path.to_ascii_lowercase(),
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = match PathAndQuery::try_from(lowered) {
        Ok(path_and_query) => Some(path_and_query),
        Err(err) => {
            debug!("Failed to lowercase request path: {}", err);
            return request;
        }
    };

    match Uri::from_parts(parts) {
        Ok(uri) => *request.uri_mut() = uri,
        Err(err) => debug!("Failed to rebuild request uri: {}", err),
    }

    request
}

/// Serve the API on `[::]:{port}` until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn new(port: u16, repository: SharedStreetAddressLineRepository) -> Result<()> {
    let app = router(repository)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, ?headers, request_id)
}
