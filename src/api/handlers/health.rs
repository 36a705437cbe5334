use crate::{addresses::SharedStreetAddressLineRepository, GIT_COMMIT_HASH};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

const HEALTH_DB_TIMEOUT_SECONDS: u64 = 2;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Repository is healthy", body = Health),
        (status = 503, description = "Repository is unhealthy", body = Health)
    ),
    tag = "health",
)]
/// Report build metadata and repository connectivity.
///
/// Only `GET` carries the JSON body; `HEAD` and `OPTIONS` get the status and `X-App` header.
pub async fn health(
    method: Method,
    repository: Extension<SharedStreetAddressLineRepository>,
) -> impl IntoResponse {
    let db_healthy = probe_repository(&repository.0).await;

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if db_healthy {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let headers = format!(
        "{}:{}:{}",
        health.name,
        health.version,
        short_commit(&health.commit)
    )
    .parse::<HeaderValue>()
    .map(|x_app_header_value| {
        debug!("X-App header: {:?}", x_app_header_value);

        let mut headers = HeaderMap::new();
        headers.insert("x-app", x_app_header_value);
        headers
    })
    .map_err(|err| {
        debug!("Failed to parse X-App header: {}", err);
    })
    .unwrap_or_else(|()| HeaderMap::new());

    if db_healthy {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

async fn probe_repository(repository: &SharedStreetAddressLineRepository) -> bool {
    match timeout(
        Duration::from_secs(HEALTH_DB_TIMEOUT_SECONDS),
        repository.ping(),
    )
    .await
    {
        Ok(Ok(())) => {
            debug!("Repository is healthy");
            true
        }
        Ok(Err(err)) => {
            error!("Repository health check failed: {err:#}");
            false
        }
        Err(_) => {
            warn!("Repository health check timed out");
            false
        }
    }
}

fn short_commit(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[0..7]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::{InMemoryRepository, Repository, StreetAddressLine};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use std::sync::Arc;

    struct DownRepository;

    #[async_trait]
    impl Repository<StreetAddressLine, i32> for DownRepository {
        async fn find(&self, _key: i32) -> Result<Option<StreetAddressLine>> {
            Err(anyhow!("down"))
        }

        async fn add(&self, _entity: StreetAddressLine) -> Result<StreetAddressLine> {
            Err(anyhow!("down"))
        }

        async fn ping(&self) -> Result<()> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn healthy_get_returns_json() -> Result<()> {
        let repository: SharedStreetAddressLineRepository =
            Arc::new(InMemoryRepository::<StreetAddressLine>::new());

        let response = health(Method::GET, Extension(repository))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-app"));

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["database"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn options_returns_empty_body() -> Result<()> {
        let repository: SharedStreetAddressLineRepository =
            Arc::new(InMemoryRepository::<StreetAddressLine>::new());

        let response = health(Method::OPTIONS, Extension(repository))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert!(body.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failing_repository_is_unavailable() -> Result<()> {
        let repository: SharedStreetAddressLineRepository = Arc::new(DownRepository);

        let response = health(Method::GET, Extension(repository))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["database"], "error");
        Ok(())
    }

    #[test]
    fn short_commit_truncates_long_hashes() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("unknown"), "");
    }
}
