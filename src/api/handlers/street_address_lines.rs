//! Resource handlers for `StreetAddressLine` entities.
//!
//! [`StreetAddressLinesController`] holds the request semantics and maps repository
//! results to HTTP outcomes. The axum handlers below only extract the request parts
//! and delegate to it.

use crate::addresses::{
    Entity, SharedStreetAddressLineRepository, StreetAddressLine, StreetAddressLineId,
};
use axum::{
    extract::{Extension, Path},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::{fmt, sync::Arc};
use tracing::{debug, error, instrument, Instrument, Span};

/// Base route of the resource.
pub const RESOURCE_PATH: &str = "/api/streetaddresslines";

/// Location of the `GET` endpoint for `id`.
#[must_use]
pub fn location_for(id: StreetAddressLineId) -> String {
    format!("{RESOURCE_PATH}/{id}")
}

/// Raised when the controller is built without one of its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    MissingDependency(&'static str),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency(name) => write!(f, "argument cannot be null: {name}"),
        }
    }
}

impl std::error::Error for ControllerError {}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Repository(anyhow::Error),
}

impl IntoResponse for ApiError {
    /// Repository failures are logged server-side and surfaced as `500` without details.
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Repository(err) => {
                error!("Repository error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// `201 Created` with a `Location` header and a JSON body.
#[derive(Debug)]
pub struct Created<T> {
    location: String,
    body: T,
}

impl<T> Created<T> {
    pub fn at(location: String, body: T) -> Self {
        Self { location, body }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn body(&self) -> &T {
        &self.body
    }
}

impl<T: serde::Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(LOCATION, self.location)],
            Json(self.body),
        )
            .into_response()
    }
}

pub struct StreetAddressLinesController {
    span: Span,
    repository: SharedStreetAddressLineRepository,
}

impl fmt::Debug for StreetAddressLinesController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreetAddressLinesController")
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct StreetAddressLinesControllerBuilder {
    logger: Option<Span>,
    repository: Option<SharedStreetAddressLineRepository>,
}

impl StreetAddressLinesControllerBuilder {
    /// Span under which repository calls are recorded.
    #[must_use]
    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    #[must_use]
    pub fn repository(mut self, repository: SharedStreetAddressLineRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// # Errors
    /// Returns [`ControllerError::MissingDependency`] naming the first absent collaborator.
    pub fn build(self) -> Result<StreetAddressLinesController, ControllerError> {
        let span = self
            .logger
            .ok_or(ControllerError::MissingDependency("logger"))?;
        let repository = self
            .repository
            .ok_or(ControllerError::MissingDependency("repository"))?;

        Ok(StreetAddressLinesController { span, repository })
    }
}

impl StreetAddressLinesController {
    #[must_use]
    pub fn builder() -> StreetAddressLinesControllerBuilder {
        StreetAddressLinesControllerBuilder::default()
    }

    /// Fetch the line stored under `id`.
    ///
    /// Keys below `1` are answered with not found without touching the repository.
    ///
    /// # Errors
    /// [`ApiError::NotFound`] for unknown keys, [`ApiError::Repository`] when the lookup fails.
    pub async fn get(&self, id: StreetAddressLineId) -> Result<StreetAddressLine, ApiError> {
        if id < 1 {
            return Err(ApiError::NotFound);
        }

        let resource = self
            .repository
            .find(id)
            .instrument(self.span.clone())
            .await
            .map_err(ApiError::Repository)?;

        resource.ok_or_else(|| {
            debug!("street address line {} not found", id);
            ApiError::NotFound
        })
    }

    /// Always an empty result; the repository is not consulted.
    #[must_use]
    pub fn head(&self, _id: StreetAddressLineId) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    /// Store `resource` and point the caller at its `GET` location.
    ///
    /// # Errors
    /// [`ApiError::Repository`] when the insert fails.
    pub async fn post(
        &self,
        resource: StreetAddressLine,
    ) -> Result<Created<StreetAddressLine>, ApiError> {
        let saved = self
            .repository
            .add(resource)
            .instrument(self.span.clone())
            .await
            .map_err(ApiError::Repository)?;

        debug!("stored street address line {}", saved.key());

        Ok(Created::at(location_for(saved.key()), saved))
    }
}

#[utoipa::path(
    get,
    path = "/api/streetaddresslines/{id}",
    params(
        ("id" = i32, Path, description = "Street address line key"),
    ),
    responses (
        (status = 200, description = "Street address line found", body = StreetAddressLine, content_type = "application/json"),
        (status = 404, description = "No street address line with this key"),
    ),
    tag = "streetaddresslines",
)]
#[instrument(skip(controller))]
pub async fn get_street_address_line(
    id: Path<StreetAddressLineId>,
    controller: Extension<Arc<StreetAddressLinesController>>,
) -> Result<Json<StreetAddressLine>, ApiError> {
    controller.get(id.0).await.map(Json)
}

#[utoipa::path(
    head,
    path = "/api/streetaddresslines/{id}",
    params(
        ("id" = i32, Path, description = "Street address line key"),
    ),
    responses (
        (status = 204, description = "Always empty"),
    ),
    tag = "streetaddresslines",
)]
#[instrument(skip(controller))]
pub async fn head_street_address_line(
    id: Path<StreetAddressLineId>,
    controller: Extension<Arc<StreetAddressLinesController>>,
) -> impl IntoResponse {
    controller.head(id.0)
}

#[utoipa::path(
    post,
    path = "/api/streetaddresslines",
    request_body = StreetAddressLine,
    responses (
        (status = 201, description = "Street address line created", body = StreetAddressLine, content_type = "application/json",
            headers(("location" = String, description = "URL of the created street address line"))),
    ),
    tag = "streetaddresslines",
)]
#[instrument(skip(controller))]
pub async fn post_street_address_line(
    controller: Extension<Arc<StreetAddressLinesController>>,
    payload: Json<StreetAddressLine>,
) -> Result<Created<StreetAddressLine>, ApiError> {
    controller.post(payload.0).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::{InMemoryRepository, Repository};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps an in-memory store and counts every call that reaches it.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryRepository<StreetAddressLine>,
        calls: AtomicUsize,
    }

    impl CountingRepository {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Repository<StreetAddressLine, StreetAddressLineId> for CountingRepository {
        async fn find(&self, key: StreetAddressLineId) -> Result<Option<StreetAddressLine>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(key).await
        }

        async fn add(&self, entity: StreetAddressLine) -> Result<StreetAddressLine> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.add(entity).await
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl Repository<StreetAddressLine, StreetAddressLineId> for FailingRepository {
        async fn find(&self, _key: StreetAddressLineId) -> Result<Option<StreetAddressLine>> {
            Err(anyhow!("connection reset"))
        }

        async fn add(&self, _entity: StreetAddressLine) -> Result<StreetAddressLine> {
            Err(anyhow!("connection reset"))
        }
    }

    fn controller_with(
        repository: SharedStreetAddressLineRepository,
    ) -> Result<StreetAddressLinesController> {
        Ok(StreetAddressLinesController::builder()
            .logger(Span::none())
            .repository(repository)
            .build()?)
    }

    #[test]
    fn build_without_logger_fails() {
        let repository: SharedStreetAddressLineRepository =
            Arc::new(InMemoryRepository::<StreetAddressLine>::new());
        let result = StreetAddressLinesController::builder()
            .repository(repository)
            .build();

        assert_eq!(
            result.map(|_| ()),
            Err(ControllerError::MissingDependency("logger"))
        );
    }

    #[test]
    fn build_without_repository_fails() {
        let result = StreetAddressLinesController::builder()
            .logger(Span::none())
            .build();

        assert_eq!(
            result.map(|_| ()),
            Err(ControllerError::MissingDependency("repository"))
        );
    }

    #[test]
    fn missing_dependency_names_argument() {
        assert_eq!(
            ControllerError::MissingDependency("repository").to_string(),
            "argument cannot be null: repository"
        );
    }

    #[tokio::test]
    async fn get_non_positive_id_skips_repository() -> Result<()> {
        let repository = Arc::new(CountingRepository::default());
        let controller = controller_with(repository.clone())?;

        for id in [0, -1, -42, i32::MIN] {
            assert!(matches!(controller.get(id).await, Err(ApiError::NotFound)));
        }

        assert_eq!(repository.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() -> Result<()> {
        let repository = Arc::new(CountingRepository::default());
        let controller = controller_with(repository.clone())?;

        assert!(matches!(controller.get(7).await, Err(ApiError::NotFound)));
        assert_eq!(repository.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn get_known_id_returns_entity() -> Result<()> {
        let repository = Arc::new(CountingRepository::default());
        let saved = repository
            .inner
            .add(StreetAddressLine::new("10 Downing Street"))
            .await?;
        let controller = controller_with(repository)?;

        let found = controller
            .get(saved.id)
            .await
            .map_err(|err| anyhow!("unexpected error: {err:?}"))?;
        assert_eq!(found, saved);
        Ok(())
    }

    #[test]
    fn head_is_always_empty() -> Result<()> {
        let repository = Arc::new(CountingRepository::default());
        let controller = controller_with(repository.clone())?;

        for id in [-1, 0, 1, i32::MAX] {
            assert_eq!(controller.head(id), StatusCode::NO_CONTENT);
        }
        assert_eq!(repository.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn post_returns_saved_entity_and_location() -> Result<()> {
        let repository = Arc::new(CountingRepository::default());
        let controller = controller_with(repository.clone())?;

        let created = controller
            .post(StreetAddressLine::new("Building 7"))
            .await
            .map_err(|err| anyhow!("unexpected error: {err:?}"))?;

        assert_eq!(created.location(), "/api/streetaddresslines/1");
        assert_eq!(created.body().id, 1);
        assert_eq!(created.body().value, "Building 7");
        assert_eq!(repository.inner.find(1).await?, Some(created.body().clone()));
        Ok(())
    }

    #[tokio::test]
    async fn created_response_sets_status_header_and_body() -> Result<()> {
        let line = StreetAddressLine::new("Floor 2").with_key(5);
        let response = Created::at(location_for(5), line.clone()).into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/api/streetaddresslines/5")
        );

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let decoded: StreetAddressLine = serde_json::from_slice(&body)?;
        assert_eq!(decoded, line);
        Ok(())
    }

    #[tokio::test]
    async fn repository_failure_maps_to_internal_error() -> Result<()> {
        let controller = controller_with(Arc::new(FailingRepository))?;

        let err = controller
            .get(1)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected an error"))?;
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let err = controller
            .post(StreetAddressLine::new("Lot 9"))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected an error"))?;
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        Ok(())
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
