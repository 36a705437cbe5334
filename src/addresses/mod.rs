//! Street address line entity and its storage backends.

mod memory;
mod postgres;
mod repository;

pub use self::memory::InMemoryRepository;
pub use self::postgres::PgStreetAddressLineRepository;
pub use self::repository::{Entity, Repository};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Key type of [`StreetAddressLine`].
pub type StreetAddressLineId = i32;

/// Repository handle shared by the controller and the health probe.
pub type SharedStreetAddressLineRepository =
    Arc<dyn Repository<StreetAddressLine, StreetAddressLineId>>;

/// A single line of a street address, e.g. `221B Baker Street`.
///
/// `id` is assigned by the repository on insert; any value sent by a client is ignored.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StreetAddressLine {
    #[serde(default)]
    pub id: StreetAddressLineId,
    pub value: String,
}

impl StreetAddressLine {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: 0,
            value: value.into(),
        }
    }
}

impl Entity for StreetAddressLine {
    type Key = StreetAddressLineId;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn with_key(self, key: Self::Key) -> Self {
        Self { id: key, ..self }
    }
}
