use anyhow::Result;
use async_trait::async_trait;

/// A persisted record identified by a unique key.
pub trait Entity {
    type Key;

    fn key(&self) -> Self::Key;

    /// Returns the entity with its key replaced, used by stores that assign keys on insert.
    #[must_use]
    fn with_key(self, key: Self::Key) -> Self;
}

/// Storage capability for entities of type `E` keyed by `K`.
///
/// Implementations own key assignment: `add` returns the entity as stored,
/// including the key it was given.
#[async_trait]
pub trait Repository<E, K>: Send + Sync
where
    E: Send + 'static,
    K: Send + 'static,
{
    /// Look up an entity by key.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be queried.
    async fn find(&self, key: K) -> Result<Option<E>>;

    /// Persist a new entity and return it with its assigned key.
    ///
    /// # Errors
    /// Returns an error if the backing store rejects the insert.
    async fn add(&self, entity: E) -> Result<E>;

    /// Check connectivity to the backing store.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
