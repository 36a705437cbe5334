use super::repository::{Entity, Repository};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Store<E> {
    rows: BTreeMap<i32, E>,
    last_key: i32,
}

/// Process-local repository with sequential integer keys starting at `1`.
///
/// Contents are lost on restart; meant for local development and tests.
#[derive(Debug)]
pub struct InMemoryRepository<E> {
    store: Mutex<Store<E>>,
}

impl<E> InMemoryRepository<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                rows: BTreeMap::new(),
                last_key: 0,
            }),
        }
    }

    /// Number of stored entities.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.store.lock().await.rows.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> Repository<E, i32> for InMemoryRepository<E>
where
    E: Entity<Key = i32> + Clone + Send + Sync + 'static,
{
    async fn find(&self, key: i32) -> Result<Option<E>> {
        Ok(self.store.lock().await.rows.get(&key).cloned())
    }

    async fn add(&self, entity: E) -> Result<E> {
        let mut store = self.store.lock().await;

        let key = store
            .last_key
            .checked_add(1)
            .ok_or_else(|| anyhow!("in-memory key space exhausted"))?;
        store.last_key = key;

        let saved = entity.with_key(key);
        store.rows.insert(key, saved.clone());

        debug!("stored entity with key {}", key);

        Ok(saved)
    }
}
