use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use eventroot::aggregate_type::AggregateType;
use eventroot::errors::{SnapshotError, SnapshotResult};
use eventroot::snapshot::{Snapshot, SnapshotStore};
use eventroot::types::AggregateId;
use serde::de::DeserializeOwned;
use serde::Serialize;

type SnapshotKey = (AggregateType, AggregateId);

/// In-memory snapshot store.
///
/// Snapshots are kept in serialized JSON form, so every `get` returns a fresh,
/// independently owned aggregate, as a persistent store would.
pub struct InMemorySnapshotStore<A> {
    snapshots: Arc<RwLock<HashMap<SnapshotKey, serde_json::Value>>>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> InMemorySnapshotStore<A> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            _aggregate: PhantomData,
        }
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.read().map_or(0, |snapshots| snapshots.len())
    }

    /// Whether no snapshots are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A> Clone for InMemorySnapshotStore<A> {
    fn clone(&self) -> Self {
        Self {
            snapshots: Arc::clone(&self.snapshots),
            _aggregate: PhantomData,
        }
    }
}

impl<A> Default for InMemorySnapshotStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> SnapshotError {
    SnapshotError::Internal("snapshot store lock poisoned".to_string())
}

#[async_trait]
impl<A> SnapshotStore<A> for InMemorySnapshotStore<A>
where
    A: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(
        &self,
        aggregate_type: &AggregateType,
        aggregate_id: &AggregateId,
    ) -> SnapshotResult<Option<Snapshot<A>>> {
        let stored = {
            let snapshots = self.snapshots.read().map_err(|_| poisoned())?;
            snapshots
                .get(&(aggregate_type.clone(), aggregate_id.clone()))
                .cloned()
        };

        stored
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }

    async fn save(&self, snapshot: Snapshot<A>) -> SnapshotResult<()> {
        let key = (snapshot.aggregate_type.clone(), snapshot.aggregate_id.clone());
        let value = serde_json::to_value(&snapshot)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))?;

        self.snapshots
            .write()
            .map_err(|_| poisoned())?
            .insert(key, value);
        Ok(())
    }

    async fn remove_all(&self, aggregate_type: &AggregateType) -> SnapshotResult<()> {
        self.snapshots
            .write()
            .map_err(|_| poisoned())?
            .retain(|(stored_type, _), _| stored_type != aggregate_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventroot::types::EventVersion;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Odometer {
        km: u64,
    }

    fn snapshot(ty: &str, id: &str, km: u64) -> Snapshot<Odometer> {
        Snapshot::new(
            AggregateType::try_new(ty).unwrap(),
            AggregateId::try_new(id).unwrap(),
            Odometer { km },
            EventVersion::try_new(km).unwrap(),
        )
    }

    #[tokio::test]
    async fn save_replaces_earlier_snapshot() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("vehicle", "v-1", 10)).await.unwrap();
        store.save(snapshot("vehicle", "v-1", 20)).await.unwrap();

        let found = store
            .get(
                &AggregateType::try_new("vehicle").unwrap(),
                &AggregateId::try_new("v-1").unwrap(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.aggregate_root, Odometer { km: 20 });
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_aggregate_has_no_snapshot() {
        let store: InMemorySnapshotStore<Odometer> = InMemorySnapshotStore::new();
        let found = store
            .get(
                &AggregateType::try_new("vehicle").unwrap(),
                &AggregateId::try_new("v-9").unwrap(),
            )
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_all_only_touches_one_type() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("vehicle", "v-1", 1)).await.unwrap();
        store.save(snapshot("vehicle", "v-2", 2)).await.unwrap();
        store.save(snapshot("driver", "d-1", 3)).await.unwrap();

        store
            .remove_all(&AggregateType::try_new("vehicle").unwrap())
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_with_wrong_shape_fails_to_load() {
        let store: InMemorySnapshotStore<Odometer> = InMemorySnapshotStore::new();
        let key = (
            AggregateType::try_new("vehicle").unwrap(),
            AggregateId::try_new("v-1").unwrap(),
        );
        store
            .snapshots
            .write()
            .unwrap()
            .insert(key.clone(), serde_json::json!({ "unexpected": true }));

        let result = store.get(&key.0, &key.1).await;
        assert!(matches!(result, Err(SnapshotError::DeserializationFailed(_))));
    }
}
