//! Repository behaviour against the in-memory adapters.

#![allow(clippy::too_many_lines)]

use std::sync::Arc;

use eventroot::config::{ReadBatchSize, RepositoryConfig, StreamPrefix};
use eventroot::event::RecordedEvent;
use eventroot::event_store::ReadOptions;
use eventroot::metadata::{EventMetadata, UserId};
use eventroot::prelude::*;
use eventroot::snapshot::{SnapshotPolicy, SnapshotStore, SnapshotThreshold};
use eventroot::types::{EventVersion, StreamId};
use eventroot_memory::{InMemoryEventStore, InMemorySnapshotStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum LedgerEvent {
    Opened { owner: String },
    Deposited(i64),
    Withdrew(i64),
}

impl DomainEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "LedgerOpened",
            Self::Deposited(_) => "LedgerDeposited",
            Self::Withdrew(_) => "LedgerWithdrew",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Ledger {
    id: AggregateId,
    recorder: EventRecorder<LedgerEvent>,
    owner: String,
    balance: i64,
}

impl Ledger {
    fn open(owner: &str) -> Self {
        let mut ledger = Self::with_identity(AggregateId::generate());
        ledger.record_that(LedgerEvent::Opened {
            owner: owner.to_string(),
        });
        ledger
    }

    fn deposit(&mut self, amount: i64) {
        self.record_that(LedgerEvent::Deposited(amount));
    }

    fn withdraw(&mut self, amount: i64) -> AggregateResult<()> {
        if amount > self.balance {
            return Err(AggregateError::BusinessRuleViolation(
                "insufficient funds".to_string(),
            ));
        }
        self.record_that(LedgerEvent::Withdrew(amount));
        Ok(())
    }
}

impl AggregateRoot for Ledger {
    type Event = LedgerEvent;

    fn aggregate_id(&self) -> &AggregateId {
        &self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        ledger_type()
    }

    fn apply(&mut self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Opened { owner } => self.owner.clone_from(owner),
            LedgerEvent::Deposited(amount) => self.balance += amount,
            LedgerEvent::Withdrew(amount) => self.balance -= amount,
        }
    }

    fn recorder(&self) -> &EventRecorder<LedgerEvent> {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder<LedgerEvent> {
        &mut self.recorder
    }
}

impl Reconstitute for Ledger {
    fn with_identity(id: AggregateId) -> Self {
        Self {
            id,
            recorder: EventRecorder::new(),
            owner: String::new(),
            balance: 0,
        }
    }
}

/// Persists only the event that opens a ledger.
struct OpeningsOnly;

impl AggregateTranslator<Ledger> for OpeningsOnly {
    fn pending_events(&self, ledger: &Ledger) -> Vec<RecordedEvent<LedgerEvent>> {
        ledger
            .recorder()
            .pending()
            .iter()
            .filter(|recorded| matches!(recorded.payload, LedgerEvent::Opened { .. }))
            .cloned()
            .collect()
    }

    fn reconstitute_from_history(
        &self,
        id: AggregateId,
        history: &[StoredEvent<LedgerEvent>],
    ) -> AggregateResult<Ledger> {
        Ledger::reconstitute_from_history(id, history)
    }
}

type LedgerRepository =
    AggregateRepository<Ledger, InMemoryEventStore<LedgerEvent>, DefaultTranslator<Ledger>>;

fn ledger_type() -> AggregateType {
    AggregateType::try_new("ledger").unwrap()
}

fn version(v: u64) -> EventVersion {
    EventVersion::try_new(v).unwrap()
}

fn repository(store: InMemoryEventStore<LedgerEvent>) -> LedgerRepository {
    AggregateRepository::new(
        store,
        DefaultTranslator::new(),
        AggregateTypeMapping::single(ledger_type()),
    )
}

#[tokio::test]
async fn saved_aggregate_loads_with_same_state() {
    let repo = repository(InMemoryEventStore::new());
    let mut ledger = Ledger::open("ada");
    ledger.deposit(100);
    ledger.withdraw(30).unwrap();

    let saved = repo.save_aggregate_root(&mut ledger).await.unwrap();
    assert_eq!(saved, version(3));
    assert!(!ledger.recorder().has_pending());

    let loaded = repo.load(ledger.aggregate_id()).await.unwrap();
    assert_eq!(loaded.owner, "ada");
    assert_eq!(loaded.balance, 70);
    assert_eq!(loaded.version(), version(3));
    assert!(!loaded.recorder().has_pending());
}

#[tokio::test]
async fn streams_are_named_after_the_base_type() {
    let store = InMemoryEventStore::new();
    let repo = repository(store.clone());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let stream = StreamId::try_new(format!("ledger-{}", ledger.aggregate_id())).unwrap();
    assert!(store.stream_exists(&stream).await.unwrap());
    assert!(repo.exists(ledger.aggregate_id()).await.unwrap());
}

#[tokio::test]
async fn configured_prefix_overrides_stream_name() {
    let store = InMemoryEventStore::new();
    let repo = repository(store.clone()).with_config(
        RepositoryConfig::new().with_stream_prefix(StreamPrefix::try_new("books").unwrap()),
    );
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let stream = StreamId::try_new(format!("books-{}", ledger.aggregate_id())).unwrap();
    assert!(store.stream_exists(&stream).await.unwrap());
}

#[tokio::test]
async fn saving_without_pending_events_writes_nothing() {
    let store = InMemoryEventStore::new();
    let repo = repository(store.clone());
    let mut ledger = Ledger::with_identity(AggregateId::try_new("quiet").unwrap());

    let result = repo.save_aggregate_root(&mut ledger).await.unwrap();

    assert!(result.is_initial());
    assert!(!repo.exists(ledger.aggregate_id()).await.unwrap());
}

#[tokio::test]
async fn successive_saves_append_to_the_stream() {
    let repo = repository(InMemoryEventStore::new());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    ledger.deposit(5);
    ledger.deposit(7);
    let saved = repo.save_aggregate_root(&mut ledger).await.unwrap();

    assert_eq!(saved, version(3));
    let loaded = repo.load(ledger.aggregate_id()).await.unwrap();
    assert_eq!(loaded.balance, 12);
}

#[tokio::test]
async fn unknown_aggregate_is_absent() {
    let repo = repository(InMemoryEventStore::new());
    let id = AggregateId::try_new("ghost").unwrap();

    assert!(repo.get_aggregate_root(&id).await.unwrap().is_none());
    assert!(matches!(
        repo.load(&id).await,
        Err(AggregateError::AggregateNotFound(missing)) if missing == id
    ));
}

#[tokio::test]
async fn stale_copy_fails_with_concurrency_conflict_and_keeps_pending() {
    let repo = repository(InMemoryEventStore::new());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let mut first = repo.load(ledger.aggregate_id()).await.unwrap();
    let mut second = repo.load(ledger.aggregate_id()).await.unwrap();
    first.deposit(10);
    second.deposit(20);

    repo.save_aggregate_root(&mut first).await.unwrap();
    let result = repo.save_aggregate_root(&mut second).await;

    assert!(matches!(
        result,
        Err(AggregateError::ConcurrencyConflict { .. })
    ));
    assert_eq!(second.recorder().pending().len(), 1);

    let current = repo.load(ledger.aggregate_id()).await.unwrap();
    assert_eq!(current.balance, 10);
}

#[tokio::test]
async fn second_new_aggregate_with_same_id_conflicts() {
    let repo = repository(InMemoryEventStore::new());
    let id = AggregateId::try_new("shared").unwrap();
    let mut a = Ledger::with_identity(id.clone());
    let mut b = Ledger::with_identity(id);
    a.deposit(1);
    b.deposit(2);

    repo.save_aggregate_root(&mut a).await.unwrap();
    assert!(matches!(
        repo.save_aggregate_root(&mut b).await,
        Err(AggregateError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
async fn aggregate_of_foreign_type_is_rejected_before_writing() {
    let store = InMemoryEventStore::new();
    let repo: LedgerRepository = AggregateRepository::new(
        store,
        DefaultTranslator::new(),
        AggregateTypeMapping::single(AggregateType::try_new("account").unwrap()),
    );
    let mut ledger = Ledger::open("ada");

    let result = repo.save_aggregate_root(&mut ledger).await;

    assert!(matches!(
        result,
        Err(AggregateError::AggregateTypeMismatch { expected, actual })
            if expected.as_ref() == "account" && actual.as_ref() == "ledger"
    ));
    assert!(ledger.recorder().has_pending());
    assert!(!repo.exists(ledger.aggregate_id()).await.unwrap());
}

#[tokio::test]
async fn save_writes_the_events_the_translator_selects() {
    let store = InMemoryEventStore::new();
    let repo = AggregateRepository::new(
        store.clone(),
        OpeningsOnly,
        AggregateTypeMapping::single(ledger_type()),
    );
    let mut ledger = Ledger::open("ada");
    ledger.deposit(25);

    assert_eq!(
        repo.save_aggregate_root(&mut ledger).await.unwrap(),
        version(1)
    );
    assert!(!ledger.recorder().has_pending());

    let stream_id = repo.stream_id_for(ledger.aggregate_id()).unwrap();
    let stored = store
        .read_stream(&stream_id, ReadOptions::new())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert!(matches!(
        stored.events[0].payload,
        LedgerEvent::Opened { .. }
    ));

    let loaded = repo.load(ledger.aggregate_id()).await.unwrap();
    assert_eq!(loaded.balance, 0);
    assert_eq!(loaded.owner, "ada");
}

#[tokio::test]
async fn small_read_batches_load_the_whole_stream() {
    let store = InMemoryEventStore::new();
    let repo = repository(store.clone()).with_config(
        RepositoryConfig::new().with_read_batch_size(ReadBatchSize::try_new(2).unwrap()),
    );
    let mut ledger = Ledger::open("ada");
    for amount in 1..=8 {
        ledger.deposit(amount);
    }
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let paged = repo.load(ledger.aggregate_id()).await.unwrap();
    let whole = repository(store).load(ledger.aggregate_id()).await.unwrap();

    assert_eq!(paged.balance, 36);
    assert_eq!(paged.version(), version(9));
    assert_eq!(paged, whole);
}

#[tokio::test]
async fn saved_events_carry_aggregate_enrichment() {
    let store = InMemoryEventStore::new();
    let repo = repository(store.clone());
    let mut ledger = Ledger::open("ada");
    ledger.deposit(1);
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let stream = repo.stream_id_for(ledger.aggregate_id()).unwrap();
    let data = store.read_stream(&stream, ReadOptions::new()).await.unwrap();

    for event in &data.events {
        let enrichment = event.metadata.aggregate.as_ref().unwrap();
        assert_eq!(enrichment.aggregate_type, ledger_type());
        assert_eq!(&enrichment.aggregate_id, ledger.aggregate_id());
        assert_eq!(enrichment.aggregate_version, event.event_version);
    }

    let json = serde_json::to_value(&data.events[0].metadata).unwrap();
    assert_eq!(json["_aggregate_type"], "ledger");
    assert_eq!(json["_aggregate_version"], 1);
}

#[tokio::test]
async fn enrichers_run_on_every_saved_event() {
    let store = InMemoryEventStore::new();
    let user = UserId::try_new("clerk-7").unwrap();
    let repo = repository(store.clone())
        .with_metadata_enricher({
            let user = user.clone();
            move |metadata: EventMetadata| metadata.with_user_id(user.clone())
        })
        .with_metadata_enricher(|metadata: EventMetadata| {
            metadata.with_custom("channel", "branch")
        });
    let mut ledger = Ledger::open("ada");
    ledger.deposit(3);
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let stream = repo.stream_id_for(ledger.aggregate_id()).unwrap();
    let data = store.read_stream(&stream, ReadOptions::new()).await.unwrap();

    assert_eq!(data.len(), 2);
    for event in &data.events {
        assert_eq!(event.metadata.user_id.as_ref(), Some(&user));
        assert_eq!(event.metadata.custom["channel"], "branch");
        assert!(event.metadata.aggregate.is_some());
    }
}

#[tokio::test]
async fn snapshot_plus_tail_matches_full_replay() {
    let store = InMemoryEventStore::new();
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let policy = SnapshotPolicy::EveryNEvents(SnapshotThreshold::try_new(3).unwrap());
    let repo = repository(store.clone())
        .with_config(RepositoryConfig::new().with_snapshot_policy(policy))
        .with_snapshot_store(snapshots.clone());

    let mut ledger = Ledger::open("ada");
    ledger.deposit(10);
    ledger.deposit(20);
    ledger.deposit(30);
    repo.save_aggregate_root(&mut ledger).await.unwrap();
    assert_eq!(snapshots.len(), 1);

    ledger.withdraw(5).unwrap();
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    let from_snapshot = repo.load(ledger.aggregate_id()).await.unwrap();
    let from_history = repository(store).load(ledger.aggregate_id()).await.unwrap();

    assert_eq!(from_snapshot, from_history);
    assert_eq!(from_snapshot.balance, 55);
    assert_eq!(from_snapshot.version(), version(5));

    let snapshot = snapshots
        .get(&ledger_type(), ledger.aggregate_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.last_version, version(4));
    assert_eq!(snapshot.aggregate_root.balance, 60);
}

#[tokio::test]
async fn manual_snapshot_requires_saved_aggregate() {
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let repo = repository(InMemoryEventStore::new()).with_snapshot_store(snapshots.clone());
    let mut ledger = Ledger::open("ada");

    assert!(matches!(
        repo.snapshot(&ledger).await,
        Err(AggregateError::UnsavedChanges(_))
    ));

    repo.save_aggregate_root(&mut ledger).await.unwrap();
    repo.snapshot(&ledger).await.unwrap();
    assert_eq!(snapshots.len(), 1);
}

#[tokio::test]
async fn snapshot_refuses_state_drained_without_saving() {
    let store = InMemoryEventStore::new();
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let repo = repository(store).with_snapshot_store(snapshots.clone());
    let mut ledger = Ledger::open("ada");
    ledger.deposit(7);
    assert_eq!(ledger.pop_recorded_events().len(), 2);

    assert!(matches!(
        repo.snapshot(&ledger).await,
        Err(AggregateError::UnsavedChanges(_))
    ));
    assert!(snapshots.is_empty());
    assert!(repo.get_aggregate_root(ledger.aggregate_id()).await.unwrap().is_none());
}

#[tokio::test]
async fn snapshot_refuses_state_ahead_of_the_stream() {
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let repo = repository(InMemoryEventStore::new()).with_snapshot_store(snapshots.clone());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    ledger.deposit(9);
    ledger.pop_recorded_events();

    assert!(matches!(
        repo.snapshot(&ledger).await,
        Err(AggregateError::UnsavedChanges(_))
    ));
    assert!(snapshots.is_empty());

    let loaded = repo.load(ledger.aggregate_id()).await.unwrap();
    assert_eq!(loaded.balance, 0);
    assert_eq!(loaded.version(), version(1));
}

#[tokio::test]
async fn snapshot_of_a_stale_copy_conflicts() {
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let repo = repository(InMemoryEventStore::new()).with_snapshot_store(snapshots.clone());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();
    let stale = repo.load(ledger.aggregate_id()).await.unwrap();

    ledger.deposit(3);
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    assert!(matches!(
        repo.snapshot(&stale).await,
        Err(AggregateError::ConcurrencyConflict { .. })
    ));
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn snapshot_of_foreign_type_is_rejected() {
    let store = InMemoryEventStore::new();
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let mut ledger = Ledger::open("ada");
    repository(store.clone())
        .save_aggregate_root(&mut ledger)
        .await
        .unwrap();

    let accounts: LedgerRepository = AggregateRepository::new(
        store,
        DefaultTranslator::new(),
        AggregateTypeMapping::single(AggregateType::try_new("account").unwrap()),
    )
    .with_snapshot_store(snapshots.clone());

    assert!(matches!(
        accounts.snapshot(&ledger).await,
        Err(AggregateError::AggregateTypeMismatch { .. })
    ));
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn snapshot_without_store_is_a_no_op() {
    let repo = repository(InMemoryEventStore::new());
    let mut ledger = Ledger::open("ada");
    repo.save_aggregate_root(&mut ledger).await.unwrap();

    assert!(repo.snapshot(&ledger).await.is_ok());
}

#[tokio::test]
async fn cleared_snapshots_fall_back_to_history() {
    let store = InMemoryEventStore::new();
    let snapshots = Arc::new(InMemorySnapshotStore::<Ledger>::new());
    let repo = repository(store).with_snapshot_store(snapshots.clone());
    let mut ledger = Ledger::open("ada");
    ledger.deposit(4);
    repo.save_aggregate_root(&mut ledger).await.unwrap();
    repo.snapshot(&ledger).await.unwrap();

    snapshots.remove_all(&ledger_type()).await.unwrap();

    let loaded = repo.load(ledger.aggregate_id()).await.unwrap();
    assert!(snapshots.is_empty());
    assert_eq!(loaded.balance, 4);
}
