//! Integration tests for the label sync engine

use bridge_traits::asset::{AssetDatabase, AssetHandle};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{IndexContainer, RecordStore};
use core_library::{Label, LabelColor, LabelId, LabelStore};
use core_metadata::MetadataError;
use core_runtime::events::{CoreEvent, EventBus, EventStream, LabelEvent};
use core_sync::{SyncEngine, SyncError};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct MemoryRecords {
    records: Mutex<HashMap<String, Vec<String>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRecords {
    fn insert(&self, asset_path: &str, contents: &str) {
        self.records.lock().unwrap().insert(
            asset_path.to_string(),
            contents.lines().map(str::to_string).collect(),
        );
    }

    fn get(&self, asset_path: &str) -> Vec<String> {
        self.records.lock().unwrap()[asset_path].clone()
    }

    fn user_data(&self, asset_path: &str) -> String {
        self.get(asset_path)
            .into_iter()
            .find(|l| l.starts_with("  userData:"))
            .unwrap()
    }
}

impl RecordStore for MemoryRecords {
    fn read_record_lines(&self, asset_path: &str) -> BridgeResult<Vec<String>> {
        self.records
            .lock()
            .unwrap()
            .get(asset_path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(asset_path.to_string()))
    }

    fn write_record_lines(&self, asset_path: &str, lines: &[String]) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("read-only volume".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(asset_path.to_string(), lines.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryAssets {
    handles: HashMap<String, String>,
    notified: Mutex<Vec<String>>,
}

impl AssetDatabase for MemoryAssets {
    fn path_of(&self, handle: &AssetHandle) -> Option<String> {
        self.handles.get(handle.as_str()).cloned()
    }

    fn notify_changed(&self, asset_path: &str) -> BridgeResult<()> {
        self.notified.lock().unwrap().push(asset_path.to_string());
        Ok(())
    }

    fn find_assets(&self, _filter: &str) -> BridgeResult<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct MemoryContainer {
    ensured: AtomicUsize,
    contents: Mutex<Option<String>>,
}

impl IndexContainer for MemoryContainer {
    fn ensure_container_exists(&self) -> BridgeResult<()> {
        self.ensured.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> BridgeResult<Option<String>> {
        Ok(self.contents.lock().unwrap().clone())
    }

    fn save(&self, contents: &str) -> BridgeResult<()> {
        *self.contents.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }
}

mock! {
    Assets {}

    impl AssetDatabase for Assets {
        fn path_of(&self, handle: &AssetHandle) -> Option<String>;
        fn notify_changed(&self, asset_path: &str) -> BridgeResult<()>;
        fn find_assets(&self, filter: &str) -> BridgeResult<Vec<String>>;
    }
}

const CRATE: &str = "Assets/Props/crate.prefab";
const ROCK: &str = "Assets/Props/rock.fbx";
const README: &str = "Assets/readme.txt";

const CRATE_RECORD: &str = "fileFormatVersion: 2
guid: 9a7e1f0c2b3d4e5f6a7b8c9d0e1f2a3b
PrefabImporter:
  externalObjects: {}
  userData:
  assetBundleName:
  assetBundleVariant: ";

struct Fixture {
    records: Arc<MemoryRecords>,
    assets: Arc<MemoryAssets>,
    container: Arc<MemoryContainer>,
    engine: SyncEngine,
    store: LabelStore,
    events: EventStream,
}

fn fixture() -> Fixture {
    let records = Arc::new(MemoryRecords::default());
    records.insert(CRATE, CRATE_RECORD);
    records.insert(ROCK, "fileFormatVersion: 2\n  userData: labels={rock|Hero Prop}");
    records.insert(README, "fileFormatVersion: 2\nTextScriptImporter:\n  externalObjects: {}");

    let mut handles = HashMap::new();
    handles.insert("guid-crate".to_string(), CRATE.to_string());
    let assets = Arc::new(MemoryAssets {
        handles,
        ..Default::default()
    });

    let container = Arc::new(MemoryContainer::default());
    let store = LabelStore::open(container.clone()).unwrap();

    let bus = EventBus::new(64);
    let events = EventStream::new(bus.subscribe());
    let engine = SyncEngine::new(assets.clone(), records.clone()).with_events(bus);

    Fixture {
        records,
        assets,
        container,
        engine,
        store,
        events,
    }
}

fn ids_of(store: &LabelStore, asset_path: &str) -> Vec<String> {
    store
        .index()
        .labels_of(asset_path)
        .map(|l| l.id().to_string())
        .collect()
}

fn label_ids(ids: &[&str]) -> Vec<LabelId> {
    ids.iter().map(|id| LabelId::normalize(id)).collect()
}

// ============================================================================
// Ingest
// ============================================================================

#[test]
fn ingest_creates_labels_implicitly() {
    let mut fx = fixture();

    let outcome = fx.engine.ingest(&mut fx.store, ROCK).unwrap();

    assert_eq!(outcome.created, vec![Label::new("rock"), Label::new("hero_prop")]);
    assert_eq!(outcome.assigned, label_ids(&["rock", "hero_prop"]));
    let created = fx.store.index().find_by_identifier("hero_prop").unwrap();
    assert_eq!(created.name, "Hero Prop");
    assert_eq!(created.color, None);
    assert_eq!(fx.container.ensured.load(Ordering::SeqCst), 1);

    let events = fx.events.drain();
    let implicit: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                CoreEvent::Label(LabelEvent::LabelCreated { implicit: true, .. })
            )
        })
        .collect();
    assert_eq!(implicit.len(), 2);
    assert!(events.contains(&CoreEvent::Label(LabelEvent::AssetLabelsChanged {
        asset_path: ROCK.to_string(),
        labels: vec!["rock".to_string(), "hero_prop".to_string()],
    })));
}

#[test]
fn ingest_is_idempotent_and_additive() {
    let mut fx = fixture();
    fx.engine.ingest(&mut fx.store, ROCK).unwrap();

    let extra = fx.store.declare_label("Boulder", None).unwrap();
    fx.store.index_mut().assign(&extra, ROCK);

    let again = fx.engine.ingest(&mut fx.store, ROCK).unwrap();
    assert!(again.is_noop());
    assert_eq!(ids_of(&fx.store, ROCK), vec!["rock", "hero_prop", "boulder"]);
}

#[test]
fn ingest_without_field_assigns_nothing() {
    let mut fx = fixture();
    let outcome = fx.engine.ingest(&mut fx.store, CRATE).unwrap();
    assert!(outcome.is_noop());
    assert!(!fx.store.index().has_any_label(CRATE));
    assert_eq!(fx.container.ensured.load(Ordering::SeqCst), 0);
}

#[test]
fn ingest_malformed_record_is_reported() {
    let mut fx = fixture();

    let err = fx.engine.ingest(&mut fx.store, README).unwrap_err();
    assert!(matches!(err, SyncError::MalformedRecord { ref path } if path == README));
    assert!(fx.store.index().is_empty());

    let events = fx.events.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CoreEvent::Label(LabelEvent::IngestFailed { asset_path, .. }) if asset_path == README
    ));
}

#[test]
fn ingest_missing_record_is_bridge_error() {
    let mut fx = fixture();
    let err = fx.engine.ingest(&mut fx.store, "Assets/gone.png").unwrap_err();
    assert!(matches!(err, SyncError::Bridge(BridgeError::NotFound(_))));
}

#[test]
fn ingest_all_collects_failures() {
    let mut fx = fixture();
    let report = fx.engine.ingest_all(&mut fx.store, &[CRATE, ROCK, README]);
    assert_eq!(report.ingested.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, README);
    assert_eq!(report.created_count(), 2);
}

// ============================================================================
// Write-back
// ============================================================================

#[test]
fn set_labels_writes_record_then_index() {
    let mut fx = fixture();
    let tree = fx.store.declare_label("Tree", Some(LabelColor::rgb(0, 128, 0))).unwrap();

    let outcome = fx
        .engine
        .set_labels(&mut fx.store, CRATE, &[tree.clone(), Label::new("Hero Prop")])
        .unwrap();

    assert!(outcome.record_written);
    assert!(outcome.reimport_requested);
    assert_eq!(outcome.added, label_ids(&["tree", "hero_prop"]));
    assert_eq!(outcome.created, vec![Label::new("hero_prop")]);
    assert_eq!(fx.records.user_data(CRATE), "  userData: labels={tree|hero_prop}");
    assert_eq!(*fx.assets.notified.lock().unwrap(), vec![CRATE.to_string()]);
    assert_eq!(ids_of(&fx.store, CRATE), vec!["tree", "hero_prop"]);

    // other lines untouched
    let original: Vec<String> = CRATE_RECORD.lines().map(str::to_string).collect();
    let written = fx.records.get(CRATE);
    for (before, after) in original.iter().zip(&written) {
        if !before.starts_with("  userData:") {
            assert_eq!(before, after);
        }
    }
}

#[test]
fn set_labels_replaces_previous_set() {
    let mut fx = fixture();
    let x = Label::new("x");
    let y = Label::new("y");

    fx.engine.set_labels(&mut fx.store, CRATE, &[x.clone(), y.clone()]).unwrap();
    let outcome = fx.engine.set_labels(&mut fx.store, CRATE, &[y]).unwrap();

    assert_eq!(outcome.removed, label_ids(&["x"]));
    assert_eq!(ids_of(&fx.store, CRATE), vec!["y"]);
    assert_eq!(fx.records.user_data(CRATE), "  userData: labels={y}");
    // the emptied entry survives until pruned
    assert!(fx.store.index().contains_label("x"));
}

#[test]
fn clearing_labels_restores_record() {
    let mut fx = fixture();
    fx.engine
        .set_labels(&mut fx.store, CRATE, &[Label::new("a"), Label::new("b")])
        .unwrap();
    fx.engine.set_labels(&mut fx.store, CRATE, &[Label::new("a")]).unwrap();
    fx.engine.set_labels(&mut fx.store, CRATE, &[]).unwrap();

    let original: Vec<String> = CRATE_RECORD.lines().map(str::to_string).collect();
    assert_eq!(fx.records.get(CRATE), original);
    assert!(!fx.store.index().has_any_label(CRATE));
}

#[test]
fn set_labels_collapses_duplicate_identifiers() {
    let mut fx = fixture();
    let outcome = fx
        .engine
        .set_labels(
            &mut fx.store,
            CRATE,
            &[Label::new("Hero Prop"), Label::new("hero_prop"), Label::new("HERO PROP")],
        )
        .unwrap();

    assert_eq!(outcome.labels, label_ids(&["hero_prop"]));
    assert_eq!(fx.records.user_data(CRATE), "  userData: labels={hero_prop}");
    assert_eq!(fx.store.index().find_by_identifier("hero_prop").unwrap().name, "Hero Prop");
}

#[test]
fn set_labels_keeps_stored_display_attributes() {
    let mut fx = fixture();
    let red = LabelColor::rgb(255, 0, 0);
    fx.store.declare_label("Tree", Some(red)).unwrap();

    let ad_hoc = Label::new("tree").with_color(LabelColor::WHITE);
    fx.engine.set_labels(&mut fx.store, CRATE, &[ad_hoc]).unwrap();

    let stored = fx.store.index().find_by_identifier("tree").unwrap();
    assert_eq!(stored.color, Some(red));
    assert_eq!(stored.name, "Tree");
}

#[test]
fn unchanged_record_is_not_rewritten() {
    let mut fx = fixture();
    let tree = Label::new("tree");
    fx.engine.set_labels(&mut fx.store, CRATE, &[tree.clone()]).unwrap();

    let outcome = fx.engine.set_labels(&mut fx.store, CRATE, &[tree]).unwrap();
    assert!(!outcome.record_written);
    assert!(!outcome.reimport_requested);
    assert_eq!(fx.records.writes.load(Ordering::SeqCst), 1);
    assert_eq!(fx.assets.notified.lock().unwrap().len(), 1);
}

#[test]
fn malformed_record_leaves_everything_untouched() {
    let mut fx = fixture();

    let err = fx
        .engine
        .set_labels(&mut fx.store, README, &[Label::new("docs")])
        .unwrap_err();

    assert!(matches!(err, SyncError::MalformedRecord { .. }));
    assert!(fx.store.index().is_empty());
    assert_eq!(fx.records.writes.load(Ordering::SeqCst), 0);
    assert!(fx.assets.notified.lock().unwrap().is_empty());
    assert!(fx.events.drain().is_empty());
}

#[test]
fn write_failure_leaves_index_untouched() {
    let mut fx = fixture();
    let tree = fx.store.declare_label("tree", None).unwrap();
    fx.engine.set_labels(&mut fx.store, CRATE, &[tree]).unwrap();
    fx.records.fail_writes.store(true, Ordering::SeqCst);

    let err = fx
        .engine
        .set_labels(&mut fx.store, CRATE, &[Label::new("rock")])
        .unwrap_err();

    assert!(matches!(err, SyncError::Bridge(BridgeError::OperationFailed(_))));
    assert_eq!(ids_of(&fx.store, CRATE), vec!["tree"]);
    assert!(!fx.store.index().contains_label("rock"));
    assert_eq!(fx.records.user_data(CRATE), "  userData: labels={tree}");
}

#[test]
fn unencodable_identifier_is_rejected() {
    let mut fx = fixture();
    let err = fx
        .engine
        .set_labels(&mut fx.store, CRATE, &[Label::new("a|b")])
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Metadata(MetadataError::UnencodableIdentifier { .. })
    ));
    assert_eq!(fx.records.writes.load(Ordering::SeqCst), 0);
}

#[test]
fn reimport_failure_is_not_fatal() {
    let records = Arc::new(MemoryRecords::default());
    records.insert(CRATE, CRATE_RECORD);

    let mut assets = MockAssets::new();
    assets
        .expect_notify_changed()
        .withf(|path| path.to_string() == CRATE)
        .times(1)
        .returning(|_| Err(BridgeError::NotAvailable("importer busy".to_string())));

    let bus = EventBus::new(16);
    let mut events = EventStream::new(bus.subscribe());
    let engine = SyncEngine::new(Arc::new(assets), records.clone()).with_events(bus);
    let mut store = LabelStore::open(Arc::new(MemoryContainer::default())).unwrap();

    let outcome = engine
        .set_labels(&mut store, CRATE, &[Label::new("tree")])
        .unwrap();

    assert!(outcome.record_written);
    assert!(!outcome.reimport_requested);
    assert_eq!(ids_of(&store, CRATE), vec!["tree"]);
    assert!(events.drain().iter().any(|e| matches!(
        e,
        CoreEvent::Label(LabelEvent::ReimportFailed { .. })
    )));
}

// ============================================================================
// Handles, batches and moves
// ============================================================================

#[test]
fn handle_entry_points_resolve_or_refuse() {
    let mut fx = fixture();

    let outcome = fx
        .engine
        .set_labels_for_handle(&mut fx.store, &AssetHandle::new("guid-crate"), &[Label::new("tree")])
        .unwrap();
    assert_eq!(outcome.asset_path, CRATE);

    let err = fx
        .engine
        .set_labels_for_handle(&mut fx.store, &AssetHandle::new("guid-unknown"), &[Label::new("tree")])
        .unwrap_err();
    assert!(matches!(err, SyncError::UntrackedAsset { ref handle } if handle == "guid-unknown"));

    let err = fx
        .engine
        .ingest_handle(&mut fx.store, &AssetHandle::new("guid-unknown"))
        .unwrap_err();
    assert!(matches!(err, SyncError::UntrackedAsset { .. }));
    assert_eq!(fx.records.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn batch_add_and_remove_label() {
    let mut fx = fixture();
    fx.engine.ingest(&mut fx.store, ROCK).unwrap();
    let rock = Label::new("rock");

    let added = fx.engine.add_label(&mut fx.store, &[CRATE, ROCK, README], &rock);
    assert_eq!(added.changed.len(), 1);
    assert_eq!(added.unchanged, vec![ROCK.to_string()]);
    assert_eq!(added.failures.len(), 1);
    assert_eq!(added.failures[0].0, README);
    assert_eq!(ids_of(&fx.store, CRATE), vec!["rock"]);

    let removed = fx.engine.remove_label(&mut fx.store, &[CRATE, ROCK], &rock);
    assert_eq!(removed.changed.len(), 2);
    assert!(!fx.store.index().has_any_label(CRATE));
    assert_eq!(ids_of(&fx.store, ROCK), vec!["hero_prop"]);
    assert_eq!(fx.records.user_data(ROCK), "  userData: labels={hero_prop}");
}

#[test]
fn moved_and_deleted_assets_follow_index() {
    let mut fx = fixture();
    fx.engine.ingest(&mut fx.store, ROCK).unwrap();

    let moved = fx.engine.asset_moved(&mut fx.store, ROCK, "Assets/Env/rock.fbx");
    assert_eq!(moved, 2);
    assert!(!fx.store.index().has_any_label(ROCK));
    assert_eq!(ids_of(&fx.store, "Assets/Env/rock.fbx"), vec!["rock", "hero_prop"]);

    assert_eq!(fx.engine.asset_deleted(&mut fx.store, "Assets/Env/rock.fbx"), 2);
    assert!(!fx.store.index().has_any_label("Assets/Env/rock.fbx"));
}
