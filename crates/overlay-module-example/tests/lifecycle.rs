use async_trait::async_trait;
use overlay_assets::{
    ContentsManager, DatAssetCache, DirectoriesManager, MemorySource, ResourceLedger,
};
use overlay_core::{LifecyclePhase, ModuleConfig, ModuleError, ModuleHost, ModuleParams};
use overlay_module_example::{
    refresh_authenticated_data, ColorType, ExampleModule, RefreshOutcome, GREETING, HEADER_TEXT,
    LOADING_TEXT, PLACEHOLDER, REQUIRED_PERMISSIONS,
};
use overlay_settings::{SettingCollection, SettingsError};
use overlay_ui::{Color, NotificationKind, Point, Ui, WINDOW_POSITIONS};
use overlay_webapi::{
    ApiError, ApiManager, ApiResult, Character, Dungeon, DungeonPath, Subtoken, TokenPermission,
    WebApiClient,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;

#[derive(Default)]
struct ScriptedClient {
    dungeons_fail: bool,
    dungeons_gate: Option<Arc<Notify>>,
    characters_fail: AtomicBool,
    characters_gate: Option<Arc<Notify>>,
    character_calls: AtomicUsize,
    characters_answered: AtomicUsize,
}

#[async_trait]
impl WebApiClient for ScriptedClient {
    async fn dungeons(&self) -> ApiResult<Vec<Dungeon>> {
        if let Some(gate) = &self.dungeons_gate {
            gate.notified().await;
        }
        if self.dungeons_fail {
            return Err(ApiError::Transport {
                endpoint: "dungeons",
                reason: "timed out".into(),
            });
        }
        Ok(vec![
            Dungeon {
                id: "ascalonian_catacombs".into(),
                paths: vec![
                    DungeonPath {
                        id: "ac_story".into(),
                        kind: "Story".into(),
                    },
                    DungeonPath {
                        id: "hodgins".into(),
                        kind: "Explorable".into(),
                    },
                ],
            },
            Dungeon {
                id: "caudecus_manor".into(),
                paths: Vec::new(),
            },
        ])
    }

    async fn characters(&self, _token: &Subtoken) -> ApiResult<Vec<Character>> {
        self.character_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.characters_gate {
            gate.notified().await;
        }
        self.characters_answered.fetch_add(1, Ordering::SeqCst);
        if self.characters_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Transport {
                endpoint: "characters",
                reason: "503".into(),
            });
        }
        Ok(vec![
            Character {
                name: "Rytlock Brimstone".into(),
            },
            Character {
                name: "Zojja".into(),
            },
        ])
    }
}

struct Harness {
    host: ModuleHost,
    module: Arc<ExampleModule>,
    client: Arc<ScriptedClient>,
    ledger: Arc<ResourceLedger>,
    dat_cache: Arc<DatAssetCache>,
    api: ApiManager,
    ui: Ui,
    settings: SettingCollection,
    _dir: tempfile::TempDir,
}

fn harness_with(client: ScriptedClient, config: &str, with_bundle: bool) -> Harness {
    overlay_modules_logging::init_for_tests();

    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(ResourceLedger::new());

    let bundle = MemorySource::new();
    if with_bundle {
        bundle.insert("155985.png", vec![0x89u8, b'P', b'N', b'G']);
        bundle.insert("test/603447.png", vec![0x89u8, b'P', b'N', b'G', 1]);
    }
    let contents = Arc::new(ContentsManager::new(ledger.clone()));
    contents.add_source(Arc::new(bundle));

    let dat_cache = Arc::new(DatAssetCache::new());
    dat_cache.insert(603_447, vec![7u8; 16]);

    let client = Arc::new(client);
    let api = ApiManager::new(client.clone());

    let host_settings = SettingCollection::new("host");
    let ui = Ui::new(ledger.clone());
    ui.set_position_store(host_settings.add_sub_collection(WINDOW_POSITIONS));

    let settings = SettingCollection::new("example");
    let params = ModuleParams {
        settings: settings.clone(),
        contents,
        dat_cache: dat_cache.clone(),
        directories: Arc::new(DirectoriesManager::new(
            dir.path(),
            vec!["example".to_string()],
        )),
        api: api.clone(),
        ui: ui.clone(),
        config: ModuleConfig {
            id: "example".into(),
            data: toml::from_str(config).unwrap(),
        },
    };

    let module = Arc::new(ExampleModule::new());
    let host = ModuleHost::new(module.clone(), params, Handle::current());

    Harness {
        host,
        module,
        client,
        ledger,
        dat_cache,
        api,
        ui,
        settings,
        _dir: dir,
    }
}

fn harness(client: ScriptedClient) -> Harness {
    harness_with(client, "", true)
}

async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

async fn load(h: &mut Harness) {
    h.host.load().unwrap();
    assert_eq!(h.host.wait_loaded().await.unwrap(), LifecyclePhase::Loaded);
}

fn grant(h: &Harness) {
    h.api.set_subtoken(Subtoken::new("sub", REQUIRED_PERMISSIONS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_builds_the_ui_and_unload_releases_everything_once() {
    let mut h = harness(ScriptedClient::default());

    for _ in 0..3 {
        load(&mut h).await;

        let panel = h.module.characters_panel().unwrap();
        let names = h.module.character_names_label().unwrap();
        assert_eq!(h.ui.children(panel).len(), 2);
        assert_eq!(h.ui.label_text(h.ui.children(panel)[0]).as_deref(), Some(HEADER_TEXT));
        assert_eq!(h.ui.label_text(names).as_deref(), Some(LOADING_TEXT));
        assert_eq!(h.ui.location(h.module.window().unwrap()), Some(Point::new(300, 300)));
        assert!(h.module.has_shared_mug());

        let menu = h.module.dungeon_menu().unwrap();
        let items = h.ui.menu_items(menu);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, "ascalonian_catacombs");
        let paths: Vec<String> = h
            .ui
            .menu_items(items[0].1.unwrap())
            .into_iter()
            .map(|(text, _)| text)
            .collect();
        assert_eq!(paths, vec!["ac_story (Story)", "hodgins (Explorable)"]);
        assert_eq!(h.ui.menu_of(h.module.corner_icon().unwrap()), Some(menu));
        assert!(h.ledger.live_count() > 0);

        let ctx = Arc::downgrade(h.host.context().unwrap());
        h.host.unload();

        assert!(ctx.upgrade().is_none());
        assert_eq!(h.ledger.live_count(), 0);
        assert_eq!(h.ledger.stats().double_released, 0);
        assert_eq!(h.ui.control_count(), 0);
        assert!(h.dat_cache.texture(603_447).is_some());
        assert!(h.module.characters_panel().is_none());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unload_before_load_started_is_safe() {
    let gate = Arc::new(Notify::new());
    let mut h = harness(ScriptedClient {
        dungeons_gate: Some(gate.clone()),
        ..ScriptedClient::default()
    });

    h.host.load().unwrap();
    let ctx = Arc::downgrade(h.host.context().unwrap());
    h.host.unload();
    gate.notify_one();

    assert!(eventually(|| ctx.upgrade().is_none()).await);
    assert_eq!(h.host.phase(), LifecyclePhase::Unloaded);
    assert_eq!(h.ledger.live_count(), 0);
    assert_eq!(h.ui.control_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unload_while_load_is_waiting_on_the_api_is_safe() {
    let gate = Arc::new(Notify::new());
    let mut h = harness(ScriptedClient {
        dungeons_gate: Some(gate.clone()),
        ..ScriptedClient::default()
    });

    h.host.load().unwrap();
    let module = h.module.clone();
    assert!(eventually(|| module.characters_panel().is_some()).await);

    let ctx = Arc::downgrade(h.host.context().unwrap());
    h.host.unload();
    assert_eq!(h.ledger.live_count(), 0);

    gate.notify_one();
    assert!(eventually(|| ctx.upgrade().is_none()).await);

    assert_eq!(h.host.phase(), LifecyclePhase::Unloaded);
    assert_eq!(h.ledger.live_count(), 0);
    assert_eq!(h.ledger.stats().double_released, 0);
    assert!(h.module.window().is_none());
    assert!(h.module.dungeons().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_dungeon_fetch_still_reaches_loaded_with_an_empty_menu() {
    let mut h = harness(ScriptedClient {
        dungeons_fail: true,
        ..ScriptedClient::default()
    });
    load(&mut h).await;

    assert!(h.module.dungeons().is_empty());
    let menu = h.module.dungeon_menu().unwrap();
    assert!(h.ui.menu_items(menu).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_without_permissions_shows_placeholder_and_makes_no_call() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;
    let names = h.module.character_names_label().unwrap();

    h.host.update(Duration::from_millis(5_000)).unwrap();

    let ui = h.ui.clone();
    assert!(eventually(|| ui.label_text(names).as_deref() == Some(PLACEHOLDER)).await);
    assert_eq!(h.client.character_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn permissions_are_checked_on_every_refresh() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;
    let ctx = h.host.context().unwrap().clone();
    let names = h.module.character_names_label();

    // Only `Account`: a token exists but lacks the characters scope.
    h.api
        .set_subtoken(Subtoken::new("sub", [TokenPermission::Account]));
    assert_eq!(
        refresh_authenticated_data(ctx.api(), ctx.ui(), names).await,
        RefreshOutcome::MissingPermissions
    );

    grant(&h);
    assert_eq!(
        refresh_authenticated_data(ctx.api(), ctx.ui(), names).await,
        RefreshOutcome::Updated(2)
    );
    assert_eq!(
        h.ui.label_text(names.unwrap()).as_deref(),
        Some("Rytlock Brimstone\nZojja")
    );

    h.client.characters_fail.store(true, Ordering::SeqCst);
    assert_eq!(
        refresh_authenticated_data(ctx.api(), ctx.ui(), names).await,
        RefreshOutcome::Failed
    );
    assert_eq!(
        h.ui.label_text(names.unwrap()).as_deref(),
        Some("Rytlock Brimstone\nZojja")
    );

    h.api.clear_subtoken();
    refresh_authenticated_data(ctx.api(), ctx.ui(), names).await;
    assert_eq!(h.ui.label_text(names.unwrap()).as_deref(), Some(PLACEHOLDER));
    assert_eq!(h.client.character_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_refresh_is_skipped_while_one_is_in_flight() {
    let gate = Arc::new(Notify::new());
    let mut h = harness(ScriptedClient {
        characters_gate: Some(gate.clone()),
        ..ScriptedClient::default()
    });
    load(&mut h).await;
    grant(&h);

    h.host.update(Duration::from_millis(5_000)).unwrap();
    let client = h.client.clone();
    assert!(eventually(|| client.character_calls.load(Ordering::SeqCst) == 1).await);

    h.host.update(Duration::from_millis(5_000)).unwrap();
    assert!(h.module.is_refresh_running());

    gate.notify_one();
    let module = h.module.clone();
    assert!(eventually(|| !module.is_refresh_running()).await);
    assert_eq!(h.client.character_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_finishing_after_unload_does_not_touch_disposed_labels() {
    let gate = Arc::new(Notify::new());
    let mut h = harness(ScriptedClient {
        characters_gate: Some(gate.clone()),
        ..ScriptedClient::default()
    });
    load(&mut h).await;
    grant(&h);

    h.host.update(Duration::from_millis(5_000)).unwrap();
    let client = h.client.clone();
    assert!(eventually(|| client.character_calls.load(Ordering::SeqCst) == 1).await);

    h.host.unload();
    assert!(!h.module.is_refresh_running());
    gate.notify_one();

    assert!(eventually(|| client.characters_answered.load(Ordering::SeqCst) == 1).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.ui.control_count(), 0);
    assert_eq!(h.ledger.live_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_left_over_from_a_previous_load_does_not_block_the_next() {
    let gate = Arc::new(Notify::new());
    let mut h = harness(ScriptedClient {
        characters_gate: Some(gate.clone()),
        ..ScriptedClient::default()
    });
    load(&mut h).await;
    grant(&h);

    h.host.update(Duration::from_millis(5_000)).unwrap();
    let client = h.client.clone();
    assert!(eventually(|| client.character_calls.load(Ordering::SeqCst) == 1).await);

    h.host.unload();
    h.api.clear_subtoken();
    load(&mut h).await;
    assert!(!h.module.is_refresh_running());

    // The stale request is still parked on the gate.
    h.host.update(Duration::from_millis(5_000)).unwrap();
    let names = h.module.character_names_label().unwrap();
    let ui = h.ui.clone();
    assert!(eventually(|| ui.label_text(names).as_deref() == Some(PLACEHOLDER)).await);
    assert_eq!(client.character_calls.load(Ordering::SeqCst), 1);

    gate.notify_one();
    assert!(eventually(|| client.characters_answered.load(Ordering::SeqCst) == 1).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.ui.label_text(names).as_deref(), Some(PLACEHOLDER));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notification_fires_once_when_ticks_sum_to_the_interval() {
    let mut h = harness_with(
        ScriptedClient::default(),
        "notification_interval_ms = 1000\nrefresh_interval_ms = 600000",
        true,
    );
    load(&mut h).await;

    h.host.update(Duration::from_millis(400)).unwrap();
    assert!(h.ui.drain_notifications().is_empty());
    h.host.update(Duration::from_millis(600)).unwrap();

    let shown = h.ui.drain_notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].kind, NotificationKind::Warning);

    h.host.update(Duration::from_millis(999)).unwrap();
    assert!(h.ui.drain_notifications().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn colour_setting_drives_the_panel_until_unload() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;
    let settings = h.module.settings().unwrap();
    let panel = h.module.characters_panel().unwrap();

    assert_eq!(h.ui.background_color(panel), Some(Color::BLUE));
    settings.enum_example.set_value(ColorType::Black);
    assert_eq!(h.ui.background_color(panel), Some(Color::BLACK));
    assert_eq!(settings.enum_example.subscriber_count(), 1);

    h.host.unload();
    assert_eq!(settings.enum_example.subscriber_count(), 0);
    settings.enum_example.set_value(ColorType::Blue);

    load(&mut h).await;
    let panel = h.module.characters_panel().unwrap();
    assert_eq!(h.ui.background_color(panel), Some(Color::BLUE));
    assert_eq!(settings.enum_example.subscriber_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn settings_are_defined_with_defaults_and_bounds() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;
    let s = h.module.settings().unwrap();

    assert!(!s.bool_example.value());
    assert_eq!(s.string_example.value(), "myText");
    assert_eq!(s.int_example.value(), 20);
    assert_eq!(s.int_example.range(), Some((0, 255)));

    s.int_example.set_value(300);
    assert_eq!(s.int_example.value(), 255);

    assert!(matches!(
        h.settings.get::<String>("Examplesetting"),
        Err(SettingsError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn window_position_survives_a_reload() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;
    assert!(h.ui.move_to(h.module.window().unwrap(), Point::new(10, 20)));
    h.host.unload();

    load(&mut h).await;
    assert_eq!(h.ui.location(h.module.window().unwrap()), Some(Point::new(10, 20)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corner_icon_click_greets() {
    let mut h = harness(ScriptedClient::default());
    load(&mut h).await;

    assert!(h.ui.click(h.module.corner_icon().unwrap()));
    let shown = h.ui.drain_notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].text, GREETING);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_bundle_texture_is_fatal() {
    let mut h = harness_with(ScriptedClient::default(), "", false);

    h.host.load().unwrap();
    assert!(matches!(
        h.host.wait_loaded().await,
        Err(ModuleError::LoadFailed { module: "example", .. })
    ));
    assert_eq!(h.host.phase(), LifecyclePhase::Loading);

    h.host.unload();
    assert_eq!(h.host.phase(), LifecyclePhase::Unloaded);
    assert_eq!(h.ledger.live_count(), 0);
}
