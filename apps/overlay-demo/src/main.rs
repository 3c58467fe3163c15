use anyhow::Context;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use overlay_assets::{
    ContentsManager, DatAssetCache, DirectoriesManager, FileSystemSource, ResourceLedger,
};
use overlay_core::{HostConfig, ModuleHost, ModuleParams};
use overlay_module_example::{ExampleModule, MODULE_ID};
use overlay_settings::SettingsStore;
use overlay_ui::{NotificationKind, Ui, WINDOW_POSITIONS};
use overlay_webapi::{ApiManager, FixtureClient, Subtoken};

const HOST_NAMESPACE: &str = "host";

fn main() -> anyhow::Result<()> {
    overlay_modules_logging::init(overlay_modules_logging::DEFAULT_FILTER);

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "overlay.toml".to_string());
    let cfg = HostConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {config_path}"))?;
    info!(target: "demo", "config path='{}' tick_ms={}", config_path, cfg.tick_ms);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("installing ctrl-c handler")?;
    }

    let store = SettingsStore::open(&cfg.settings_path)?;
    let ledger = Arc::new(ResourceLedger::new());

    let contents = Arc::new(ContentsManager::new(ledger.clone()));
    contents.add_source(Arc::new(FileSystemSource::new(&cfg.bundle_dir)));

    let dat_cache = Arc::new(DatAssetCache::new());
    if let Some(dir) = &cfg.dat_cache_dir {
        dat_cache.preload_dir(dir)?;
    }

    let api = ApiManager::new(Arc::new(FixtureClient::new(&cfg.api_fixture_dir)));

    let ui = Ui::new(ledger.clone());
    ui.set_position_store(
        store
            .module_settings(HOST_NAMESPACE)
            .add_sub_collection(WINDOW_POSITIONS),
    );

    let params = ModuleParams {
        settings: store.module_settings(MODULE_ID),
        contents,
        dat_cache,
        directories: Arc::new(DirectoriesManager::new(
            cfg.data_dir.clone(),
            cfg.registered_directories.clone(),
        )),
        api: api.clone(),
        ui: ui.clone(),
        config: cfg.module(MODULE_ID),
    };

    let mut host = ModuleHost::new(
        Arc::new(ExampleModule::new()),
        params,
        runtime.handle().clone(),
    );
    host.load()?;

    let tick = cfg.tick();
    let run_for = cfg.run_for_ms.map(Duration::from_millis);
    let grant_at = Duration::from_millis(cfg.subtoken_after_ms);
    let started = Instant::now();
    let mut last = started;
    let mut granted = cfg.subtoken_permissions.is_empty();

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(tick);
        let now = Instant::now();
        let dt = now - last;
        last = now;
        let uptime = now - started;

        if !granted && uptime >= grant_at {
            api.set_subtoken(Subtoken::new("demo", cfg.subtoken_permissions.iter().copied()));
            granted = true;
        }

        if let Err(e) = host.update(dt) {
            error!(target: "demo", "module.update failed error='{}'", e);
            break;
        }

        for n in ui.drain_notifications() {
            match n.kind {
                NotificationKind::Info => info!(target: "screen", "{}", n.text),
                NotificationKind::Warning => warn!(target: "screen", "{}", n.text),
                NotificationKind::Error => error!(target: "screen", "{}", n.text),
            }
        }

        if run_for.is_some_and(|limit| uptime >= limit) {
            break;
        }
    }

    host.unload();
    let leaked = ledger.live();
    if !leaked.is_empty() {
        warn!(target: "demo", "resources.leaked count={} first={:?}", leaked.len(), leaked.first());
    }

    store.save()?;
    runtime.shutdown_timeout(Duration::from_secs(1));
    info!(target: "demo", "exit uptime_ms={}", started.elapsed().as_millis());
    Ok(())
}
