use overlay_assets::{ContentsManager, DatAssetCache, DirectoriesManager};
use overlay_settings::SettingCollection;
use overlay_ui::Ui;
use overlay_webapi::ApiManager;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::ModuleConfig;
use crate::liveness::LivenessToken;

/// Collaborators the host grants a module.
#[derive(Clone)]
pub struct ModuleParams {
    /// The module's root setting collection.
    pub settings: SettingCollection,
    pub contents: Arc<ContentsManager>,
    pub dat_cache: Arc<DatAssetCache>,
    pub directories: Arc<DirectoriesManager>,
    pub api: ApiManager,
    pub ui: Ui,
    pub config: ModuleConfig,
}

/// Context of one load cycle.
///
/// Created by the host on load and threaded through every call. Once the
/// host drops it on unload (and in-flight tasks finish) nothing keeps the
/// module's load-cycle state reachable.
pub struct ModuleCtx {
    module_id: &'static str,
    params: ModuleParams,
    liveness: LivenessToken,
    runtime: Handle,
}

impl ModuleCtx {
    pub fn new(module_id: &'static str, params: ModuleParams, runtime: Handle) -> Self {
        Self {
            module_id,
            params,
            liveness: LivenessToken::new(),
            runtime,
        }
    }

    #[inline]
    pub fn module_id(&self) -> &'static str {
        self.module_id
    }

    #[inline]
    pub fn settings(&self) -> &SettingCollection {
        &self.params.settings
    }

    #[inline]
    pub fn contents(&self) -> &ContentsManager {
        &self.params.contents
    }

    #[inline]
    pub fn dat_cache(&self) -> &DatAssetCache {
        &self.params.dat_cache
    }

    #[inline]
    pub fn directories(&self) -> &DirectoriesManager {
        &self.params.directories
    }

    #[inline]
    pub fn api(&self) -> &ApiManager {
        &self.params.api
    }

    #[inline]
    pub fn ui(&self) -> &Ui {
        &self.params.ui
    }

    #[inline]
    pub fn config(&self) -> &ModuleConfig {
        &self.params.config
    }

    #[inline]
    pub fn liveness(&self) -> &LivenessToken {
        &self.liveness
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    /// Run `fut` on the host runtime without waiting for it.
    ///
    /// Returns `None` once the context has been retired.
    pub fn spawn<F>(&self, fut: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if !self.is_live() {
            return None;
        }
        Some(self.runtime.spawn(fut))
    }
}
