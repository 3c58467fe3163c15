use overlay_assets::AssetError;
use overlay_settings::SettingsError;
use overlay_ui::UiError;
use overlay_webapi::ApiError;
use thiserror::Error;

use crate::phase::LifecyclePhase;

/// Error crossing the module/host boundary.
///
/// Collaborator errors convert through `?`; modules may still map their own
/// failures into [`ModuleError::Other`].
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module '{module}' cannot {op} while {phase:?}")]
    InvalidState {
        module: &'static str,
        op: &'static str,
        phase: LifecyclePhase,
    },

    #[error("module '{module}' failed to load: {source}")]
    LoadFailed {
        module: &'static str,
        #[source]
        source: Box<ModuleError>,
    },

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Ui(#[from] UiError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Other(String),
}

pub type ModuleResult<T> = Result<T, ModuleError>;
