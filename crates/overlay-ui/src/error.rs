use thiserror::Error;

use crate::ui::ControlId;

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("parent control {0:?} does not exist")]
    ParentMissing(ControlId),

    #[error("control {0:?} does not exist")]
    Missing(ControlId),

    #[error("control {id:?} is not a {expected}")]
    WrongKind { id: ControlId, expected: &'static str },

    #[error("window id '{0}' is already in use")]
    DuplicateId(String),

    #[error("window id must not be empty when saves_position is set")]
    MissingWindowId,

    #[error(transparent)]
    Settings(#[from] overlay_settings::SettingsError),
}
