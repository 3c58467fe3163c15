//! Overlay UI surface.
//!
//! Controls live in an arena rooted at the shared sprite screen. Top-level
//! controls are handed out as [`OwnedControl`] values that dispose their
//! whole subtree on drop; nested controls are owned by their parent and
//! referenced by [`ControlId`].

pub mod control;
pub mod error;
pub mod geometry;
pub mod notification;
pub mod ui;

pub use control::{
    ControlKind, ControlSpec, CornerIconSpec, CornerIconState, FlowDirection, FlowPanelSpec,
    FlowPanelState, LabelSpec, LabelState, MenuItemState, WindowSpec, WindowState,
};
pub use error::{UiError, UiResult};
pub use geometry::{Color, Point, Rect};
pub use notification::{Notification, NotificationBus, NotificationKind};
pub use ui::{ControlId, OwnedControl, Parent, Ui, WINDOW_POSITIONS};
