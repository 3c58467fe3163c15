use overlay_assets::TextureHandle;

use crate::geometry::{Color, Point, Rect};
use crate::ui::ControlId;

/// Window with the game's standard chrome.
#[derive(Debug, Clone, Default)]
pub struct WindowSpec {
    pub background: Option<TextureHandle>,
    pub window_region: Rect,
    pub content_region: Rect,
    pub title: String,
    pub subtitle: String,
    pub emblem: Option<TextureHandle>,
    pub location: Point,
    /// Persist the location across sessions, keyed by `id`.
    pub saves_position: bool,
    /// Must be unique across the host and every loaded module.
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowDirection {
    #[default]
    SingleTopToBottom,
    SingleLeftToRight,
}

#[derive(Debug, Clone)]
pub struct FlowPanelSpec {
    pub background_color: Color,
    pub flow_direction: FlowDirection,
    pub auto_size: bool,
    pub location: Point,
}

impl Default for FlowPanelSpec {
    fn default() -> Self {
        Self {
            background_color: Color::TRANSPARENT,
            flow_direction: FlowDirection::default(),
            auto_size: true,
            location: Point::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelSpec {
    pub text: String,
    pub text_color: Color,
    pub font_size: u32,
    pub show_shadow: bool,
    pub auto_size: bool,
    pub location: Point,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_color: Color::WHITE,
            font_size: 14,
            show_shadow: false,
            auto_size: true,
            location: Point::default(),
        }
    }
}

/// Icon in the top-left icon row next to the game's own icons.
#[derive(Debug, Clone, Default)]
pub struct CornerIconSpec {
    pub icon: Option<TextureHandle>,
    pub tooltip: String,
    /// Ordering key among all corner icons. Use a fixed, module-unique value.
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub enum ControlSpec {
    Window(WindowSpec),
    FlowPanel(FlowPanelSpec),
    Label(LabelSpec),
    CornerIcon(CornerIconSpec),
    ContextMenu,
}

impl ControlSpec {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            ControlSpec::Window(_) => "window",
            ControlSpec::FlowPanel(_) => "flow_panel",
            ControlSpec::Label(_) => "label",
            ControlSpec::CornerIcon(_) => "corner_icon",
            ControlSpec::ContextMenu => "context_menu",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowState {
    pub spec: WindowSpec,
    pub view: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlowPanelState {
    pub spec: FlowPanelSpec,
}

#[derive(Debug, Clone)]
pub struct LabelState {
    pub spec: LabelSpec,
}

#[derive(Debug, Clone)]
pub struct CornerIconState {
    pub spec: CornerIconSpec,
    /// Right-click menu. Referenced, not owned.
    pub menu: Option<ControlId>,
}

#[derive(Debug, Clone)]
pub struct MenuItemState {
    pub text: String,
    /// Submenu; owned by this item.
    pub submenu: Option<ControlId>,
}

/// Live state of a control.
#[derive(Debug, Clone)]
pub enum ControlKind {
    Window(WindowState),
    FlowPanel(FlowPanelState),
    Label(LabelState),
    CornerIcon(CornerIconState),
    ContextMenu,
    MenuItem(MenuItemState),
}

impl ControlKind {
    pub(crate) fn from_spec(spec: ControlSpec) -> Self {
        match spec {
            ControlSpec::Window(spec) => ControlKind::Window(WindowState { spec, view: None }),
            ControlSpec::FlowPanel(spec) => ControlKind::FlowPanel(FlowPanelState { spec }),
            ControlSpec::Label(spec) => ControlKind::Label(LabelState { spec }),
            ControlSpec::CornerIcon(spec) => {
                ControlKind::CornerIcon(CornerIconState { spec, menu: None })
            }
            ControlSpec::ContextMenu => ControlKind::ContextMenu,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Window(_) => "window",
            ControlKind::FlowPanel(_) => "flow_panel",
            ControlKind::Label(_) => "label",
            ControlKind::CornerIcon(_) => "corner_icon",
            ControlKind::ContextMenu => "context_menu",
            ControlKind::MenuItem(_) => "menu_item",
        }
    }
}
