use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use overlay_assets::{ResourceLedger, ResourceToken};
use overlay_settings::{SettingCollection, SettingEntry};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::control::{ControlKind, ControlSpec, MenuItemState};
use crate::error::{UiError, UiResult};
use crate::geometry::{Color, Point};
use crate::notification::{Notification, NotificationBus, NotificationKind};

/// Name of the hidden setting collection that stores window locations.
pub const WINDOW_POSITIONS: &str = "window positions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

/// Where a new control is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// The shared sprite screen root.
    Screen,
    Control(ControlId),
}

type ClickHandler = Arc<dyn Fn(&Ui) + Send + Sync>;

struct Node {
    kind: ControlKind,
    parent: Option<ControlId>,
    children: SmallVec<[ControlId; 4]>,
    token: ResourceToken,
    on_click: Option<ClickHandler>,
}

#[derive(Default)]
struct Arena {
    next: u64,
    nodes: AHashMap<ControlId, Node>,
    window_ids: AHashSet<String>,
}

struct UiInner {
    arena: Mutex<Arena>,
    ledger: Arc<ResourceLedger>,
    positions: RwLock<Option<SettingCollection>>,
    notifications: NotificationBus,
}

/// Handle to the host UI surface. Cheap to clone.
#[derive(Clone)]
pub struct Ui {
    inner: Arc<UiInner>,
}

impl fmt::Debug for Ui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ui")
            .field("controls", &self.control_count())
            .finish()
    }
}

impl Ui {
    pub fn new(ledger: Arc<ResourceLedger>) -> Self {
        Self {
            inner: Arc::new(UiInner {
                arena: Mutex::new(Arena::default()),
                ledger,
                positions: RwLock::new(None),
                notifications: NotificationBus::new(),
            }),
        }
    }

    /// Collection used by windows with `saves_position`.
    #[inline]
    pub fn set_position_store(&self, positions: SettingCollection) {
        *self.inner.positions.write() = Some(positions);
    }

    #[inline]
    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.inner.ledger
    }

    /// Create a control owned by the returned handle, whatever its parent.
    ///
    /// Dropping the handle disposes the control and its subtree. Use
    /// [`Ui::create_child`] for children the parent should own.
    pub fn create(&self, spec: ControlSpec, parent: Parent) -> UiResult<OwnedControl> {
        let parent = match parent {
            Parent::Screen => None,
            Parent::Control(p) => Some(p),
        };
        let id = self.insert_spec(spec, parent)?;
        Ok(OwnedControl {
            id,
            ui: Arc::downgrade(&self.inner),
            armed: true,
        })
    }

    /// Create a control owned by `parent`. Disposing the parent disposes it.
    pub fn create_child(&self, spec: ControlSpec, parent: ControlId) -> UiResult<ControlId> {
        self.insert_spec(spec, Some(parent))
    }

    /// Append an item to a context menu.
    pub fn add_menu_item(&self, menu: ControlId, text: impl Into<String>) -> UiResult<ControlId> {
        self.expect_kind(menu, "context_menu")?;
        let text = text.into();
        self.insert(
            ControlKind::MenuItem(MenuItemState {
                text: text.clone(),
                submenu: None,
            }),
            text,
            Some(menu),
        )
    }

    /// Attach `submenu` to a menu item. The item takes ownership.
    pub fn set_submenu(&self, item: ControlId, submenu: OwnedControl) -> UiResult<()> {
        let sub_id = submenu.id();
        let replaced = {
            let mut g = self.inner.arena.lock();
            match g.nodes.get(&item).map(|n| &n.kind) {
                Some(ControlKind::MenuItem(_)) => {}
                Some(_) => {
                    return Err(UiError::WrongKind {
                        id: item,
                        expected: "menu_item",
                    })
                }
                None => return Err(UiError::Missing(item)),
            }
            match g.nodes.get(&sub_id).map(|n| &n.kind) {
                Some(ControlKind::ContextMenu) => {}
                Some(_) => {
                    return Err(UiError::WrongKind {
                        id: sub_id,
                        expected: "context_menu",
                    })
                }
                None => return Err(UiError::Missing(sub_id)),
            }

            if let Some(sub) = g.nodes.get_mut(&sub_id) {
                sub.parent = Some(item);
            }
            let mut replaced = None;
            if let Some(node) = g.nodes.get_mut(&item) {
                node.children.push(sub_id);
                if let ControlKind::MenuItem(state) = &mut node.kind {
                    replaced = state.submenu.replace(sub_id);
                }
            }
            replaced
        };

        submenu.disarm();
        if let Some(old) = replaced {
            self.dispose(old);
        }
        Ok(())
    }

    /// Dispose a control and its whole subtree.
    ///
    /// Returns `false` if the control no longer exists.
    pub fn dispose(&self, id: ControlId) -> bool {
        let released = {
            let mut g = self.inner.arena.lock();
            let Some(parent) = g.nodes.get(&id).map(|n| n.parent) else {
                return false;
            };
            if let Some(p) = parent.and_then(|p| g.nodes.get_mut(&p)) {
                p.children.retain(|c| *c != id);
            }

            let mut released = Vec::new();
            let mut stack = vec![id];
            while let Some(cur) = stack.pop() {
                let Some(node) = g.nodes.remove(&cur) else {
                    continue;
                };
                stack.extend(node.children.iter().copied());
                if let ControlKind::Window(w) = &node.kind {
                    g.window_ids.remove(&w.spec.id);
                }
                released.push((cur, node.kind.name(), node.token));
            }
            released
        };

        for (cid, kind, token) in &released {
            self.inner.ledger.release(*token);
            debug!(target: "ui", "control.dispose id={} kind='{}'", cid.0, kind);
        }
        true
    }

    pub fn set_label_text(&self, id: ControlId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(id, |k| match k {
            ControlKind::Label(l) => {
                l.spec.text = text;
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }

    pub fn set_background_color(&self, id: ControlId, color: Color) -> bool {
        self.update(id, |k| match k {
            ControlKind::FlowPanel(p) => {
                p.spec.background_color = color;
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }

    pub fn move_to(&self, id: ControlId, location: Point) -> bool {
        let saved = self.update(id, |k| match k {
            ControlKind::Window(w) => {
                w.spec.location = location;
                Some(w.spec.saves_position.then(|| w.spec.id.clone()))
            }
            ControlKind::FlowPanel(p) => {
                p.spec.location = location;
                Some(None)
            }
            ControlKind::Label(l) => {
                l.spec.location = location;
                Some(None)
            }
            _ => None,
        });

        match saved {
            Some(Some(Some(window_id))) => {
                match self.position_entry(&window_id, location) {
                    Ok(Some(entry)) => entry.set_value(location),
                    Ok(None) => {}
                    Err(e) => warn!(
                        target: "ui",
                        "window.position save failed id='{}' error='{}'",
                        window_id,
                        e
                    ),
                }
                true
            }
            Some(Some(None)) => true,
            _ => false,
        }
    }

    /// Show a named view inside a window.
    pub fn show_view(&self, id: ControlId, view: impl Into<String>) -> bool {
        let view = view.into();
        self.update(id, |k| match k {
            ControlKind::Window(w) => {
                w.view = Some(view);
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }

    /// Attach a right-click menu to a corner icon. The menu stays owned by
    /// whoever created it.
    pub fn set_menu(&self, icon: ControlId, menu: ControlId) -> bool {
        if !self.is_alive(menu) {
            return false;
        }
        self.update(icon, |k| match k {
            ControlKind::CornerIcon(c) => {
                c.menu = Some(menu);
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }

    pub fn on_click<F>(&self, id: ControlId, handler: F) -> bool
    where
        F: Fn(&Ui) + Send + Sync + 'static,
    {
        let mut g = self.inner.arena.lock();
        match g.nodes.get_mut(&id) {
            Some(node) => {
                node.on_click = Some(Arc::new(handler));
                true
            }
            None => false,
        }
    }

    /// Simulate a click. Returns `false` if nothing handled it.
    pub fn click(&self, id: ControlId) -> bool {
        let handler = {
            let g = self.inner.arena.lock();
            g.nodes.get(&id).and_then(|n| n.on_click.clone())
        };
        match handler {
            Some(h) => {
                h(self);
                true
            }
            None => false,
        }
    }

    pub fn with_control<R>(&self, id: ControlId, f: impl FnOnce(&ControlKind) -> R) -> Option<R> {
        let g = self.inner.arena.lock();
        g.nodes.get(&id).map(|n| f(&n.kind))
    }

    #[inline]
    pub fn is_alive(&self, id: ControlId) -> bool {
        self.inner.arena.lock().nodes.contains_key(&id)
    }

    #[inline]
    pub fn control_count(&self) -> usize {
        self.inner.arena.lock().nodes.len()
    }

    pub fn label_text(&self, id: ControlId) -> Option<String> {
        self.with_control(id, |k| match k {
            ControlKind::Label(l) => Some(l.spec.text.clone()),
            _ => None,
        })
        .flatten()
    }

    pub fn background_color(&self, id: ControlId) -> Option<Color> {
        self.with_control(id, |k| match k {
            ControlKind::FlowPanel(p) => Some(p.spec.background_color),
            _ => None,
        })
        .flatten()
    }

    pub fn location(&self, id: ControlId) -> Option<Point> {
        self.with_control(id, |k| match k {
            ControlKind::Window(w) => Some(w.spec.location),
            ControlKind::FlowPanel(p) => Some(p.spec.location),
            ControlKind::Label(l) => Some(l.spec.location),
            _ => None,
        })
        .flatten()
    }

    pub fn menu_of(&self, icon: ControlId) -> Option<ControlId> {
        self.with_control(icon, |k| match k {
            ControlKind::CornerIcon(c) => c.menu,
            _ => None,
        })
        .flatten()
    }

    /// Items of a context menu with their submenus, in insertion order.
    pub fn menu_items(&self, menu: ControlId) -> Vec<(String, Option<ControlId>)> {
        let g = self.inner.arena.lock();
        let Some(node) = g.nodes.get(&menu) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|c| match g.nodes.get(c).map(|n| &n.kind) {
                Some(ControlKind::MenuItem(item)) => Some((item.text.clone(), item.submenu)),
                _ => None,
            })
            .collect()
    }

    pub fn children(&self, id: ControlId) -> Vec<ControlId> {
        let g = self.inner.arena.lock();
        g.nodes
            .get(&id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: ControlId) -> Option<ControlId> {
        self.inner.arena.lock().nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn show_notification(&self, text: impl Into<String>, kind: NotificationKind) {
        let text = text.into();
        debug!(target: "ui", "notification.show kind={:?} text='{}'", kind, text);
        self.inner.notifications.send(Notification { text, kind });
    }

    pub fn drain_notifications(&self) -> Vec<Notification> {
        let mut out = Vec::new();
        self.inner.notifications.drain_into(&mut out);
        out
    }

    fn insert_spec(&self, mut spec: ControlSpec, parent: Option<ControlId>) -> UiResult<ControlId> {
        if let ControlSpec::Window(w) = &mut spec {
            if w.saves_position {
                if w.id.is_empty() {
                    return Err(UiError::MissingWindowId);
                }
                if let Some(entry) = self.position_entry(&w.id, w.location)? {
                    w.location = entry.value();
                }
            }
        }

        let label = match &spec {
            ControlSpec::Window(w) => w.title.clone(),
            ControlSpec::Label(l) => l.text.clone(),
            ControlSpec::CornerIcon(c) => c.tooltip.clone(),
            other => other.kind_name().to_string(),
        };
        let window_id = match &spec {
            ControlSpec::Window(w) if !w.id.is_empty() => Some(w.id.clone()),
            _ => None,
        };

        {
            let mut g = self.inner.arena.lock();
            if let Some(id) = window_id {
                if g.window_ids.contains(&id) {
                    return Err(UiError::DuplicateId(id));
                }
                g.window_ids.insert(id);
            }
        }

        let kind = ControlKind::from_spec(spec);
        let result = self.insert(kind.clone(), label, parent);
        if result.is_err() {
            if let ControlKind::Window(w) = &kind {
                self.inner.arena.lock().window_ids.remove(&w.spec.id);
            }
        }
        result
    }

    fn insert(
        &self,
        kind: ControlKind,
        label: String,
        parent: Option<ControlId>,
    ) -> UiResult<ControlId> {
        let mut g = self.inner.arena.lock();
        if let Some(p) = parent {
            if !g.nodes.contains_key(&p) {
                return Err(UiError::ParentMissing(p));
            }
        }

        g.next += 1;
        let id = ControlId(g.next);
        let kind_name = kind.name();
        let token = self.inner.ledger.acquire(kind_name, label);

        g.nodes.insert(
            id,
            Node {
                kind,
                parent,
                children: SmallVec::new(),
                token,
                on_click: None,
            },
        );
        if let Some(p) = parent.and_then(|p| g.nodes.get_mut(&p)) {
            p.children.push(id);
        }

        debug!(
            target: "ui",
            "control.create id={} kind='{}' parent={}",
            id.0,
            kind_name,
            parent.map_or_else(|| "screen".to_string(), |p| p.0.to_string())
        );
        Ok(id)
    }

    fn update<R>(&self, id: ControlId, f: impl FnOnce(&mut ControlKind) -> R) -> Option<R> {
        let mut g = self.inner.arena.lock();
        g.nodes.get_mut(&id).map(|n| f(&mut n.kind))
    }

    fn expect_kind(&self, id: ControlId, expected: &'static str) -> UiResult<()> {
        match self.with_control(id, |k| k.name()) {
            Some(name) if name == expected => Ok(()),
            Some(_) => Err(UiError::WrongKind { id, expected }),
            None => Err(UiError::Missing(id)),
        }
    }

    fn position_entry(&self, window_id: &str, default: Point) -> UiResult<Option<SettingEntry<Point>>> {
        let positions = self.inner.positions.read().clone();
        match positions {
            Some(c) => Ok(Some(c.define_hidden(window_id, default)?)),
            None => Ok(None),
        }
    }
}

/// Top-level control owned by the caller.
///
/// Dropping it disposes the control and every child. Not `Clone`: a control
/// is released exactly once.
#[must_use = "dropping an OwnedControl disposes it immediately"]
pub struct OwnedControl {
    id: ControlId,
    ui: Weak<UiInner>,
    armed: bool,
}

impl OwnedControl {
    #[inline]
    pub fn id(&self) -> ControlId {
        self.id
    }

    #[inline]
    pub fn dispose(self) {}

    /// Give up ownership without disposing (ownership moved elsewhere).
    fn disarm(mut self) -> ControlId {
        self.armed = false;
        self.id
    }
}

impl Drop for OwnedControl {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.ui.upgrade() {
            Ui { inner }.dispose(self.id);
        }
    }
}

impl fmt::Debug for OwnedControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedControl").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CornerIconSpec, FlowPanelSpec, LabelSpec, WindowSpec};

    fn ui() -> Ui {
        Ui::new(Arc::new(ResourceLedger::new()))
    }

    fn label(text: &str) -> ControlSpec {
        ControlSpec::Label(LabelSpec {
            text: text.into(),
            ..LabelSpec::default()
        })
    }

    #[test]
    fn disposing_a_panel_releases_its_labels_once() {
        let ui = ui();
        let panel = ui
            .create(ControlSpec::FlowPanel(FlowPanelSpec::default()), Parent::Screen)
            .unwrap();
        let header = ui.create_child(label("My Characters:"), panel.id()).unwrap();
        let names = ui.create_child(label("..."), panel.id()).unwrap();
        assert_eq!(ui.ledger().live_count(), 3);

        panel.dispose();

        assert!(!ui.is_alive(header));
        assert!(!ui.is_alive(names));
        assert_eq!(ui.ledger().live_count(), 0);
        assert_eq!(ui.ledger().stats().double_released, 0);
        assert!(!ui.dispose(names));
    }

    #[test]
    fn writes_to_disposed_labels_are_ignored() {
        let ui = ui();
        let panel = ui
            .create(ControlSpec::FlowPanel(FlowPanelSpec::default()), Parent::Screen)
            .unwrap();
        let names = ui.create_child(label("a"), panel.id()).unwrap();

        assert!(ui.set_label_text(names, "b"));
        drop(panel);
        assert!(!ui.set_label_text(names, "c"));
        assert_eq!(ui.label_text(names), None);
    }

    #[test]
    fn handle_owns_its_control_even_under_a_parent() {
        let ui = ui();
        let panel = ui
            .create(ControlSpec::FlowPanel(FlowPanelSpec::default()), Parent::Screen)
            .unwrap();
        let inner = ui.create(label("owned"), Parent::Control(panel.id())).unwrap();
        let inner_id = inner.id();
        assert_eq!(ui.children(panel.id()), vec![inner_id]);

        drop(inner);
        assert!(!ui.is_alive(inner_id));
        assert!(ui.is_alive(panel.id()));
        assert!(ui.children(panel.id()).is_empty());
        assert_eq!(ui.ledger().live_count(), 1);
    }

    #[test]
    fn window_ids_must_be_unique_while_alive() {
        let ui = ui();
        let spec = ControlSpec::Window(WindowSpec {
            id: "Example_My_Unique_ID_123".into(),
            ..WindowSpec::default()
        });
        let first = ui.create(spec.clone(), Parent::Screen).unwrap();
        assert!(matches!(
            ui.create(spec.clone(), Parent::Screen),
            Err(UiError::DuplicateId(_))
        ));

        first.dispose();
        assert!(ui.create(spec, Parent::Screen).is_ok());
    }

    #[test]
    fn saved_window_positions_are_restored() {
        let ui = ui();
        let positions = SettingCollection::new(WINDOW_POSITIONS);
        ui.set_position_store(positions.clone());

        let spec = ControlSpec::Window(WindowSpec {
            id: "w".into(),
            location: Point::new(300, 300),
            saves_position: true,
            ..WindowSpec::default()
        });

        let w = ui.create(spec.clone(), Parent::Screen).unwrap();
        assert_eq!(ui.location(w.id()), Some(Point::new(300, 300)));
        assert!(ui.move_to(w.id(), Point::new(10, 20)));
        w.dispose();

        let w = ui.create(spec, Parent::Screen).unwrap();
        assert_eq!(ui.location(w.id()), Some(Point::new(10, 20)));
        assert_eq!(positions.get::<Point>("w").unwrap().value(), Point::new(10, 20));
    }

    #[test]
    fn submenus_are_owned_by_their_item() {
        let ui = ui();
        let menu = ui.create(ControlSpec::ContextMenu, Parent::Screen).unwrap();
        let item = ui.add_menu_item(menu.id(), "ac").unwrap();

        let sub = ui.create(ControlSpec::ContextMenu, Parent::Screen).unwrap();
        let sub_id = sub.id();
        ui.add_menu_item(sub_id, "hodgins (Story)").unwrap();
        ui.set_submenu(item, sub).unwrap();

        assert!(ui.is_alive(sub_id));
        assert_eq!(ui.menu_items(menu.id()), vec![("ac".to_string(), Some(sub_id))]);

        menu.dispose();
        assert_eq!(ui.control_count(), 0);
        assert_eq!(ui.ledger().live_count(), 0);
    }

    #[test]
    fn corner_icon_click_shows_notification() {
        let ui = ui();
        let icon = ui
            .create(
                ControlSpec::CornerIcon(CornerIconSpec {
                    tooltip: "tip".into(),
                    priority: 1645843523,
                    ..CornerIconSpec::default()
                }),
                Parent::Screen,
            )
            .unwrap();
        ui.on_click(icon.id(), |ui| {
            ui.show_notification("Hello!", NotificationKind::Info)
        });

        assert!(ui.click(icon.id()));
        let shown = ui.drain_notifications();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].text, "Hello!");

        drop(icon);
        assert!(ui.drain_notifications().is_empty());
    }

    #[test]
    fn missing_parent_is_rejected() {
        let ui = ui();
        let panel = ui
            .create(ControlSpec::FlowPanel(FlowPanelSpec::default()), Parent::Screen)
            .unwrap();
        let id = panel.id();
        panel.dispose();

        assert!(matches!(
            ui.create_child(label("x"), id),
            Err(UiError::ParentMissing(_))
        ));
        assert_eq!(ui.ledger().live_count(), 0);
    }
}
