use async_trait::async_trait;
use log::{debug, info};
use overlay_assets::directories::count_files;
use overlay_assets::{OwnedTexture, SharedTexture};
use overlay_core::{Frame, IntervalTimer, Module, ModuleCtx, ModuleResult, TaskSlot};
use overlay_settings::{SettingCollection, Subscription};
use overlay_ui::{
    Color, ControlId, ControlSpec, CornerIconSpec, FlowDirection, FlowPanelSpec, LabelSpec,
    NotificationKind, OwnedControl, Parent, Point, Rect, Ui, WindowSpec,
};
use overlay_webapi::Dungeon;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::ExampleConfig;
use crate::refresh::refresh_authenticated_data;
use crate::settings::ExampleSettings;

pub const MODULE_ID: &str = "example";
pub const HEADER_TEXT: &str = "My Characters:";
pub const LOADING_TEXT: &str = "getting data from api...";
pub const GREETING: &str = "Hello from the overlay!";

const DISPLAY_NAME: &str = "Example Module";
const WINDOW_BACKGROUND: &str = "155985.png";
const MUG: &str = "test/603447.png";
const MUG_ASSET_ID: u32 = 603_447;

struct Timers {
    notification: IntervalTimer,
    refresh: IntervalTimer,
    notification_text: String,
}

/// Everything created during one load cycle.
#[derive(Default)]
struct LoadState {
    ui: Option<Ui>,
    characters_panel: Option<OwnedControl>,
    character_names: Option<ControlId>,
    window_background: Option<OwnedTexture>,
    mug: Option<OwnedTexture>,
    mug_shared: Option<SharedTexture>,
    window: Option<OwnedControl>,
    corner_icon: Option<OwnedControl>,
    dungeon_menu: Option<OwnedControl>,
    dungeons: Vec<Dungeon>,
    timers: Option<Timers>,
    /// Fresh per cycle so a refresh left over from the last one never blocks this one.
    refresh_slot: Option<TaskSlot>,
}

pub struct ExampleModule {
    settings: Mutex<Option<ExampleSettings>>,
    colour_subscription: Mutex<Option<Subscription>>,
    state: Arc<Mutex<LoadState>>,
}

impl Default for ExampleModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ExampleModule {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(None),
            colour_subscription: Mutex::new(None),
            state: Arc::new(Mutex::new(LoadState::default())),
        }
    }

    pub fn settings(&self) -> Option<ExampleSettings> {
        self.settings.lock().clone()
    }

    pub fn characters_panel(&self) -> Option<ControlId> {
        self.state.lock().characters_panel.as_ref().map(OwnedControl::id)
    }

    pub fn character_names_label(&self) -> Option<ControlId> {
        self.state.lock().character_names
    }

    pub fn window(&self) -> Option<ControlId> {
        self.state.lock().window.as_ref().map(OwnedControl::id)
    }

    pub fn corner_icon(&self) -> Option<ControlId> {
        self.state.lock().corner_icon.as_ref().map(OwnedControl::id)
    }

    pub fn dungeon_menu(&self) -> Option<ControlId> {
        self.state.lock().dungeon_menu.as_ref().map(OwnedControl::id)
    }

    pub fn dungeons(&self) -> Vec<Dungeon> {
        self.state.lock().dungeons.clone()
    }

    pub fn has_shared_mug(&self) -> bool {
        self.state.lock().mug_shared.is_some()
    }

    #[inline]
    pub fn is_refresh_running(&self) -> bool {
        self.state
            .lock()
            .refresh_slot
            .as_ref()
            .is_some_and(TaskSlot::is_busy)
    }

    /// Store `value` in the current cycle's state.
    ///
    /// Once the context is retired the value is handed back so the caller
    /// drops it right away.
    fn adopt<T>(
        &self,
        ctx: &ModuleCtx,
        value: T,
        slot: impl FnOnce(&mut LoadState) -> &mut Option<T>,
    ) -> Option<T> {
        let mut s = self.state.lock();
        if !ctx.is_live() {
            return Some(value);
        }
        *slot(&mut s) = Some(value);
        None
    }

    fn build_characters_panel(&self, ctx: &ModuleCtx, colour: Color) -> ModuleResult<bool> {
        let ui = ctx.ui();
        let panel = ui.create(
            ControlSpec::FlowPanel(FlowPanelSpec {
                background_color: colour,
                flow_direction: FlowDirection::SingleTopToBottom,
                auto_size: true,
                location: Point::new(200, 200),
            }),
            Parent::Screen,
        )?;

        ui.create_child(
            ControlSpec::Label(LabelSpec {
                text: HEADER_TEXT.into(),
                text_color: Color::RED,
                font_size: 32,
                show_shadow: true,
                ..LabelSpec::default()
            }),
            panel.id(),
        )?;
        let names = ui.create_child(
            ControlSpec::Label(LabelSpec {
                text: LOADING_TEXT.into(),
                text_color: Color::DARK_GRAY,
                font_size: 32,
                show_shadow: true,
                ..LabelSpec::default()
            }),
            panel.id(),
        )?;

        let mut s = self.state.lock();
        if !ctx.is_live() {
            drop(s);
            panel.dispose();
            return Ok(false);
        }
        s.characters_panel = Some(panel);
        s.character_names = Some(names);
        Ok(true)
    }

    fn log_directories(&self, ctx: &ModuleCtx) -> ModuleResult<()> {
        let dirs = ctx.directories();
        for name in dirs.registered_directories() {
            let full = dirs.full_directory_path(name)?;
            let files = count_files(&full)?;
            info!(
                target: "example",
                "directory name='{}' path='{}' files={}",
                name,
                full.display(),
                files
            );
        }
        Ok(())
    }

    fn build_dungeon_menu(&self, ui: &Ui, dungeons: &[Dungeon]) -> ModuleResult<OwnedControl> {
        let menu = ui.create(ControlSpec::ContextMenu, Parent::Screen)?;
        for dungeon in dungeons {
            let paths = ui.create(ControlSpec::ContextMenu, Parent::Screen)?;
            for path in &dungeon.paths {
                ui.add_menu_item(paths.id(), format!("{} ({})", path.id, path.kind))?;
            }
            let item = ui.add_menu_item(menu.id(), dungeon.id.clone())?;
            ui.set_submenu(item, paths)?;
        }
        Ok(menu)
    }

    fn dispatch_refresh(&self, ctx: &Arc<ModuleCtx>) {
        let (permit, label) = {
            let s = self.state.lock();
            let Some(slot) = s.refresh_slot.as_ref() else {
                return;
            };
            (slot.try_acquire(), s.character_names)
        };
        let Some(permit) = permit else {
            debug!(target: "example", "characters.refresh skipped, previous still running");
            return;
        };

        let api = ctx.api().clone();
        let ui = ctx.ui().clone();
        let spawned = ctx.spawn(async move {
            let _permit = permit;
            let outcome = refresh_authenticated_data(&api, &ui, label).await;
            debug!(target: "example", "characters.refresh outcome={:?}", outcome);
        });
        if spawned.is_none() {
            debug!(target: "example", "characters.refresh not dispatched, context retired");
        }
    }
}

#[async_trait]
impl Module for ExampleModule {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn define_settings(&self, settings: &SettingCollection) -> ModuleResult<()> {
        let defined = ExampleSettings::define(settings)?;
        defined.bool_example.set_value(false);

        let state = Arc::downgrade(&self.state);
        let subscription = defined.enum_example.subscribe(move |ev| {
            let Some(state) = state.upgrade() else {
                return;
            };
            let target = {
                let s = state.lock();
                match (&s.ui, &s.characters_panel) {
                    (Some(ui), Some(panel)) => Some((ui.clone(), panel.id())),
                    _ => None,
                }
            };
            if let Some((ui, panel)) = target {
                ui.set_background_color(panel, ev.new.color());
            }
        });

        *self.colour_subscription.lock() = Some(subscription);
        *self.settings.lock() = Some(defined);
        Ok(())
    }

    async fn load_async(&self, ctx: Arc<ModuleCtx>) -> ModuleResult<()> {
        let config: ExampleConfig = ctx.config().parse()?;
        let colour = self
            .settings()
            .map(|s| s.enum_example.value().color())
            .unwrap_or(Color::BLUE);

        {
            let mut s = self.state.lock();
            if !ctx.is_live() {
                return Ok(());
            }
            *s = LoadState {
                ui: Some(ctx.ui().clone()),
                refresh_slot: Some(TaskSlot::new("characters.refresh")),
                ..LoadState::default()
            };
        }

        if !self.build_characters_panel(&ctx, colour)? {
            return Ok(());
        }

        // Public endpoint: a failure leaves the menu empty.
        let dungeons = match ctx.api().dungeons().await {
            Ok(d) => d,
            Err(e) => {
                info!(target: "example", "dungeons.fetch failed error='{}'", e);
                Vec::new()
            }
        };
        {
            let mut s = self.state.lock();
            if !ctx.is_live() {
                return Ok(());
            }
            s.dungeons = dungeons.clone();
        }

        self.log_directories(&ctx)?;

        let background = ctx.contents().texture(WINDOW_BACKGROUND)?;
        let background_handle = background.handle();
        if self.adopt(&ctx, background, |s| &mut s.window_background).is_some() {
            return Ok(());
        }
        let mug = ctx.contents().texture(MUG)?;
        let mug_handle = mug.handle();
        if self.adopt(&ctx, mug, |s| &mut s.mug).is_some() {
            return Ok(());
        }
        let mug_shared = ctx.dat_cache().texture(MUG_ASSET_ID);
        let icon = mug_shared.as_ref().map(SharedTexture::handle);
        if let Some(shared) = mug_shared {
            if self.adopt(&ctx, shared, |s| &mut s.mug_shared).is_some() {
                return Ok(());
            }
        }

        let ui = ctx.ui();
        let window = ui.create(
            ControlSpec::Window(WindowSpec {
                background: Some(background_handle),
                window_region: Rect::new(40, 26, 913, 691),
                content_region: Rect::new(70, 71, 839, 605),
                title: "Example Window Title".into(),
                subtitle: "Example Subtitle".into(),
                emblem: Some(mug_handle),
                location: Point::new(300, 300),
                saves_position: true,
                id: config.window_id.clone(),
            }),
            Parent::Screen,
        )?;
        ui.show_view(window.id(), "overlay settings");
        if self.adopt(&ctx, window, |s| &mut s.window).is_some() {
            return Ok(());
        }

        let corner_icon = ui.create(
            ControlSpec::CornerIcon(CornerIconSpec {
                icon,
                tooltip: format!("My Corner Icon Tooltip for {DISPLAY_NAME}"),
                priority: config.corner_icon_priority,
            }),
            Parent::Screen,
        )?;
        ui.on_click(corner_icon.id(), |ui| {
            ui.show_notification(GREETING, NotificationKind::Info)
        });
        let icon_id = corner_icon.id();
        if self.adopt(&ctx, corner_icon, |s| &mut s.corner_icon).is_some() {
            return Ok(());
        }

        let menu = self.build_dungeon_menu(ui, &dungeons)?;
        ui.set_menu(icon_id, menu.id());
        if self.adopt(&ctx, menu, |s| &mut s.dungeon_menu).is_some() {
            return Ok(());
        }

        let notification_text = format!(
            "The example module shows this message every {} seconds!",
            config.notification_interval_ms / 1000
        );
        let timers = Timers {
            notification: IntervalTimer::from_millis(config.notification_interval_ms),
            refresh: IntervalTimer::from_millis(config.refresh_interval_ms),
            notification_text,
        };
        // The timers are plain values; nothing to release if we were retired.
        let _ = self.adopt(&ctx, timers, |s| &mut s.timers);

        info!(
            target: "example",
            "module.load done dungeons={} shared_icon={}",
            dungeons.len(),
            icon_id_present(ui, icon_id)
        );
        Ok(())
    }

    fn update(&self, ctx: &Arc<ModuleCtx>, frame: &Frame) -> ModuleResult<()> {
        let (notify, refresh) = {
            let mut s = self.state.lock();
            let Some(t) = s.timers.as_mut() else {
                return Ok(());
            };
            let notify = t
                .notification
                .tick(frame.dt)
                .then(|| t.notification_text.clone());
            (notify, t.refresh.tick(frame.dt))
        };

        if let Some(text) = notify {
            ctx.ui().show_notification(text, NotificationKind::Warning);
        }
        if refresh {
            self.dispatch_refresh(ctx);
        }
        Ok(())
    }

    fn unload(&self, _ctx: &ModuleCtx) {
        if let Some(sub) = self.colour_subscription.lock().take() {
            sub.unsubscribe();
        }

        let released = std::mem::take(&mut *self.state.lock());
        let LoadState {
            corner_icon,
            dungeon_menu,
            characters_panel,
            window,
            window_background,
            mug,
            mug_shared,
            ..
        } = released;

        let mut count = 0usize;
        // The panel takes its labels with it.
        for control in [corner_icon, dungeon_menu, characters_panel, window]
            .into_iter()
            .flatten()
        {
            control.dispose();
            count += 1;
        }
        for texture in [window_background, mug].into_iter().flatten() {
            texture.dispose();
            count += 1;
        }
        // Host-owned; dropping our handle releases nothing.
        drop(mug_shared);

        info!(target: "example", "module.unload released={}", count);
    }
}

fn icon_id_present(ui: &Ui, icon: ControlId) -> bool {
    ui.with_control(icon, |k| match k {
        overlay_ui::ControlKind::CornerIcon(c) => c.spec.icon.is_some(),
        _ => false,
    })
    .unwrap_or(false)
}
