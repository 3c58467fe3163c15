use log::debug;
use overlay_core::ModuleResult;
use overlay_settings::{SettingCollection, SettingEntry};
use overlay_ui::Color;
use serde::{Deserialize, Serialize};

/// Name of the sub-collection that is not shown in the settings UI.
pub const INTERNAL_COLLECTION: &str = "internal settings (not visible in UI)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorType {
    #[default]
    Blue,
    Black,
}

impl ColorType {
    #[inline]
    pub fn color(self) -> Color {
        match self {
            ColorType::Black => Color::BLACK,
            ColorType::Blue => Color::BLUE,
        }
    }
}

/// Handles kept from definition time.
#[derive(Debug, Clone)]
pub struct ExampleSettings {
    pub example: SettingEntry<String>,
    pub bool_example: SettingEntry<bool>,
    pub string_example: SettingEntry<String>,
    /// Bounded to `[0, 255]`; out-of-range writes are clamped.
    pub int_example: SettingEntry<i32>,
    pub enum_example: SettingEntry<ColorType>,
    pub internal: SettingCollection,
    pub window_x: SettingEntry<i32>,
    pub window_y: SettingEntry<i32>,
}

impl ExampleSettings {
    pub fn define(settings: &SettingCollection) -> ModuleResult<Self> {
        let example = settings.define_setting(
            "ExampleSetting",
            "This is the default value of the setting".to_string(),
            || "Display name of setting".into(),
            || "Tooltip text of setting".into(),
        )?;

        let bool_example = settings.define_setting(
            "bool example",
            true,
            || "This is a bool setting (checkbox)".into(),
            || "Settings can be many different types".into(),
        )?;

        let string_example = settings.define_setting(
            "string example",
            "myText".to_string(),
            || "This is an string setting (textbox)".into(),
            || "Settings can be many different types".into(),
        )?;

        let int_example = settings.define_setting(
            "int example",
            20,
            || "This is an int setting (slider)".into(),
            || "Settings can be many different types".into(),
        )?;
        int_example.set_range(0, 255)?;

        let enum_example = settings.define_setting(
            "enum example",
            ColorType::Blue,
            || "This is an enum setting (drop down menu)".into(),
            || "...".into(),
        )?;

        // Handles are the access path; a by-key lookup works but fails on typos.
        let looked_up = settings.get::<String>("ExampleSetting")?;
        debug!(
            target: "example",
            "settings.lookup key='{}' value='{}'",
            looked_up.key(),
            looked_up.value()
        );

        let internal = settings.add_sub_collection(INTERNAL_COLLECTION);
        let window_x = internal.define_hidden("example window x position", 50)?;
        let window_y = internal.define_hidden("example window y position", 50)?;

        Ok(Self {
            example,
            bool_example,
            string_example,
            int_example,
            enum_example,
            internal,
            window_x,
            window_y,
        })
    }
}
