use log::{debug, info};
use overlay_ui::{ControlId, Ui};
use overlay_webapi::{ApiManager, TokenPermission};

/// Shown instead of character names while no usable subtoken exists.
pub const PLACEHOLDER: &str = "api permissions are missing or api sub token not available yet";

/// `Account` is on every key, so it also tells whether a token exists at all.
pub const REQUIRED_PERMISSIONS: [TokenPermission; 2] =
    [TokenPermission::Account, TokenPermission::Characters];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No request was made; the placeholder is shown.
    MissingPermissions,
    /// The label now lists this many characters.
    Updated(usize),
    /// The request failed; the label was left as it was.
    Failed,
}

/// Fetch character names and show them in `label`.
///
/// Permissions are checked on every call since the host may grant or revoke
/// the subtoken at any time. Failures are logged at `info`: the API can be
/// down for days and this must not raise alerts.
pub async fn refresh_authenticated_data(
    api: &ApiManager,
    ui: &Ui,
    label: Option<ControlId>,
) -> RefreshOutcome {
    if !api.has_permissions(&REQUIRED_PERMISSIONS) {
        set_label(ui, label, PLACEHOLDER);
        return RefreshOutcome::MissingPermissions;
    }

    match api.characters().await {
        Ok(characters) => {
            let text = characters
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            set_label(ui, label, &text);
            RefreshOutcome::Updated(characters.len())
        }
        Err(e) => {
            info!(target: "example", "characters.fetch failed error='{}'", e);
            RefreshOutcome::Failed
        }
    }
}

fn set_label(ui: &Ui, label: Option<ControlId>, text: &str) {
    let written = label.is_some_and(|id| ui.set_label_text(id, text));
    if !written {
        debug!(target: "example", "characters.label gone, text dropped");
    }
}
