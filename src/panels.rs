use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SCRIPT_SOURCE: &str = "simplifiedUI.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelChannel {
    TopBar,
    AvatarApp,
    SettingsApp,
    HelpApp,
}

impl PanelChannel {
    pub const ALL: [PanelChannel; 4] =
        [PanelChannel::TopBar, PanelChannel::AvatarApp, PanelChannel::SettingsApp, PanelChannel::HelpApp];

    /// The `source` a panel stamps on every message it sends.
    pub fn source(self) -> &'static str {
        match self {
            PanelChannel::TopBar => "SimplifiedTopBar.qml",
            PanelChannel::AvatarApp => "AvatarApp.qml",
            PanelChannel::SettingsApp => "SettingsApp.qml",
            PanelChannel::HelpApp => "HelpApp.qml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopBarMessage {
    ToggleAvatarApp,
    ToggleSettingsApp,
    ToggleHelpApp,
    SetOutputMuted { muted: bool },
    ToggleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarAppMessage {
    UpdateAvatarThumbnailUrl { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAppMessage {
    HandleAvatarNametagMode { mode: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpAppMessage {
    GoToAudioSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMessage {
    TopBar(TopBarMessage),
    AvatarApp(AvatarAppMessage),
    SettingsApp(SettingsAppMessage),
    HelpApp(HelpAppMessage),
    /// Right source, but a method (or payload) this side doesn't understand.
    Unrecognized { source: String, method: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Looks a field up in `data` first and then next to `method`, where some panels put it.
    fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key).or_else(|| self.extra.get(key))
    }
}

/// Decodes a message received on `channel`. Messages stamped with another source are dropped
/// (`None`); unknown methods come back as [`PanelMessage::Unrecognized`].
pub fn decode(channel: PanelChannel, message: &Value) -> Option<PanelMessage> {
    let envelope = Envelope::deserialize(message).ok()?;
    if envelope.source != channel.source() {
        return None;
    }
    let decoded = match channel {
        PanelChannel::TopBar => decode_top_bar(&envelope).map(PanelMessage::TopBar),
        PanelChannel::AvatarApp => decode_avatar_app(&envelope).map(PanelMessage::AvatarApp),
        PanelChannel::SettingsApp => decode_settings_app(&envelope).map(PanelMessage::SettingsApp),
        PanelChannel::HelpApp => decode_help_app(&envelope).map(PanelMessage::HelpApp),
    };
    Some(decoded.unwrap_or_else(|| {
        tracing::info!(
            source = envelope.source.as_str(),
            method = envelope.method.as_str(),
            "unrecognized panel message"
        );
        PanelMessage::Unrecognized { source: envelope.source.clone(), method: envelope.method.clone() }
    }))
}

fn decode_top_bar(envelope: &Envelope) -> Option<TopBarMessage> {
    match envelope.method.as_str() {
        "toggleAvatarApp" => Some(TopBarMessage::ToggleAvatarApp),
        "toggleSettingsApp" => Some(TopBarMessage::ToggleSettingsApp),
        "toggleHelpApp" => Some(TopBarMessage::ToggleHelpApp),
        "setOutputMuted" => {
            envelope.field("outputMuted")?.as_bool().map(|muted| TopBarMessage::SetOutputMuted { muted })
        }
        "toggleStatus" => Some(TopBarMessage::ToggleStatus),
        _ => None,
    }
}

fn decode_avatar_app(envelope: &Envelope) -> Option<AvatarAppMessage> {
    match envelope.method.as_str() {
        "updateAvatarThumbnailURL" => {
            let url = envelope.field("avatarThumbnailURL")?.as_str()?;
            Some(AvatarAppMessage::UpdateAvatarThumbnailUrl { url: url.to_string() })
        }
        _ => None,
    }
}

fn decode_settings_app(envelope: &Envelope) -> Option<SettingsAppMessage> {
    match envelope.method.as_str() {
        "handleAvatarNametagMode" => {
            let mode = envelope.field("avatarNametagMode")?.as_str()?;
            Some(SettingsAppMessage::HandleAvatarNametagMode { mode: mode.to_string() })
        }
        _ => None,
    }
}

fn decode_help_app(envelope: &Envelope) -> Option<HelpAppMessage> {
    match envelope.method.as_str() {
        "goToAudioSettings" => Some(HelpAppMessage::GoToAudioSettings),
        _ => None,
    }
}

/// Messages sent from the script side to a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptMessage {
    UpdateAvatarThumbnailUrl { url: String },
    GoToSettingsTab { tab: String },
    UpdateStatusButton { status: String },
}

impl ScriptMessage {
    pub fn method(&self) -> &'static str {
        match self {
            ScriptMessage::UpdateAvatarThumbnailUrl { .. } => "updateAvatarThumbnailURL",
            ScriptMessage::GoToSettingsTab { .. } => "goToSettingsTab",
            ScriptMessage::UpdateStatusButton { .. } => "updateStatusButton",
        }
    }

    pub fn envelope(&self) -> Envelope {
        let (key, value) = match self {
            ScriptMessage::UpdateAvatarThumbnailUrl { url } => ("avatarThumbnailURL", url),
            ScriptMessage::GoToSettingsTab { tab } => ("settingsTab", tab),
            ScriptMessage::UpdateStatusButton { status } => ("currentStatus", status),
        };
        let mut data = Map::new();
        data.insert(key.to_string(), Value::String(value.clone()));
        Envelope {
            source: SCRIPT_SOURCE.to_string(),
            method: self.method().to_string(),
            data: Value::Object(data),
            extra: Map::new(),
        }
    }

    pub fn encode(&self) -> Value {
        serde_json::to_value(self.envelope()).unwrap_or(Value::Null)
    }
}
