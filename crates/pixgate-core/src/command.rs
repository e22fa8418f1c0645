// ── Command API ──
//
// All device operations flow through a unified `Command` enum. Each
// variant carries only the fields relevant to that operation; field
// constraints are enforced by the codec, exhaustively per variant,
// before any network I/O happens.

use serde::Deserialize;
use serde_json::Value;

use crate::model::DeviceFamily;

fn default_text_id() -> u8 {
    1
}
fn default_text_width() -> u32 {
    56
}
fn default_speed() -> u32 {
    10
}
fn default_color() -> String {
    "#FFFFFF".to_owned()
}
fn default_align() -> u8 {
    1
}
fn default_lcd_array() -> Vec<u8> {
    vec![1, 1, 1, 1, 1]
}

/// Scrolling text for a single-panel display (`Draw/SendHttpText`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    /// 24-bit RGB as `#RRGGBB`.
    #[serde(default = "default_color")]
    pub color: String,
    /// Font index (0-7).
    #[serde(default)]
    pub font: u8,
    /// Scroll direction: 0=left, 1=right.
    #[serde(default)]
    pub direction: u8,
    /// Text box width in pixels (16-64).
    #[serde(default = "default_text_width")]
    pub text_width: u32,
    /// Scroll speed in ms per step. Clamped to the device's 16-bit field.
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// Alignment: 1=left, 2=center, 3=right.
    #[serde(default = "default_align")]
    pub align: u8,
    /// Slot identifier on the device (0-19).
    #[serde(default = "default_text_id")]
    pub text_id: u8,
}

/// One animation frame pushed to a single-panel display
/// (`Draw/SendHttpGif`). `data` is the raw RGB frame; the codec
/// base64-embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimationFrame {
    /// Total frames in the animation (1-60).
    pub pic_num: u32,
    /// Frame width; defaults to the device resolution.
    #[serde(default)]
    pub pic_width: Option<u32>,
    /// 0-based index of this frame.
    pub pic_offset: u32,
    /// Animation identifier (>= 1).
    pub pic_id: u32,
    /// Frame delay in ms. Clamped to the device's 16-bit field.
    pub pic_speed: u32,
    /// Raw RGB pixel data, `width * width * 3` bytes.
    #[serde(with = "serde_bytes_b64")]
    pub data: Vec<u8>,
}

/// Scrolling text on one panel of a multi-panel display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateTextRequest {
    /// Target panel index (0-4).
    pub lcd_index: u8,
    #[serde(flatten)]
    pub text: TextRequest,
}

/// One animation frame for a multi-panel display, fanned out to the
/// panels selected by `lcd_array`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateGifFrame {
    /// Target panels: exactly 5 values of 0/1.
    #[serde(default = "default_lcd_array")]
    pub lcd_array: Vec<u8>,
    #[serde(flatten)]
    pub frame: AnimationFrame,
}

/// All operations the gateway can issue against a device.
///
/// A `Command` is only valid relative to a specific
/// [`DeviceFamily`](crate::model::DeviceFamily); the codec rejects
/// mismatches with `UnsupportedOperation` before touching the network.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Single-panel ─────────────────────────────────────────────────
    /// Scrolling text.
    Text(TextRequest),
    /// Play a GIF fetched by the device from a URL (`Device/PlayTFGif`).
    ImageUrl { url: String },
    /// Push one animation frame.
    Animation(AnimationFrame),

    // ── Either family ────────────────────────────────────────────────
    /// Set panel brightness, 0-100 (`Channel/SetBrightness`).
    Brightness { percent: u32 },
    /// Reset the device's animation-id counter (`Draw/ResetHttpGifId`).
    ResetGifId,
    /// Raw vendor payload passthrough; must carry a `Command` key.
    Raw(Value),

    // ── Multi-panel ──────────────────────────────────────────────────
    /// Scrolling text on one panel.
    GateText(GateTextRequest),
    /// Animation frame fanned out to selected panels.
    GateGifFrame(GateGifFrame),
    /// Play GIFs from URLs on selected panels (`Device/PlayGif`).
    GatePlayGif {
        lcd_array: Vec<u8>,
        file_names: Vec<String>,
    },
    /// Batch of raw sub-commands (`Draw/CommandList`).
    GateCommandList { commands: Vec<Value> },
}

impl Command {
    /// The vendor-facing operation name, used in errors and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::ImageUrl { .. } => "image-url",
            Self::Animation(_) => "animation",
            Self::Brightness { .. } => "brightness",
            Self::ResetGifId => "reset-gif-id",
            Self::Raw(_) => "raw",
            Self::GateText(_) => "gate-text",
            Self::GateGifFrame(_) => "gate-gif-frame",
            Self::GatePlayGif { .. } => "gate-play-gif",
            Self::GateCommandList { .. } => "gate-command-list",
        }
    }

    /// Whether this variant is valid for the given device family.
    pub fn supports(&self, family: DeviceFamily) -> bool {
        match self {
            Self::Text(_) | Self::ImageUrl { .. } | Self::Animation(_) => {
                family == DeviceFamily::SinglePanel
            }
            Self::Brightness { .. } | Self::ResetGifId | Self::Raw(_) => true,
            Self::GateText(_)
            | Self::GateGifFrame(_)
            | Self::GatePlayGif { .. }
            | Self::GateCommandList { .. } => family == DeviceFamily::MultiPanel,
        }
    }
}

/// Frame bytes arrive from the HTTP layer base64-encoded; internally we
/// carry raw bytes so the codec owns the (re-)encoding.
mod serde_bytes_b64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
