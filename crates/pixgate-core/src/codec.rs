// ── Wire codec ──
//
// Pure, stateless translation from a typed `Command` + `DeviceProfile`
// into the vendor's JSON wire format. Every field constraint is checked
// here, exhaustively per variant, so validation failures surface before
// any network I/O. No side effects; safe to call concurrently.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::command::{AnimationFrame, Command, TextRequest};
use crate::error::CoreError;
use crate::model::{DeviceProfile, SINGLE_PANEL_RESOLUTIONS};
use pixgate_api::WireFrame;

/// Largest value the device's 16-bit millisecond fields accept.
/// Oversized speeds are clamped here, not wrapped.
const MAX_SPEED_MS: u32 = u16::MAX as u32;

const MAX_TEXT_LEN: usize = 512;
const MAX_FONT: u8 = 7;
const MAX_TEXT_ID: u8 = 19;
const MAX_PIC_NUM: u32 = 60;
const GATE_PANELS: usize = 5;

/// Encode a validated command into a wire frame for the given device.
///
/// Fails with [`CoreError::UnsupportedOperation`] when the variant is
/// not valid for the profile's family, and [`CoreError::InvalidField`]
/// when a field violates its declared constraint.
pub fn encode(command: &Command, profile: &DeviceProfile) -> Result<WireFrame, CoreError> {
    if !command.supports(profile.family) {
        return Err(CoreError::UnsupportedOperation {
            operation: command.operation(),
            family: profile.family,
        });
    }

    let payload = match command {
        Command::Text(req) => {
            validate_text(req, profile)?;
            text_payload(req, None)
        }
        Command::ImageUrl { url } => {
            validate_url("url", url)?;
            json!({
                "Command": "Device/PlayTFGif",
                "FileType": 2,
                "FileName": url,
            })
        }
        Command::Animation(frame) => {
            let width = validate_frame(frame, profile)?;
            gif_payload(frame, width, None)
        }
        Command::Brightness { percent } => {
            if *percent > 100 {
                return Err(invalid("brightness", "must be between 0 and 100"));
            }
            json!({
                "Command": "Channel/SetBrightness",
                "Brightness": percent,
            })
        }
        Command::ResetGifId => json!({ "Command": "Draw/ResetHttpGifId" }),
        Command::Raw(value) => {
            validate_raw(value)?;
            value.clone()
        }
        Command::GateText(req) => {
            if usize::from(req.lcd_index) >= GATE_PANELS {
                return Err(invalid("lcd_index", "panel index must be 0-4"));
            }
            validate_text(&req.text, profile)?;
            text_payload(&req.text, Some(req.lcd_index))
        }
        Command::GateGifFrame(req) => {
            validate_lcd_array(&req.lcd_array)?;
            let width = validate_frame(&req.frame, profile)?;
            gif_payload(&req.frame, width, Some(&req.lcd_array))
        }
        Command::GatePlayGif {
            lcd_array,
            file_names,
        } => {
            validate_lcd_array(lcd_array)?;
            if file_names.is_empty() {
                return Err(invalid("file_names", "at least one GIF URL is required"));
            }
            for url in file_names {
                validate_url("file_names", url)?;
            }
            json!({
                "Command": "Device/PlayGif",
                "LcdArray": lcd_array,
                "FileName": file_names,
            })
        }
        Command::GateCommandList { commands } => {
            if commands.is_empty() {
                return Err(invalid("commands", "command list must not be empty"));
            }
            for entry in commands {
                validate_raw(entry)?;
            }
            json!({
                "Command": "Draw/CommandList",
                "CommandList": commands,
            })
        }
    };

    Ok(WireFrame::new(payload))
}

// ── Payload builders ────────────────────────────────────────────────

fn text_payload(req: &TextRequest, lcd_index: Option<u8>) -> Value {
    let mut payload = json!({
        "Command": "Draw/SendHttpText",
        "TextId": req.text_id,
        "x": req.x,
        "y": req.y,
        "dir": req.direction,
        "font": req.font,
        "TextWidth": req.text_width,
        "TextString": req.text,
        "speed": req.speed.min(MAX_SPEED_MS),
        "color": req.color,
        "align": req.align,
    });
    if let Some(index) = lcd_index {
        payload["LcdIndex"] = json!(index);
    }
    payload
}

fn gif_payload(frame: &AnimationFrame, width: u32, lcd_array: Option<&[u8]>) -> Value {
    let mut payload = json!({
        "Command": "Draw/SendHttpGif",
        "PicNum": frame.pic_num,
        "PicWidth": width,
        "PicOffset": frame.pic_offset,
        "PicID": frame.pic_id,
        "PicSpeed": frame.pic_speed.min(MAX_SPEED_MS),
        "PicData": BASE64.encode(&frame.data),
    });
    if let Some(array) = lcd_array {
        payload["LcdArray"] = json!(array);
    }
    payload
}

// ── Field validation ────────────────────────────────────────────────

fn invalid(field: &'static str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn validate_text(req: &TextRequest, profile: &DeviceProfile) -> Result<(), CoreError> {
    if req.text.is_empty() {
        return Err(invalid("text", "must not be empty"));
    }
    if req.text.len() > MAX_TEXT_LEN {
        return Err(invalid(
            "text",
            format!("must be at most {MAX_TEXT_LEN} bytes"),
        ));
    }
    if req.x >= profile.resolution {
        return Err(invalid(
            "x",
            format!("must be within 0..{} for this device", profile.resolution),
        ));
    }
    if req.y >= profile.resolution {
        return Err(invalid(
            "y",
            format!("must be within 0..{} for this device", profile.resolution),
        ));
    }
    validate_color(&req.color)?;
    if req.font > MAX_FONT {
        return Err(invalid("font", "font index must be 0-7"));
    }
    if req.direction > 1 {
        return Err(invalid("direction", "must be 0 (left) or 1 (right)"));
    }
    if !(16..=64).contains(&req.text_width) {
        return Err(invalid("text_width", "must be between 16 and 64"));
    }
    if !(1..=3).contains(&req.align) {
        return Err(invalid("align", "must be 1 (left), 2 (center) or 3 (right)"));
    }
    if req.text_id > MAX_TEXT_ID {
        return Err(invalid("text_id", "must be 0-19"));
    }
    Ok(())
}

fn validate_color(color: &str) -> Result<(), CoreError> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| invalid("color", "must be a #RRGGBB hex string"))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("color", "must be a #RRGGBB hex string"));
    }
    Ok(())
}

fn validate_lcd_array(array: &[u8]) -> Result<(), CoreError> {
    if array.len() != GATE_PANELS {
        return Err(invalid("lcd_array", "must contain exactly 5 entries"));
    }
    if array.iter().any(|v| *v > 1) {
        return Err(invalid("lcd_array", "entries must be 0 or 1"));
    }
    Ok(())
}

fn validate_url(field: &'static str, url: &str) -> Result<(), CoreError> {
    if url.is_empty() {
        return Err(invalid(field, "URL must not be empty"));
    }
    let parsed: url::Url = url
        .parse()
        .map_err(|e| invalid(field, format!("not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(field, "URL must be http or https"));
    }
    Ok(())
}

/// Validate an animation frame against the device, returning the
/// effective frame width (defaulted to the device resolution).
fn validate_frame(frame: &AnimationFrame, profile: &DeviceProfile) -> Result<u32, CoreError> {
    if frame.pic_num == 0 || frame.pic_num > MAX_PIC_NUM {
        return Err(invalid("pic_num", "must be between 1 and 60"));
    }
    if frame.pic_offset >= frame.pic_num {
        return Err(invalid("pic_offset", "must be less than pic_num"));
    }
    if frame.pic_id == 0 {
        return Err(invalid("pic_id", "must be at least 1"));
    }
    if frame.pic_speed == 0 {
        return Err(invalid("pic_speed", "must be at least 1 ms"));
    }

    let width = frame.pic_width.unwrap_or(profile.resolution);
    let supported =
        SINGLE_PANEL_RESOLUTIONS.contains(&width) || width == crate::model::MULTI_PANEL_MIN_RESOLUTION;
    if !supported {
        return Err(invalid("pic_width", "must be one of 16, 32, 64 or 128"));
    }
    if width > profile.resolution {
        return Err(invalid(
            "pic_width",
            format!("exceeds device resolution {}", profile.resolution),
        ));
    }

    let expected = (width * width * 3) as usize;
    if frame.data.len() != expected {
        return Err(invalid(
            "data",
            format!(
                "frame must be {expected} RGB bytes for width {width}, got {}",
                frame.data.len()
            ),
        ));
    }
    Ok(width)
}

fn validate_raw(value: &Value) -> Result<(), CoreError> {
    match value.get("Command").and_then(Value::as_str) {
        Some(op) if !op.is_empty() => Ok(()),
        _ => Err(invalid("command", "payload must carry a 'Command' key")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceFamily;
    use pretty_assertions::assert_eq;

    fn single_panel() -> DeviceProfile {
        DeviceProfile {
            name: "office".into(),
            ip: "10.0.0.5".into(),
            family: DeviceFamily::SinglePanel,
            resolution: 64,
            debug: false,
            retry_budget: 3,
        }
    }

    fn multi_panel() -> DeviceProfile {
        DeviceProfile {
            name: "hallway".into(),
            ip: "10.0.0.9".into(),
            family: DeviceFamily::MultiPanel,
            resolution: 128,
            debug: false,
            retry_budget: 3,
        }
    }

    fn text_request() -> TextRequest {
        TextRequest {
            text: "hello".into(),
            x: 0,
            y: 0,
            color: "#FF8800".into(),
            font: 2,
            direction: 0,
            text_width: 56,
            speed: 10,
            align: 1,
            text_id: 1,
        }
    }

    #[test]
    fn text_encodes_vendor_fields() {
        let frame = encode(&Command::Text(text_request()), &single_panel()).unwrap();
        let value = frame.as_value();

        assert_eq!(frame.command(), Some("Draw/SendHttpText"));
        assert_eq!(value["TextString"], "hello");
        assert_eq!(value["color"], "#FF8800");
        assert_eq!(value["TextWidth"], 56);
        assert!(value.get("LcdIndex").is_none());
    }

    #[test]
    fn gate_text_carries_lcd_index() {
        let cmd = Command::GateText(crate::command::GateTextRequest {
            lcd_index: 3,
            text: text_request(),
        });
        let frame = encode(&cmd, &multi_panel()).unwrap();
        assert_eq!(frame.as_value()["LcdIndex"], 3);
    }

    #[test]
    fn gate_command_on_single_panel_is_unsupported() {
        let cmd = Command::GatePlayGif {
            lcd_array: vec![1, 1, 1, 1, 1],
            file_names: vec!["http://example.com/a.gif".into()],
        };
        let err = encode(&cmd, &single_panel()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedOperation {
                family: DeviceFamily::SinglePanel,
                ..
            }
        ));
    }

    #[test]
    fn single_panel_command_on_gate_is_unsupported() {
        let err = encode(&Command::Text(text_request()), &multi_panel()).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
    }

    #[test]
    fn brightness_is_family_agnostic() {
        let cmd = Command::Brightness { percent: 80 };
        assert!(encode(&cmd, &single_panel()).is_ok());
        assert!(encode(&cmd, &multi_panel()).is_ok());
    }

    #[test]
    fn coordinate_out_of_bounds_is_invalid_field() {
        let mut req = text_request();
        req.x = 64; // resolution is 64, valid range 0..64
        let err = encode(&Command::Text(req), &single_panel()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { field: "x", .. }));
    }

    #[test]
    fn malformed_color_is_invalid_field() {
        for bad in ["FFFFFF", "#FFF", "#GGHHII", ""] {
            let mut req = text_request();
            req.color = bad.into();
            let err = encode(&Command::Text(req), &single_panel()).unwrap_err();
            assert!(matches!(err, CoreError::InvalidField { field: "color", .. }), "{bad}");
        }
    }

    #[test]
    fn oversized_speed_is_clamped_not_wrapped() {
        let mut req = text_request();
        req.speed = 1_000_000;
        let frame = encode(&Command::Text(req), &single_panel()).unwrap();
        assert_eq!(frame.as_value()["speed"], 65_535);
    }

    #[test]
    fn brightness_above_100_is_invalid() {
        let err = encode(&Command::Brightness { percent: 101 }, &single_panel()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { field: "brightness", .. }));
    }

    #[test]
    fn empty_image_url_is_invalid() {
        let err = encode(&Command::ImageUrl { url: String::new() }, &single_panel()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { field: "url", .. }));
    }

    #[test]
    fn animation_frame_embeds_base64_data() {
        let data = vec![0u8; 16 * 16 * 3];
        let cmd = Command::Animation(AnimationFrame {
            pic_num: 2,
            pic_width: Some(16),
            pic_offset: 0,
            pic_id: 1,
            pic_speed: 100,
            data: data.clone(),
        });
        let frame = encode(&cmd, &single_panel()).unwrap();
        let value = frame.as_value();

        assert_eq!(value["PicWidth"], 16);
        assert_eq!(
            value["PicData"].as_str().unwrap(),
            BASE64.encode(&data)
        );
    }

    #[test]
    fn animation_frame_with_wrong_byte_count_is_invalid() {
        let cmd = Command::Animation(AnimationFrame {
            pic_num: 1,
            pic_width: Some(16),
            pic_offset: 0,
            pic_id: 1,
            pic_speed: 100,
            data: vec![0u8; 10],
        });
        let err = encode(&cmd, &single_panel()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { field: "data", .. }));
    }

    #[test]
    fn lcd_array_must_be_five_binary_flags() {
        for bad in [vec![1, 1, 1], vec![1, 1, 2, 0, 1]] {
            let cmd = Command::GatePlayGif {
                lcd_array: bad,
                file_names: vec!["http://example.com/a.gif".into()],
            };
            let err = encode(&cmd, &multi_panel()).unwrap_err();
            assert!(matches!(err, CoreError::InvalidField { field: "lcd_array", .. }));
        }
    }

    #[test]
    fn raw_passthrough_requires_command_key() {
        let err = encode(&Command::Raw(serde_json::json!({"Foo": 1})), &single_panel())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidField { .. }));

        let ok = encode(
            &Command::Raw(serde_json::json!({"Command": "Device/SetHighLightMode", "Mode": 1})),
            &single_panel(),
        );
        assert!(ok.is_ok());
    }
}
