// HTTP surface: thin plumbing over `pixgate_core::Gateway`.
//
// Handlers translate route payloads into `Command` variants one-to-one
// and map the core error taxonomy onto HTTP statuses. No command logic
// lives here.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use pixgate_core::command::{AnimationFrame, GateGifFrame, GateTextRequest, TextRequest};
use pixgate_core::{Command, CoreError, Gateway, StatusClass, TargetRef};

/// Uniform response body for every dispatch route.
#[derive(Debug, Serialize)]
struct CommandResponse {
    ok: bool,
    message: String,
}

/// Device selection, via query params or `X-Pixgate-*` headers.
#[derive(Debug, Default, Deserialize)]
struct TargetQuery {
    /// Logical device name (defaults to the first configured device).
    device: Option<String>,
    /// Device host/IP to target (overrides `device`).
    host: Option<String>,
}

struct ApiError(CoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.status_class() {
            StatusClass::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            StatusClass::NotFound => StatusCode::NOT_FOUND,
            StatusClass::Unreachable => StatusCode::BAD_GATEWAY,
            StatusClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = CommandResponse {
            ok: false,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

type DispatchResult = Result<Json<CommandResponse>, ApiError>;

fn target_from(query: TargetQuery, headers: &HeaderMap) -> TargetRef {
    let header = |key: &str| {
        headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    TargetRef {
        name: query.device.or_else(|| header("x-pixgate-device")),
        ip: query.host.or_else(|| header("x-pixgate-host")),
    }
}

async fn dispatch(
    gateway: &Gateway,
    query: TargetQuery,
    headers: &HeaderMap,
    command: Command,
) -> DispatchResult {
    let target = target_from(query, headers);
    let outcome = gateway.dispatch(&target, &command).await?;
    Ok(Json(CommandResponse {
        ok: outcome.ok,
        message: outcome.message,
    }))
}

// ── Info routes ─────────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "name": "pixgate",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn list_devices(State(gateway): State<Arc<Gateway>>) -> Json<Value> {
    let registry = gateway.registry();
    let devices: Vec<_> = registry.profiles().cloned().collect();
    Json(serde_json::json!({ "devices": devices }))
}

// ── Dispatch routes ─────────────────────────────────────────────────

macro_rules! command_route {
    ($name:ident, $body:ty, $build:expr) => {
        async fn $name(
            State(gateway): State<Arc<Gateway>>,
            Query(query): Query<TargetQuery>,
            headers: HeaderMap,
            Json(body): Json<$body>,
        ) -> DispatchResult {
            #[allow(clippy::redundant_closure_call)]
            let command = ($build)(body);
            dispatch(&gateway, query, &headers, command).await
        }
    };
}

#[derive(Debug, Deserialize)]
struct BrightnessBody {
    brightness: u32,
}

#[derive(Debug, Deserialize)]
struct ImageUrlBody {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PlayGifBody {
    #[serde(default = "default_lcd_array")]
    lcd_array: Vec<u8>,
    file_name: Vec<String>,
}

fn default_lcd_array() -> Vec<u8> {
    vec![1, 1, 1, 1, 1]
}

#[derive(Debug, Deserialize)]
struct CommandListBody {
    command_list: Vec<Value>,
}

command_route!(send_text, TextRequest, Command::Text);
command_route!(send_animation, AnimationFrame, Command::Animation);
command_route!(set_brightness, BrightnessBody, |b: BrightnessBody| {
    Command::Brightness { percent: b.brightness }
});
command_route!(show_image_url, ImageUrlBody, |b: ImageUrlBody| {
    Command::ImageUrl { url: b.url }
});
command_route!(raw_command, Value, Command::Raw);
command_route!(gate_send_text, GateTextRequest, Command::GateText);
command_route!(gate_send_gif, GateGifFrame, Command::GateGifFrame);
command_route!(gate_play_gif, PlayGifBody, |b: PlayGifBody| {
    Command::GatePlayGif {
        lcd_array: b.lcd_array,
        file_names: b.file_name,
    }
});
command_route!(gate_command_list, CommandListBody, |b: CommandListBody| {
    Command::GateCommandList { commands: b.command_list }
});

async fn reset_gif_id(
    State(gateway): State<Arc<Gateway>>,
    Query(query): Query<TargetQuery>,
    headers: HeaderMap,
) -> DispatchResult {
    dispatch(&gateway, query, &headers, Command::ResetGifId).await
}

// ── Router / entry ──────────────────────────────────────────────────

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/devices", get(list_devices))
        .route("/text", post(send_text))
        .route("/brightness", post(set_brightness))
        .route("/image-url", post(show_image_url))
        .route("/animation-frame", post(send_animation))
        .route("/reset-gif-id", post(reset_gif_id))
        .route("/command", post(raw_command))
        .route("/timegate/send-text", post(gate_send_text))
        .route("/timegate/send-gif", post(gate_send_gif))
        .route("/timegate/play-gif", post(gate_play_gif))
        .route("/timegate/command-list", post(gate_command_list))
        .with_state(gateway)
}

pub async fn serve(gateway: Gateway, listen: &str) -> Result<(), std::io::Error> {
    let app = router(Arc::new(gateway));
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    // Best effort; if the signal handler cannot install, run until killed.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn query_params_take_precedence_over_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-pixgate-device", HeaderValue::from_static("attic"));
        headers.insert("x-pixgate-host", HeaderValue::from_static("10.0.0.8"));

        let query = TargetQuery {
            device: Some("office".into()),
            host: None,
        };
        let target = target_from(query, &headers);

        assert_eq!(target.name.as_deref(), Some("office"));
        assert_eq!(target.ip.as_deref(), Some("10.0.0.8"));
    }

    #[test]
    fn missing_target_means_default_device() {
        let target = target_from(TargetQuery::default(), &HeaderMap::new());
        assert_eq!(target, TargetRef::default_device());
    }

    #[test]
    fn error_classes_map_to_distinct_statuses() {
        let invalid = ApiError(CoreError::InvalidField {
            field: "x",
            reason: "out of range".into(),
        });
        let not_found = ApiError(CoreError::DeviceNotFound {
            identifier: "garage".into(),
            available: "office".into(),
        });
        let unreachable = ApiError(CoreError::DeviceUnreachable {
            attempts: 3,
            last_error: "connection refused".into(),
        });

        assert_eq!(
            invalid.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(unreachable.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
