// End-to-end tests for registration + dispatch: fake discovery source,
// wiremock standing in for the device's LAN endpoint.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pixgate_api::{DiscoveryRecord, TransportConfig};
use pixgate_core::classifier::DiscoverySource;
use pixgate_core::{
    Command, CoreError, DeviceEntry, DeviceFamily, DeviceRegistry, FamilyHint, Gateway, TargetRef,
};

struct FakeSource(Vec<DiscoveryRecord>);

impl DiscoverySource for FakeSource {
    async fn fetch(&self) -> Result<Vec<DiscoveryRecord>, pixgate_api::Error> {
        Ok(self.0.clone())
    }
}

fn fast_transport() -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_secs(2),
        retry_backoff: Duration::from_millis(5),
    }
}

/// Host (with port) of a mock server, as a manual device address.
fn mock_host(server: &MockServer) -> String {
    server
        .uri()
        .strip_prefix("http://")
        .expect("mock server uri")
        .to_owned()
}

fn office_entry(host: &str) -> DeviceEntry {
    DeviceEntry {
        name: Some("office".into()),
        host: Some(host.into()),
        family: FamilyHint::Pixoo,
        resolution: 64,
        ..DeviceEntry::default()
    }
}

fn hallway_entry() -> DeviceEntry {
    DeviceEntry {
        name: Some("hallway".into()),
        auto_discover: true,
        family: FamilyHint::Auto,
        resolution: 64,
        retry_budget: 1,
        ..DeviceEntry::default()
    }
}

fn hallway_discovery() -> FakeSource {
    FakeSource(vec![DiscoveryRecord {
        device_name: "Hallway TimeGate".into(),
        private_ip: "10.0.0.9".into(),
    }])
}

#[tokio::test]
async fn two_device_scenario_resolves_and_classifies() {
    let entries = [office_entry("10.0.0.5"), hallway_entry()];
    let registry = DeviceRegistry::register(&entries, &hallway_discovery(), &fast_transport())
        .await
        .unwrap();

    let hallway = registry.resolve_target(Some("hallway"), None).unwrap();
    assert_eq!(hallway.profile.ip, "10.0.0.9");
    assert_eq!(hallway.profile.family, DeviceFamily::MultiPanel);
    assert_eq!(hallway.profile.resolution, 128);

    // No target reference: the first configured device wins.
    let default = registry.resolve_target(None, None).unwrap();
    assert_eq!(default.profile.name, "office");
    assert_eq!(default.profile.family, DeviceFamily::SinglePanel);
    assert_eq!(default.profile.resolution, 64);
}

#[tokio::test]
async fn dispatch_sends_frame_and_normalizes_ack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .and(body_partial_json(json!({
            "Command": "Channel/SetBrightness",
            "Brightness": 42,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error_code": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let entries = [office_entry(&mock_host(&server))];
    let registry = DeviceRegistry::register(&entries, &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);

    let outcome = gateway
        .dispatch(&TargetRef::default_device(), &Command::Brightness { percent: 42 })
        .await
        .unwrap();

    assert!(outcome.ok);
    assert_eq!(outcome.message, "OK");
}

#[tokio::test]
async fn device_rejection_is_a_failed_outcome_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 5,
            "error_message": "no active animation layer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = office_entry(&mock_host(&server));
    entry.family = FamilyHint::TimeGate;
    let registry = DeviceRegistry::register(&[entry], &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);

    let cmd = Command::GatePlayGif {
        lcd_array: vec![1, 1, 1, 1, 1],
        file_names: vec!["http://example.com/a.gif".into()],
    };
    let outcome = gateway.dispatch(&TargetRef::default_device(), &cmd).await.unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.message, "no active animation layer");
}

#[tokio::test]
async fn family_mismatch_fails_without_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error_code": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let entries = [office_entry(&mock_host(&server))];
    let registry = DeviceRegistry::register(&entries, &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);

    let cmd = Command::GatePlayGif {
        lcd_array: vec![1, 1, 1, 1, 1],
        file_names: vec!["http://example.com/a.gif".into()],
    };
    let err = gateway.dispatch(&TargetRef::default_device(), &cmd).await.unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn invalid_coordinate_fails_without_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error_code": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let entries = [office_entry(&mock_host(&server))];
    let registry = DeviceRegistry::register(&entries, &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);

    let cmd = Command::Text(pixgate_core::command::TextRequest {
        text: "hi".into(),
        x: 64,
        y: 0,
        color: "#FFFFFF".into(),
        font: 0,
        direction: 0,
        text_width: 56,
        speed: 10,
        align: 1,
        text_id: 1,
    });
    let err = gateway.dispatch(&TargetRef::default_device(), &cmd).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidField { field: "x", .. }));
}

#[tokio::test]
async fn unreachable_device_surfaces_attempt_count() {
    // Bind a port, then free it: connection refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let mut entry = office_entry(&host);
    entry.retry_budget = 2;
    let registry = DeviceRegistry::register(&[entry], &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);

    let err = gateway
        .dispatch(&TargetRef::default_device(), &Command::ResetGifId)
        .await
        .unwrap_err();

    match err {
        CoreError::DeviceUnreachable { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected DeviceUnreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn reload_swaps_the_registry_atomically() {
    let entries = [office_entry("10.0.0.5")];
    let registry = DeviceRegistry::register(&entries, &FakeSource(vec![]), &fast_transport())
        .await
        .unwrap();
    let gateway = Gateway::new(registry);
    assert_eq!(gateway.registry().names(), vec!["office"]);

    // Bind a port, then free it, so the hallway address refuses
    // connections instead of depending on a fixed IP being absent.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let hallway_host = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let entries = [office_entry("10.0.0.5"), hallway_entry()];
    let discovery = FakeSource(vec![DiscoveryRecord {
        device_name: "Hallway TimeGate".into(),
        private_ip: hallway_host,
    }]);
    let reloaded = DeviceRegistry::register(&entries, &discovery, &fast_transport())
        .await
        .unwrap();
    gateway.reload(reloaded);

    assert_eq!(gateway.registry().names(), vec!["office", "hallway"]);
    let outcome = gateway
        .dispatch(&TargetRef::by_name("hallway"), &Command::ResetGifId)
        .await;
    // Nothing listens on the hallway address; the point is the new
    // registry resolves the target at all.
    assert!(matches!(
        outcome.unwrap_err(),
        CoreError::DeviceUnreachable { .. }
    ));
}
