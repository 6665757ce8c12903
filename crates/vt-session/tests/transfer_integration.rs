//! Remote file transfer through a connected session

mod common;

use common::{manager, FakeRemote, FixedPrompt, CONF, CONTROL_CONF};
use vt_core::types::{RemoteFileKind, Side};
use vt_core::SessionError;
use vt_session::{FileLocation, SessionManager, SizeCheck};

const SIDE_A: &str = "192.168.1.6";

async fn connected(remote: &FakeRemote) -> SessionManager<common::FakeConnector> {
    let mut session = manager(remote, FixedPrompt::never());
    session
        .connect_to_vehicle("car", "ifly@jump.example", 22, None)
        .await
        .unwrap();
    session
        .connect_to_side_tunnel(Side::A, SIDE_A, None, 22)
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_write_then_read_round_trips() {
    let remote = FakeRemote::default();
    remote.state().banner =
        Some("Authorized users only. All activities may be monitored and recorded.\n".to_string());
    let session = connected(&remote).await;

    let content = r#"{
  "planner": {"max_speed": 22.5, "label": "it's \"fast\""},
  "lanes": [1, 2, 3]
}"#;
    let expected: serde_json::Value = serde_json::from_str(content).unwrap();

    for _ in 0..2 {
        let report = session
            .write_file(RemoteFileKind::Params, content)
            .await
            .unwrap();
        assert_eq!(report.path, format!("{}/params.json", CONF));
        assert_eq!(report.size_check, SizeCheck::Match);

        let read_back = session.read_file(RemoteFileKind::Params).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&read_back).unwrap();
        assert_eq!(value, expected);
    }

    // Staging files are moved away, only the target remains
    let files: Vec<String> = remote.state().files.keys().cloned().collect();
    assert_eq!(files, vec![format!("{}/params.json", CONF)]);
}

#[tokio::test]
async fn test_invalid_json_never_reaches_mount() {
    let remote = FakeRemote::default();
    let session = connected(&remote).await;

    let err = session
        .write_file(RemoteFileKind::Adas, "{\"a\": 1,}")
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::InvalidFormat(_)));
    let side_commands = remote.commands_on(SIDE_A);
    assert!(side_commands.is_empty(), "unexpected: {:?}", side_commands);
}

#[tokio::test]
async fn test_write_goes_to_existing_fallback_file() {
    let remote = FakeRemote::default();
    let fallback = format!("{}/adas_params.json", CONTROL_CONF);
    remote.put_file(&fallback, "{\"old\": true}");
    let session = connected(&remote).await;

    let status = session.check_file(RemoteFileKind::Adas).await.unwrap();
    assert_eq!(status.location, FileLocation::Fallback);
    assert_eq!(status.path, fallback);

    session
        .write_file(RemoteFileKind::Adas, "{\"old\": false}")
        .await
        .unwrap();
    assert_eq!(remote.file(&fallback).as_deref(), Some("{\"old\": false}"));
    assert!(remote
        .file(&format!("{}/adas_params.json", CONF))
        .is_none());
}

#[tokio::test]
async fn test_write_creates_primary_when_nothing_exists() {
    let remote = FakeRemote::default();
    let session = connected(&remote).await;

    let status = session.check_file(RemoteFileKind::Params).await.unwrap();
    assert!(!status.exists());

    let report = session
        .write_file(RemoteFileKind::Params, "{}")
        .await
        .unwrap();
    assert_eq!(report.path, format!("{}/params.json", CONF));
    assert!(remote.file(&report.path).is_some());
}

#[tokio::test]
async fn test_mount_failure_aborts_write_but_not_read() {
    let remote = FakeRemote::default();
    let path = format!("{}/params.json", CONF);
    remote.put_file(&path, "{\"v\": 1}");
    remote.state().mount_fails = true;
    let session = connected(&remote).await;

    assert!(session.mount_filesystem().await.is_err());

    let err = session
        .write_file(RemoteFileKind::Params, "{\"v\": 2}")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::RemoteCommandFailed { .. }));
    assert_eq!(remote.file(&path).as_deref(), Some("{\"v\": 1}"));

    let content = session.read_file(RemoteFileKind::Params).await.unwrap();
    assert_eq!(content, "{\"v\": 1}");
}

#[tokio::test]
async fn test_file_operations_need_a_side() {
    let remote = FakeRemote::default();
    let session = manager(&remote, FixedPrompt::never());

    assert!(matches!(
        session.read_file(RemoteFileKind::Params).await,
        Err(SessionError::NotConnected(_))
    ));
    assert!(matches!(
        session.write_file(RemoteFileKind::Params, "{}").await,
        Err(SessionError::NotConnected(_))
    ));
    assert!(matches!(
        session.check_file(RemoteFileKind::Params).await,
        Err(SessionError::NotConnected(_))
    ));
}

#[tokio::test]
async fn test_params_follow_session_working_directory() {
    let remote = FakeRemote::default();
    let mut session = manager(&remote, FixedPrompt::never());
    session.prepare_direct_vehicle("bench", Some("/data/conf")).await;
    session
        .connect_to_side_direct(Side::B, "192.168.1.70", None, None, 22)
        .await
        .unwrap();

    let report = session
        .write_file(RemoteFileKind::Params, "[1]")
        .await
        .unwrap();
    assert_eq!(report.path, "/data/conf/params.json");

    // The ADAS file does not move with the working directory
    let status = session.check_file(RemoteFileKind::Adas).await.unwrap();
    assert_eq!(status.path, format!("{}/adas_params.json", CONF));
}
