//! Integration tests driving the daemon through a local message bus.

use std::{collections::HashSet, fs};

use enclosure_common::Message;
use serde_json::{Value, json};

use crate::common::{FakeBus, RecordingRunner, install_dir, spawn_daemon, test_config};

#[tokio::test]
async fn intents_registered_on_connect() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let daemon = spawn_daemon(config, RecordingRunner::default());

    let mut client = bus.accept(5).await;
    let mut names = HashSet::new();
    for _ in 0..4 {
        let msg = client.recv_type("padatious:register_intent", 5).await;
        names.insert(msg.data_str("name").unwrap().to_owned());
        assert!(
            msg.data_str("file_name").unwrap().ends_with(".intent"),
            "registration without intent file: {msg:?}"
        );
    }
    assert_eq!(
        names,
        HashSet::from(
            [
                "mycroftos-enclosure-skill:EnableSSH.intent",
                "mycroftos-enclosure-skill:DisableSSH.intent",
                "mycroftos-enclosure-skill:EnableAirPlay.intent",
                "mycroftos-enclosure-skill:DisableAirPlay.intent",
            ]
            .map(str::to_owned)
        )
    );

    daemon.stop().await;
}

#[tokio::test]
async fn wakeword_paints_listening_visual() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let listen = format!("fbv {}", install_dir(&config).join("ui/listen.png").display());
    let idle = format!("fbv {}", install_dir(&config).join("ui/background.png").display());
    let runner = RecordingRunner::default();
    let daemon = spawn_daemon(config, runner.clone());

    let mut client = bus.accept(5).await;
    client
        .send(&Message::new("recognizer_loop:wakeword", json!({ "utterance": "hey mycroft" })))
        .await;
    runner.wait_for(&listen, 5).await;
    client
        .send(&Message::new("recognizer_loop:record_end", Value::Null))
        .await;
    runner.wait_for(&idle, 5).await;

    daemon.stop().await;
}

#[tokio::test]
async fn ready_greets_over_the_bus() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let daemon = spawn_daemon(config, RecordingRunner::default());

    let mut client = bus.accept(5).await;
    client.send(&Message::new("mycroft.ready", json!({}))).await;
    let speak = client.recv_type("speak", 5).await;
    assert_eq!(
        speak.data.get("meta").and_then(|meta| meta.get("dialog")),
        Some(&json!("finished.booting"))
    );
    assert!(speak.data_str("utterance").is_some_and(|u| !u.is_empty()), "empty greeting");

    daemon.stop().await;
}

#[tokio::test]
async fn intent_enables_airplay() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let settings = install_dir(&config).join("settings.json");
    let runner = RecordingRunner::default();
    let daemon = spawn_daemon(config, runner.clone());

    let mut client = bus.accept(5).await;
    client
        .send(&Message::new(
            "mycroftos-enclosure-skill:EnableAirPlay.intent",
            json!({ "utterance": "enable airplay" }),
        ))
        .await;

    let start = client.recv_type("mycroft.skill.handler.start", 5).await;
    assert_eq!(start.data_str("handler"), Some("MycroftOS.on_enable_airplay"));
    let speak = client.recv_type("speak", 5).await;
    assert_eq!(
        speak.data.get("meta").and_then(|meta| meta.get("dialog")),
        Some(&json!("EnabledAirPlay"))
    );
    client.recv_type("mycroft.skill.handler.complete", 5).await;

    assert_eq!(
        runner.commands(),
        [
            "sudo systemctl enable shairport-sync",
            "sudo systemctl start shairport-sync"
        ]
    );
    let stored: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
    assert_eq!(stored["airplay"], json!(true));

    daemon.stop().await;
}

#[tokio::test]
async fn settings_file_edit_is_applied() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let settings = install_dir(&config).join("settings.json");
    fs::write(&settings, r#"{"airplay": false}"#).unwrap();
    let runner = RecordingRunner::default();
    let daemon = spawn_daemon(config, runner.clone());

    let mut client = bus.accept(5).await;
    client.recv_type("padatious:register_intent", 5).await;
    fs::write(&settings, r#"{"airplay": true, "volume": 11}"#).unwrap();
    runner.wait_for("sudo systemctl start shairport-sync", 5).await;

    let stored: Value = serde_json::from_str(&fs::read_to_string(&settings).unwrap()).unwrap();
    assert_eq!(stored["volume"], json!(11), "unknown keys must survive");

    daemon.stop().await;
}

#[tokio::test]
async fn reconnects_after_bus_drops() {
    let bus = FakeBus::bind().await;
    let config = test_config(&bus.url());
    let runner = RecordingRunner::default();
    let daemon = spawn_daemon(config.clone(), runner.clone());

    let mut first = bus.accept(5).await;
    first.recv_type("padatious:register_intent", 5).await;
    first.close().await;

    let mut second = bus.accept(5).await;
    second.recv_type("padatious:register_intent", 5).await;
    second
        .send(&Message::new("mycroft.speech.recognition.unknown", json!({})))
        .await;
    let idle = format!("fbv {}", install_dir(&config).join("ui/background.png").display());
    runner.wait_for(&idle, 5).await;

    daemon.stop().await;
}

#[tokio::test]
async fn stops_while_bus_is_unreachable() {
    let bus = FakeBus::bind().await;
    let url = bus.url();
    drop(bus);
    let daemon = spawn_daemon(test_config(&url), RecordingRunner::default());
    daemon.stop().await;
}
