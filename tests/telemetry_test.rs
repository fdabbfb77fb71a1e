//! Telemetry pipeline tests for telemetry-relay.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use telemetry_relay::telemetry::schema::{
    category, event, BuildInfo, HeartbeatEventDetails, MetricsSnapshot, StartupEventDetails,
};
use telemetry_relay::telemetry::{
    self, init_logging, JsonLinesHook, LogConfig, LogError, LogFormat, MockHook, NO_DETAILS,
};
use telemetry_relay::{Logger, Severity, TelemetryConfig, TelemetryState};

fn enabled_config(min: Severity) -> TelemetryConfig {
    TelemetryConfig {
        enable: true,
        min_log_level: min,
        ..Default::default()
    }
}

fn state_with_mock(config: TelemetryConfig) -> (Arc<TelemetryState>, Arc<MockHook>) {
    let mock = Arc::new(MockHook::new(config.min_log_level));
    let hook = mock.clone();
    let state = TelemetryState::create(config, move |_| Ok::<_, std::io::Error>(hook))
        .expect("mock factory never fails");
    (Arc::new(state), mock)
}

// =============================================================================
// Output Setup Tests
// =============================================================================

#[test]
fn init_logging_rejects_invalid_filter() {
    let config = LogConfig {
        format: LogFormat::Pretty,
        level: "telemetry_relay=loud".to_string(),
        output_path: None,
    };
    match init_logging(&config) {
        Err(LogError::InvalidFilter(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected invalid filter, got {other:?}"),
    }
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn hook_factory_error_is_surfaced_verbatim() {
    let result = TelemetryState::create(enabled_config(Severity::Info), |_| {
        Err::<MockHook, _>("boom".to_string())
    });
    match result {
        Ok(_) => panic!("factory error was swallowed"),
        Err(e) => assert_eq!(e.to_string(), "boom"),
    }
}

#[test]
fn factory_sees_the_config() {
    let config = TelemetryConfig {
        name: "relay-7".to_string(),
        ..enabled_config(Severity::Warn)
    };
    let state = TelemetryState::create(config, |cfg| {
        assert_eq!(cfg.name, "relay-7");
        Ok::<_, std::io::Error>(MockHook::new(cfg.min_log_level))
    })
    .unwrap();
    assert_eq!(state.config().name, "relay-7");
    assert!(state.is_enabled());
}

#[test]
fn attach_emits_nothing() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Warn));
    let logger = Logger::new();
    telemetry::attach(&state, &logger);
    state.flush();
    assert_eq!(mock.len(), 0);

    logger.warn("one");
    state.flush();
    assert_eq!(mock.len(), 1);
}

#[test]
fn detach_stops_mirroring() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Info));
    let logger = Logger::new();
    telemetry::attach(&state, &logger);
    logger.info("mirrored");
    telemetry::detach(&logger);
    logger.info("output only");
    state.flush();

    assert_eq!(mock.entries(), vec!["mirrored"]);
    assert!(!logger.telemetry_enabled());
}

#[test]
fn derived_loggers_share_attachment() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Info));
    let logger = Logger::new();
    let child = logger.with_field("peer", "10.0.0.1");
    telemetry::attach(&state, &logger);
    child.info("from child");
    state.flush();

    let envelopes = mock.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].fields["peer"], "10.0.0.1");
}

// =============================================================================
// Event and Metrics Tests
// =============================================================================

#[test]
fn log_event_bypasses_min_level() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Panic));
    state.log_event(category::APPLICATION_STATE, event::STARTUP, NO_DETAILS);
    state.log_event(category::APPLICATION_STATE, event::SHUTDOWN, NO_DETAILS);
    state.flush();

    assert_eq!(
        mock.entries(),
        vec!["/ApplicationState/Startup", "/ApplicationState/Shutdown"]
    );
    let first = &mock.envelopes()[0];
    assert_eq!(first.level, Severity::Info);
    assert_eq!(first.category.as_deref(), Some(category::APPLICATION_STATE));
    assert_eq!(first.identifier.as_deref(), Some(event::STARTUP));
    assert!(first.details.is_none());
}

#[test]
fn log_event_respects_enabled_flag() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Info));
    state.set_enabled(false);
    state.log_event(category::NETWORK, event::CONNECT_PEER, NO_DETAILS);
    state.set_enabled(true);
    state.log_event(category::NETWORK, event::DISCONNECT_PEER, NO_DETAILS);
    state.flush();

    assert_eq!(mock.entries(), vec!["/Network/DisconnectPeer"]);
}

#[test]
fn log_event_details_keep_their_structure() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Warn));
    let details = StartupEventDetails {
        info: BuildInfo {
            version: "1.2.3".into(),
            ..Default::default()
        },
        instance: "relay-a".into(),
        command_line_args: vec!["--data-dir".into(), "/var/lib/relay".into()],
    };
    state.log_event(category::APPLICATION_STATE, event::STARTUP, Some(&details));
    state.flush();

    let envelope = &mock.envelopes()[0];
    assert_eq!(
        envelope.details.as_ref().unwrap(),
        &serde_json::to_value(&details).unwrap()
    );
}

#[test]
fn log_metrics_forwards_identifier() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Error));
    let snapshot = MetricsSnapshot::new("Ledger").with("round", 42.0);
    state.log_metrics(category::HOST_APPLICATION_STATE, Some(&snapshot), NO_DETAILS);
    state.flush();

    let envelopes = mock.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].message, "/HostApplicationState/Ledger");
    assert_eq!(envelopes[0].identifier.as_deref(), Some("Ledger"));
    assert_eq!(envelopes[0].metrics.as_ref().unwrap()["m"]["round"], 42.0);
}

#[test]
fn log_metrics_without_metrics_forwards_nothing() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Debug));
    state.log_metrics(category::HOST_APPLICATION_STATE, None::<&MetricsSnapshot>, NO_DETAILS);
    state.flush();
    assert_eq!(mock.len(), 0);
}

fn heartbeat_details() -> HeartbeatEventDetails {
    HeartbeatEventDetails {
        info: BuildInfo {
            version: "v2".into(),
            version_num: "1234".into(),
            channel: "alpha".into(),
            ..Default::default()
        },
        metrics: BTreeMap::from([("Hello".to_string(), 38.8)]),
    }
}

#[test]
fn heartbeat_serializes_flattened_build_info() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Warn));
    state.log_event(category::APPLICATION_STATE, event::HEARTBEAT, Some(&heartbeat_details()));
    state.log_event(category::APPLICATION_STATE, event::HEARTBEAT, Some(&heartbeat_details()));
    state.flush();

    let envelopes = mock.envelopes();
    assert_eq!(envelopes.len(), 2);
    let rendered: Vec<serde_json::Value> = envelopes
        .iter()
        .map(|e| serde_json::from_str(&e.to_json().unwrap()).unwrap())
        .collect();

    let details = &rendered[0]["details"];
    assert_eq!(details["version"], "v2");
    assert_eq!(details["version-num"], "1234");
    assert_eq!(details["channel"], "alpha");
    assert_eq!(details["branch"], "");
    assert_eq!(details["commit-hash"], "");
    let hello = details["m"]["Hello"].as_f64().unwrap();
    assert!((hello - 38.8).abs() < 0.01);

    // Repeated renders of the same payload are identical.
    assert_eq!(rendered[0]["details"], rendered[1]["details"]);
}

// =============================================================================
// Delivery Tests
// =============================================================================

#[test]
fn json_lines_hook_writes_one_line_per_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("envelopes.jsonl");
    {
        let state = TelemetryState::create(enabled_config(Severity::Warn), |_| {
            JsonLinesHook::append_to(&path)
        })
        .unwrap();
        state.log_event(category::APPLICATION_STATE, event::STARTUP, NO_DETAILS);
        state.log_event(category::APPLICATION_STATE, event::HEARTBEAT, NO_DETAILS);
        state.flush();
    }

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["message"], "/ApplicationState/Startup");
    assert_eq!(first["level"], "info");
}

#[test]
fn concurrent_loggers_preserve_every_envelope() {
    let (state, mock) = state_with_mock(enabled_config(Severity::Info));
    let logger = Logger::new();
    telemetry::attach(&state, &logger);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.with_field("thread", t);
            std::thread::spawn(move || {
                for i in 0..25 {
                    logger.info(format!("t{t} m{i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    state.flush();

    assert_eq!(mock.len(), 100);
    assert_eq!(state.hook_stats().delivered, 100);
    assert_eq!(state.hook_stats().dropped, 0);
}

#[test]
fn flush_during_concurrent_logging_keeps_per_logger_order() {
    let (state, mock) = state_with_mock(TelemetryConfig {
        queue_depth: 1024,
        ..enabled_config(Severity::Info)
    });
    let logger = Logger::new();
    telemetry::attach(&state, &logger);
    let done = Arc::new(AtomicBool::new(false));

    let flusher = {
        let state = state.clone();
        let done = done.clone();
        std::thread::spawn(move || {
            let mut flushes = 0u32;
            loop {
                state.flush();
                flushes += 1;
                if done.load(Ordering::Acquire) {
                    break flushes;
                }
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    logger.info(format!("t{t} m{i}"));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    assert!(flusher.join().unwrap() > 0);
    state.flush();

    let entries = mock.entries();
    assert_eq!(entries.len(), 200);
    for t in 0..4 {
        let prefix = format!("t{t} ");
        let order: Vec<u32> = entries
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix))
            .map(|rest| rest.trim_start_matches('m').parse().unwrap())
            .collect();
        assert_eq!(order, (0..50).collect::<Vec<u32>>(), "thread {t} out of order");
    }
}

#[test]
fn send_to_log_does_not_duplicate_envelopes() {
    let (state, mock) = state_with_mock(TelemetryConfig {
        send_to_log: true,
        ..enabled_config(Severity::Info)
    });
    let logger = Logger::new();
    telemetry::attach(&state, &logger);
    logger.log_event(category::APPLICATION_STATE, event::STARTUP, NO_DETAILS);
    state.flush();

    assert_eq!(mock.entries(), vec!["/ApplicationState/Startup"]);
}
