// scheduler/tests.rs
use crate::blackboard::Blackboard;
use crate::config::TelemetryConfig;
use crate::radio_types::{GroundCommand, PacketLine, RadioPacket};
use crate::scheduler::{PacketScheduler, SchedulerState, build_packets};
use crate::schema::PacketSchema;
use crate::sensors::SensorFrameParser;
use crate::shutdown::ShutdownToken;
use crate::transport::Transport;
use crate::types::Sample;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records payloads; optionally rejects some.
#[derive(Default)]
struct RecordingLink {
    sent: Vec<String>,
    reject: Vec<usize>,
    inbound: VecDeque<Vec<u8>>,
}

impl Transport for RecordingLink {
    fn send(&mut self, payload: &[u8]) -> bool {
        let attempt = self.sent.len();
        self.sent.push(String::from_utf8_lossy(payload).to_string());
        !self.reject.contains(&attempt)
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }
}

fn fast_config() -> TelemetryConfig {
    TelemetryConfig {
        send_interval: Duration::from_millis(20),
        inter_packet_delay: Duration::ZERO,
        radio_poll_interval: Duration::from_millis(1),
        ..TelemetryConfig::default()
    }
}

fn lines(packets: &[RadioPacket]) -> Vec<String> {
    packets.iter().map(RadioPacket::to_line).collect()
}

fn publish(board: &Blackboard, parser: &mut SensorFrameParser, line: &str) {
    let (snapshot, _) = parser.ingest(line);
    board.sensors.update(snapshot);
}

#[test]
fn test_gps_fallback_scenario() {
    let mut parser = SensorFrameParser::new();
    parser
        .parse("0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 45.0, -93.0, 152.0, 0.0, 7")
        .unwrap();
    let (snapshot, outcome) = parser.ingest("25.0, 101.3, 150.2, 0.1, 0.2, 9.8, 0.01, 0.02, 0.03");
    outcome.unwrap();
    assert_eq!(snapshot.reading.len(), 9);

    let out = lines(&build_packets(&PacketSchema::rocket(), &snapshot));
    assert!(out.contains(&"04,45.0,-93.0,152.0".to_string()));
    assert!(out.contains(&"05,0.0,7".to_string()));
    assert_eq!(
        out,
        [
            "01,25.0,101.3,150.2,0.1",
            "02,0.2,9.8,0.01",
            "03,0.02,0.03",
            "04,45.0,-93.0,152.0",
            "05,0.0,7",
        ]
    );
}

#[test]
fn test_full_reading_ignores_cache() {
    let mut parser = SensorFrameParser::new();
    parser
        .parse("0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 45.0, -93.0, 152.0, 0.0, 7")
        .unwrap();
    let (snapshot, _) =
        parser.ingest("1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 46.0, -94.0, 153.0, 1.0, 8");
    let out = lines(&build_packets(&PacketSchema::rocket(), &snapshot));
    assert_eq!(out[3], "04,46.0,-94.0,153.0");
    assert_eq!(out[4], "05,1.0,8");
}

#[test]
fn test_no_reading_and_no_cache_sends_nothing() {
    let board = Arc::new(Blackboard::new());
    let mut scheduler = PacketScheduler::new(&fast_config(), board);
    let mut link = RecordingLink::default();
    assert_eq!(scheduler.tick(&mut link), 0);
    assert!(link.sent.is_empty());
}

#[test]
fn test_failed_send_is_skipped_not_retried() {
    let board = Arc::new(Blackboard::new());
    let mut parser = SensorFrameParser::new();
    publish(&board, &mut parser, "1, 2, 3, 4, 5, 6, 7");

    let mut scheduler = PacketScheduler::new(&fast_config(), Arc::clone(&board));
    let mut link = RecordingLink {
        reject: vec![0],
        ..RecordingLink::default()
    };
    assert_eq!(scheduler.tick(&mut link), 1);
    assert_eq!(link.sent, ["01,1,2,3,4", "02,5,6,7"]);
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    let health = board.health.capture();
    assert_eq!(health.packets_sent, 1);
    assert_eq!(health.send_failures, 1);
}

#[test]
fn test_round_trip_tokens_match() {
    let mut parser = SensorFrameParser::new();
    let (snapshot, _) =
        parser.ingest("1023, 25.50, 101.3, 150.2, -0.1, 0.2, 9.81, 1e-3, 0.02, 0.03, 45.0");
    for packet in build_packets(&PacketSchema::rocket(), &snapshot) {
        let line = packet.to_line();
        let split = PacketLine::split(&line).unwrap();
        assert_eq!(split.number, packet.number);
        let tokens: Vec<&str> = packet.values.iter().map(Sample::as_str).collect();
        assert_eq!(split.values, tokens);
    }
}

#[test]
fn test_stale_after_configured_ticks() {
    let board = Arc::new(Blackboard::new());
    let mut parser = SensorFrameParser::new();
    publish(&board, &mut parser, "1, 2");

    let mut scheduler = PacketScheduler::new(&fast_config(), Arc::clone(&board));
    let mut link = RecordingLink::default();
    scheduler.tick(&mut link);
    assert!(!scheduler.is_stale());
    for _ in 0..3 {
        scheduler.tick(&mut link);
    }
    assert!(scheduler.is_stale());

    publish(&board, &mut parser, "3, 4");
    scheduler.tick(&mut link);
    assert!(!scheduler.is_stale());
    assert_eq!(link.sent.last().map(String::as_str), Some("01,3,4"));
}

#[test]
fn test_not_stale_before_first_frame() {
    let board = Arc::new(Blackboard::new());
    let mut scheduler = PacketScheduler::new(&fast_config(), Arc::clone(&board));
    let mut link = RecordingLink::default();
    for _ in 0..5 {
        scheduler.tick(&mut link);
    }
    assert!(!scheduler.is_stale());
    assert!(link.sent.is_empty());

    let mut parser = SensorFrameParser::new();
    publish(&board, &mut parser, "1, 2");
    scheduler.tick(&mut link);
    assert!(!scheduler.is_stale());
}

#[test]
fn test_poll_commands() {
    let board = Arc::new(Blackboard::new());
    let mut scheduler = PacketScheduler::new(&fast_config(), board);
    let mut link = RecordingLink::default();
    link.inbound.push_back(b"TEST".to_vec());
    link.inbound.push_back(b"LAUNCH".to_vec());
    assert_eq!(
        scheduler.poll_commands(&mut link),
        [
            GroundCommand::Test,
            GroundCommand::Unknown("LAUNCH".to_string())
        ]
    );
}

#[test]
fn test_run_emits_until_shutdown() {
    let board = Arc::new(Blackboard::new());
    let mut parser = SensorFrameParser::new();
    publish(&board, &mut parser, "1, 2");

    let shutdown = ShutdownToken::new();
    let stopper = {
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(120));
            shutdown.trigger();
        })
    };

    let mut scheduler = PacketScheduler::new(&fast_config(), board);
    let mut link = RecordingLink::default();
    scheduler.run(&mut link, &shutdown);
    stopper.join().unwrap();

    assert!(!link.sent.is_empty());
    assert!(link.sent.iter().all(|l| l == "01,1,2"));
}
