//! Vehicle-side emission: snapshot, partition, transmit, once per interval.

use crate::blackboard::Blackboard;
use crate::config::TelemetryConfig;
use crate::radio_types::{GroundCommand, RadioPacket};
use crate::schema::PacketSchema;
use crate::shutdown::ShutdownToken;
use crate::transport::Transport;
use crate::types::SensorSnapshot;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Listening for ground commands until the next tick is due.
    Idle,
    /// Partitioning a snapshot of the latest reading.
    Build,
    /// Handing packets to the radio.
    Send,
}

/// Splits `snapshot` into radio packets, substituting cached GPS fields when
/// the reading has none.
pub fn build_packets(schema: &PacketSchema, snapshot: &SensorSnapshot) -> Vec<RadioPacket> {
    schema.partition(&snapshot.slots())
}

pub struct PacketScheduler {
    schema: PacketSchema,
    board: Arc<Blackboard>,
    state: SchedulerState,
    send_interval: Duration,
    inter_packet_delay: Duration,
    poll_interval: Duration,
    stale_after_ticks: u32,
    last_sequence: u64,
    stale_ticks: u32,
}

impl PacketScheduler {
    pub fn new(config: &TelemetryConfig, board: Arc<Blackboard>) -> Self {
        Self {
            schema: config.schema.clone(),
            board,
            state: SchedulerState::Idle,
            send_interval: config.send_interval,
            inter_packet_delay: config.inter_packet_delay,
            poll_interval: config.radio_poll_interval,
            stale_after_ticks: config.stale_after_ticks,
            last_sequence: 0,
            stale_ticks: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// True once no new frame has arrived for the configured number of ticks.
    pub fn is_stale(&self) -> bool {
        self.stale_after_ticks > 0 && self.stale_ticks >= self.stale_after_ticks
    }

    /// Build phase: copies the shared snapshot and partitions it.
    pub fn build(&mut self) -> Vec<RadioPacket> {
        self.state = SchedulerState::Build;
        self.track_freshness();
        let snapshot = self.board.sensors.read();
        build_packets(&self.schema, &snapshot)
    }

    /// Send phase: one `send` per packet, ascending. Failures are logged and
    /// skipped. Returns how many the radio accepted.
    pub fn send<T: Transport>(&mut self, link: &mut T, packets: &[RadioPacket]) -> usize {
        self.state = SchedulerState::Send;
        let mut delivered = 0;
        for (i, packet) in packets.iter().enumerate() {
            if i > 0 {
                thread::sleep(self.inter_packet_delay);
            }
            let line = packet.to_line();
            let ok = link.send(line.as_bytes());
            self.board.health.record_send(ok);
            if ok {
                log::debug!("[RF] Sent: {}", line);
                delivered += 1;
            } else {
                log::warn!("[RF] Send failed, dropping packet {:02}", packet.number);
            }
        }
        self.state = SchedulerState::Idle;
        delivered
    }

    /// One full Build → Send cycle.
    pub fn tick<T: Transport>(&mut self, link: &mut T) -> usize {
        let packets = self.build();
        self.send(link, &packets)
    }

    /// Drains pending ground commands from the link.
    pub fn poll_commands<T: Transport>(&mut self, link: &mut T) -> Vec<GroundCommand> {
        let mut commands = Vec::new();
        while let Some(payload) = link.receive() {
            let command = GroundCommand::parse(&String::from_utf8_lossy(&payload));
            match &command {
                GroundCommand::Test => log::info!("[RF] Command received: TEST. Test Successful"),
                GroundCommand::Unknown(raw) => log::warn!("[RF] Unknown command: {}", raw),
            }
            commands.push(command);
        }
        commands
    }

    /// Emits on a fixed cadence until `shutdown` is triggered.
    ///
    /// The next tick is due one interval after the previous one started, so a
    /// slow send shortens the following idle period instead of accumulating
    /// drift. A send that overruns the whole interval just delays the next one.
    pub fn run<T: Transport>(&mut self, link: &mut T, shutdown: &ShutdownToken) {
        log::info!("Packet scheduler started");
        let mut last_sent = Instant::now();
        while !shutdown.is_triggered() {
            let now = Instant::now();
            if now.duration_since(last_sent) >= self.send_interval {
                last_sent = now;
                let sent = self.tick(link);
                log::debug!("Tick complete, {} packets sent", sent);
            }
            self.poll_commands(link);
            shutdown.wait(self.poll_interval);
        }
        log::info!("Packet scheduler stopped");
    }

    fn track_freshness(&mut self) {
        let sequence = self.board.sensors.sequence();
        // Nothing ingested yet: no data to call stale.
        if sequence == 0 {
            return;
        }
        if sequence != self.last_sequence {
            if self.is_stale() {
                log::info!("Sensor frames resumed");
            }
            self.last_sequence = sequence;
            self.stale_ticks = 0;
            return;
        }
        self.stale_ticks = self.stale_ticks.saturating_add(1);
        if self.stale_after_ticks > 0 && self.stale_ticks == self.stale_after_ticks {
            log::warn!(
                "No new sensor frame for {} ticks, transmitting stale data",
                self.stale_ticks
            );
        }
    }
}

#[cfg(test)]
mod tests;
