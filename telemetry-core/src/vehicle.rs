//! Vehicle node: the ingestion and emission threads and their supervision.

use crate::blackboard::Blackboard;
use crate::config::TelemetryConfig;
use crate::error::{StorageError, TelemetryError};
use crate::health_types::LinkHealthReport;
use crate::log::{LogEntry, TimeSource, vehicle_header};
use crate::logger::{BufferedLogger, LogStorage};
use crate::scheduler::PacketScheduler;
use crate::sensors::SensorFrameParser;
use crate::shutdown::ShutdownToken;
use crate::transport::{LineSource, Transport};
use std::sync::Arc;
use std::thread;

/// Triggers the token when dropped, including while unwinding, so one dead
/// activity always stops the other.
struct StopOnExit<'a>(&'a ShutdownToken);

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

/// Reads sensor frames, publishes them to the blackboard and logs them.
///
/// Sole writer of both the shared snapshot and the vehicle log.
pub struct Ingestion<L: LineSource, S: LogStorage, C: TimeSource> {
    source: L,
    parser: SensorFrameParser,
    board: Arc<Blackboard>,
    logger: BufferedLogger<S>,
    clock: C,
}

impl<L: LineSource, S: LogStorage, C: TimeSource> Ingestion<L, S, C> {
    pub fn new(
        config: &TelemetryConfig,
        source: L,
        board: Arc<Blackboard>,
        storage: S,
        clock: C,
    ) -> Result<Self, StorageError> {
        let logger = BufferedLogger::initialize(
            storage,
            &vehicle_header(&config.schema),
            config.flush_threshold,
        )?
        .with_health(Arc::clone(&board.health));
        Ok(Self {
            source,
            parser: SensorFrameParser::new(),
            board,
            logger,
            clock,
        })
    }

    /// Parses, publishes and logs one line. A bad frame is dropped with a
    /// warning; only storage failures are returned.
    pub fn handle_line(&mut self, line: &str) -> Result<(), StorageError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let (snapshot, outcome) = self.parser.ingest(line);
        let reading = snapshot.reading.clone();
        self.board.sensors.update(snapshot);

        match outcome {
            Ok(()) => {
                self.board.health.record_frame();
                self.logger.append(LogEntry::Reading {
                    timestamp: self.clock.now(),
                    values: reading,
                })
            }
            Err(e) => {
                self.board.health.record_parse_error();
                log::warn!("{}: {}", e, line);
                Ok(())
            }
        }
    }

    /// Ingests until shutdown or disconnect, then drains the log.
    ///
    /// A disconnect is returned as an error after the drain; it also
    /// triggers `shutdown` so the scheduler stops transmitting stale data.
    pub fn run(&mut self, shutdown: &ShutdownToken) -> Result<(), TelemetryError> {
        log::info!("Waiting for data...");
        let outcome = self.read_until_stopped(shutdown);
        shutdown.trigger();
        let closed = self.logger.close();
        if let Err(e) = &closed {
            log::error!("Final log drain failed: {}", e);
        }
        outcome?;
        closed?;
        Ok(())
    }

    fn read_until_stopped(&mut self, shutdown: &ShutdownToken) -> Result<(), TelemetryError> {
        while !shutdown.is_triggered() {
            match self.source.read_line() {
                Ok(Some(line)) => self.handle_line(&line)?,
                Ok(None) => {}
                Err(e) => {
                    log::error!("Serial connection issue: {}", e);
                    return Err(e.into());
                }
            }
        }
        log::info!("Stopping sensor read");
        Ok(())
    }

    pub fn logger(&self) -> &BufferedLogger<S> {
        &self.logger
    }
}

/// Runs ingestion and emission on two threads until either stops.
///
/// Returns once both threads have finished and the vehicle log has been
/// drained. The first error wins; a disconnect of the sensor stream is
/// reported as [`crate::error::TransportError::Disconnected`].
pub fn run_vehicle<L, T, S, C>(
    config: &TelemetryConfig,
    source: L,
    mut link: T,
    storage: S,
    clock: C,
    shutdown: &ShutdownToken,
) -> Result<LinkHealthReport, TelemetryError>
where
    L: LineSource + Send,
    T: Transport + Send,
    S: LogStorage + Send,
    C: TimeSource + Send,
{
    let board = Arc::new(Blackboard::new());
    let mut ingestion = Ingestion::new(config, source, Arc::clone(&board), storage, clock)?;
    let mut scheduler = PacketScheduler::new(config, Arc::clone(&board));

    let (ingested, emitted) = thread::scope(|s| {
        let ingest = s.spawn(|| {
            let _stop = StopOnExit(shutdown);
            ingestion.run(shutdown)
        });
        let emit = s.spawn(|| {
            let _stop = StopOnExit(shutdown);
            scheduler.run(&mut link, shutdown);
        });
        (ingest.join(), emit.join())
    });

    let report = board.health.capture();
    log::info!("Link health at shutdown: {:?}", report);

    emitted.map_err(|_| TelemetryError::Panicked("emission"))?;
    ingested.map_err(|_| TelemetryError::Panicked("ingestion"))??;
    Ok(report)
}
