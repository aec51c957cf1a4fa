mod agent;

use agent::SyntheticSensor;
use std::thread;
use std::time::Duration;
use telemetry_core::{
    CsvFileStorage, GroundCommand, GroundStation, HalfDuplexLink, LoopbackRadio, ShutdownToken,
    SystemClock, TelemetryConfig, TelemetryError, TransportError, run_vehicle,
};

// Simulated flight length
const FLIGHT_TIME: Duration = Duration::from_secs(12);
// Sensor board frame period (10 Hz)
const FRAME_PERIOD: Duration = Duration::from_millis(100);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = TelemetryConfig::default();

    let (vehicle_radio, ground_radio) = LoopbackRadio::pair();
    let vehicle_link =
        HalfDuplexLink::new(vehicle_radio, config.transmission_unit, config.inter_chunk_delay);
    let ground_link =
        HalfDuplexLink::new(ground_radio, config.transmission_unit, config.inter_chunk_delay);

    let vehicle_storage =
        CsvFileStorage::create_in(&config.log_dir, &config.vehicle_log_prefix, &SystemClock)?;
    let ground_storage =
        CsvFileStorage::create_in(&config.log_dir, &config.ground_log_prefix, &SystemClock)?;

    let mut station = GroundStation::new(&config, ground_link, ground_storage, SystemClock)?;
    station.send_command(&GroundCommand::Test);

    let vehicle_shutdown = ShutdownToken::new();
    let ground_shutdown = ShutdownToken::new();

    println!("SITL link active. Flying for {}s...", FLIGHT_TIME.as_secs());

    let ground = {
        let ground_shutdown = ground_shutdown.clone();
        thread::spawn(move || station.run(&ground_shutdown))
    };

    let sensor = SyntheticSensor::new(FLIGHT_TIME, FRAME_PERIOD);
    let vehicle = run_vehicle(
        &config,
        sensor,
        vehicle_link,
        vehicle_storage,
        SystemClock,
        &vehicle_shutdown,
    );

    // Give the last packets time to arrive before the ground side stops.
    thread::sleep(config.send_interval);
    ground_shutdown.trigger();
    let ground = ground
        .join()
        .map_err(|_| TelemetryError::Panicked("ground station"))?;

    match vehicle {
        Ok(report) => println!("\nVehicle stopped: {:?}", report),
        Err(TelemetryError::Transport(TransportError::Disconnected)) => {
            println!("\nSensor stream ended, vehicle log drained.")
        }
        Err(e) => return Err(e.into()),
    }
    ground?;
    println!("Logs written to {}", config.log_dir.display());
    Ok(())
}
