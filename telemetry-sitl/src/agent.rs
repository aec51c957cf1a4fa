use std::thread::sleep;
use std::time::{Duration, Instant};
use telemetry_core::{LineSource, TransportError};

/// Stands in for the sensor board: emits one frame per period for a fixed
/// flight time, then drops the connection.
///
/// Every `gps_every`-th frame carries the GPS tail; the rest stop after the
/// gyro fields, as the board does between fixes. Every `corrupt_every`-th
/// frame is garbled to exercise the drop path.
pub struct SyntheticSensor {
    started: Instant,
    flight_time: Duration,
    period: Duration,
    frame: u32,
    gps_every: u32,
    corrupt_every: u32,
}

impl SyntheticSensor {
    pub fn new(flight_time: Duration, period: Duration) -> Self {
        Self {
            started: Instant::now(),
            flight_time,
            period,
            frame: 0,
            gps_every: 5,
            corrupt_every: 37,
        }
    }

    fn next_frame(&mut self) -> String {
        self.frame += 1;
        let t = self.started.elapsed().as_secs_f64();
        if self.frame % self.corrupt_every == 0 {
            return format!("{:.0}, 25.0, ERR", t * 1000.0);
        }

        // Simple boost/coast profile.
        let burn = 2.0;
        let (accel_z, altitude) = if t < burn {
            (30.0, 0.5 * 30.0 * t * t)
        } else {
            let v0 = 30.0 * burn;
            let dt = t - burn;
            (-9.81, 60.0 + v0 * dt - 0.5 * 9.81 * dt * dt)
        };
        let altitude = altitude.max(0.0);
        let pressure = 101.325 * (1.0 - 2.25577e-5 * altitude).powf(5.25588);

        let mut line = format!(
            "{:.0}, {:.2}, {:.3}, {:.1}, {:.2}, {:.2}, {:.2}, {:.3}, {:.3}, {:.3}",
            t * 1000.0,
            25.0 - altitude * 0.0065,
            pressure,
            altitude,
            0.01,
            -0.02,
            accel_z,
            0.001,
            0.002,
            0.15,
        );
        if self.frame % self.gps_every == 1 {
            line.push_str(&format!(
                ", {:.6}, {:.6}, {:.1}, {:.1}, {}",
                44.9778,
                -93.2650,
                256.0 + altitude,
                altitude / t.max(0.1),
                9
            ));
        }
        line
    }
}

impl LineSource for SyntheticSensor {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if self.started.elapsed() >= self.flight_time {
            return Err(TransportError::Disconnected);
        }
        sleep(self.period);
        Ok(Some(self.next_frame()))
    }
}
