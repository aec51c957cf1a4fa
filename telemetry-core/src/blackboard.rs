use crate::datacells::DataCell;
use crate::health_types::LinkHealth;
use crate::types::SensorSnapshot;
use std::sync::Arc;

/// State shared between the ingestion and emission threads of one vehicle.
///
/// Ingestion is the only writer of `sensors`; the scheduler only reads it.
/// `health` is shared on its own with the vehicle logger, which counts
/// flushed rows into it.
pub struct Blackboard {
    pub sensors: DataCell<SensorSnapshot>,
    pub health: Arc<LinkHealth>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self {
            sensors: DataCell::new(SensorSnapshot::new()),
            health: Arc::new(LinkHealth::new()),
        }
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}
