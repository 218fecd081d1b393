//! Driver inspection reports.
//!
//! Operators need to see what a loaded driver actually claims — name,
//! version, supported models, enumerated inputs — without attaching a
//! debugger to the control processor. [`DriverReport`] captures that
//! snapshot and [`DiagnosticsPort`] abstracts where it goes; the default
//! sink writes it to the structured log as JSON.

use crate::driver::{DisplayDriver, DriverInfo, InputDetail, InputSourceId};
use crate::error::BridgeResult;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

/// Point-in-time snapshot of one driver's metadata and state.
#[derive(Clone, Debug, Serialize)]
pub struct DriverReport {
    /// Static driver metadata.
    pub info: DriverInfo,
    /// Assigned numeric identity.
    pub id: u8,
    /// Whether the driver session is currently live.
    pub connected: bool,
    /// Currently active input, if known.
    pub input_source: Option<InputSourceId>,
    /// Inputs the device can switch to.
    pub inputs: Vec<InputDetail>,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

impl DriverReport {
    /// Captures a snapshot from the given driver.
    pub fn capture(driver: &dyn DisplayDriver) -> Self {
        Self {
            info: driver.info(),
            id: driver.id(),
            connected: driver.connected(),
            input_source: driver.input_source(),
            inputs: driver.usable_inputs(),
            generated_at: Utc::now(),
        }
    }
}

/// Sink for driver reports.
pub trait DiagnosticsPort: Send + Sync {
    /// Publishes one report.
    fn publish(&self, report: &DriverReport) -> BridgeResult<()>;
}

/// Publishes reports to the structured log as pretty-printed JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticsPort for LogDiagnostics {
    fn publish(&self, report: &DriverReport) -> BridgeResult<()> {
        let rendered = serde_json::to_string_pretty(report).map_err(anyhow::Error::from)?;
        info!("driver report for '{}':\n{}", report.info.driver_name, rendered);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDisplay;

    #[test]
    fn report_captures_inputs_and_identity() {
        let display = MockDisplay::new();
        display.set_id(4);
        let report = DriverReport::capture(&display);
        assert_eq!(report.id, 4);
        assert_eq!(report.inputs.len(), 3);
        assert!(!report.info.driver_name.is_empty());
    }

    #[test]
    fn report_serializes_to_json() {
        let display = MockDisplay::new();
        let report = DriverReport::capture(&display);
        let rendered = serde_json::to_string(&report).unwrap();
        assert!(rendered.contains("driver_name"));
        assert!(rendered.contains("generated_at"));
    }
}
