use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::TelemetryValue;
use crate::constants::MIN_SUMMARY_SAMPLES;
use crate::constants::RECENT_WINDOW;
use crate::constants::TIME_FIELD;
use crate::ExportError;
use crate::Result;
use crate::TelemetryStore;

/// Fields covered by the mission report, with their display labels
pub const REPORT_FIELDS: [(&str, &str); 5] = [
    ("Alt", "Altitude"),
    ("P", "Pressure"),
    ("T", "Temp"),
    ("Accel", "Accel"),
    ("Gyro", "Gyro"),
];

/// Descriptive statistics over the numeric samples of one history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSummary {
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Mean of the newest `RECENT_WINDOW` samples
    pub recent_mean: f64,
}

impl FieldSummary {
    /// Summarizes the numeric entries of `values`, ignoring text.
    ///
    /// Returns `None` until at least `MIN_SUMMARY_SAMPLES` numeric samples
    /// are present.
    pub fn from_values(values: &[TelemetryValue]) -> Option<Self> {
        let numbers: Vec<f64> = values.iter().filter_map(TelemetryValue::as_f64).collect();
        if numbers.len() < MIN_SUMMARY_SAMPLES {
            return None;
        }

        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let recent = &numbers[numbers.len().saturating_sub(RECENT_WINDOW)..];

        Some(Self {
            samples: numbers.len(),
            min,
            max,
            mean: mean(&numbers),
            recent_mean: mean(recent),
        })
    }

    /// Snapshot-and-summarize for a single field
    pub fn from_store(
        store: &TelemetryStore,
        field: &str,
    ) -> Option<Self> {
        Self::from_values(&store.snapshot_history(field))
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// End-of-session statistics for the flight fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    /// `(label, summary)` for every report field with enough samples
    pub fields: Vec<(String, FieldSummary)>,
    /// Rows in the `time` history
    pub total_samples: usize,
}

impl MissionReport {
    /// Builds the report from one consistent snapshot of the store.
    pub fn from_store(store: &TelemetryStore) -> Self {
        let mut names: Vec<&str> = REPORT_FIELDS.iter().map(|(field, _)| *field).collect();
        names.push(TIME_FIELD);
        let snapshot = store.snapshot_fields(&names);

        let fields = REPORT_FIELDS
            .iter()
            .filter_map(|(field, label)| {
                let values = snapshot.get(*field)?;
                FieldSummary::from_values(values).map(|s| (label.to_string(), s))
            })
            .collect();
        let total_samples = snapshot.get(TIME_FIELD).map(Vec::len).unwrap_or(0);

        Self {
            fields,
            total_samples,
        }
    }

    /// Plain-text report, one line per field then the sample total.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Writes the rendered report to `path`, replacing any existing file.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(ExportError::from)?;
        debug!(path = %path.display(), "mission report saved");
        Ok(())
    }
}

impl fmt::Display for MissionReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (label, s) in &self.fields {
            writeln!(
                f,
                "{label}: min={:.2}, max={:.2}, avg={:.2}, avg(10s)={:.2}",
                s.min, s.max, s.mean, s.recent_mean
            )?;
        }
        writeln!(f, "Total Samples: {}", self.total_samples)
    }
}
