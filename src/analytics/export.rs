use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::codec::TelemetryValue;
use crate::constants::TIME_FIELD;
use crate::store::HistorySnapshot;
use crate::ExportError;
use crate::Result;
use crate::TelemetryStore;

/// Writes every history as CSV: a header of field names in store order, then
/// one row per `time` entry.
///
/// Histories shorter than `time` (fields first seen mid-session) leave their
/// trailing cells empty. Returns the number of data rows written.
pub fn export_csv<W: Write>(
    store: &TelemetryStore,
    writer: W,
) -> Result<usize> {
    write_snapshot(&store.snapshot_all(), writer)
}

/// Like [`export_csv`] restricted to `fields`, in the given order.
///
/// # Errors
/// [`ExportError::UnknownField`] for a name the store has never seen.
pub fn export_fields_csv<W: Write>(
    store: &TelemetryStore,
    fields: &[&str],
    writer: W,
) -> Result<usize> {
    let known = store.field_names();
    if let Some(missing) = fields.iter().find(|f| !known.iter().any(|k| k.as_str() == **f)) {
        return Err(ExportError::UnknownField(missing.to_string()).into());
    }

    let mut names: Vec<&str> = fields.to_vec();
    if !names.contains(&TIME_FIELD) {
        names.push(TIME_FIELD);
    }
    let mut snapshot = store.snapshot_fields(&names);
    if !fields.contains(&TIME_FIELD) {
        // Row count still follows `time`; only the column is dropped
        let rows = snapshot.shift_remove(TIME_FIELD).map(|t| t.len()).unwrap_or(0);
        return write_rows(&snapshot, rows, writer);
    }
    write_snapshot(&snapshot, writer)
}

/// Creates (or truncates) `path` and exports every history into it.
pub fn export_csv_file(
    store: &TelemetryStore,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(ExportError::from)?;
    let rows = export_csv(store, file)?;
    debug!(path = %path.display(), rows, "telemetry exported");
    Ok(rows)
}

fn write_snapshot<W: Write>(
    snapshot: &HistorySnapshot,
    writer: W,
) -> Result<usize> {
    let rows = snapshot.get(TIME_FIELD).map(Vec::len).unwrap_or(0);
    write_rows(snapshot, rows, writer)
}

fn write_rows<W: Write>(
    snapshot: &HistorySnapshot,
    rows: usize,
    writer: W,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(snapshot.keys()).map_err(ExportError::from)?;

    for i in 0..rows {
        let row = snapshot
            .values()
            .map(|history| history.get(i).map(TelemetryValue::to_string).unwrap_or_default());
        wtr.write_record(row).map_err(ExportError::from)?;
    }

    wtr.flush().map_err(ExportError::from)?;
    Ok(rows)
}
