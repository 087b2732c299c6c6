//! CSV export of per-device energy usage.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::report::EnergyReport;

/// Column header for the device energy table.
const HEADER: &str = "device_id,name,type,room,power,watt,energy_kwh";

/// Exports the device rows of `report` to a CSV file at the given path.
///
/// # Arguments
///
/// * `report` - Energy report built from the current state
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(report: &EnergyReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(report, buf)
}

/// Writes the device rows of `report` as CSV to any writer.
///
/// Devices whose room no longer exists get an empty `room` cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(report: &EnergyReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for d in &report.devices {
        wtr.write_record(&[
            d.device_id.to_string(),
            d.name.clone(),
            d.device_type.to_string(),
            d.room.clone().unwrap_or_default(),
            d.power.to_string(),
            format!("{:.1}", d.watt),
            format!("{:.6}", d.energy_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
