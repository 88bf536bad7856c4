use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;

use super::model::{Field, MergedSample};

/// Export header: timestamp, DPG, then every field for each placement.
pub fn merged_header() -> Vec<String> {
    let mut header = vec!["timestamp".to_string(), "dpg".to_string()];
    for prefix in ["distal", "proximal"] {
        header.extend(Field::ALL.iter().map(|f| format!("{prefix}_{}", f.key())));
    }
    header
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render the merged timeline as CSV. Nulls become empty cells.
pub fn merged_to_csv(samples: &[MergedSample]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    let mut writer = csv::Writer::from_writer(&mut buf);
    writer.write_record(merged_header())?;

    for s in samples {
        let mut record = Vec::with_capacity(2 + 2 * Field::COUNT);
        record.push(s.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
        record.push(cell(s.differential));
        record.extend(s.distal.iter().map(|(_, v)| cell(v)));
        record.extend(s.proximal.iter().map(|(_, v)| cell(v)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the merged timeline to `path`.
pub fn export_merged(path: &Path, samples: &[MergedSample]) -> Result<()> {
    let text = merged_to_csv(samples).context("rendering merged CSV")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("exported {} merged samples to {}", samples.len(), path.display());
    Ok(())
}
