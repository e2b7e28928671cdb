use crate::progress::types::ProgressEvent;

const MIB: f64 = 1024.0 * 1024.0;

/// Bytes as megabytes with one decimal, e.g. `12.3 MB`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB)
}

/// Status line for a progress sample.
///
/// Falls back to the raw byte count when the total is unknown.
pub fn render_progress(event: &ProgressEvent) -> String {
    let mut text = match event.percent() {
        Some(percent) => format!("Downloaded: {percent:.1}%"),
        None => format!("Downloaded: {}", format_megabytes(event.bytes_downloaded)),
    };

    if let Some(speed) = event.speed.filter(|s| s.is_finite() && *s > 0.0) {
        text.push_str(&format!(" at {:.1} MB/s", speed / MIB));
    }

    text
}
