// Human-readable sizes, speeds and durations for the view model.

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Placeholder for a speed that is not known yet.
pub const UNKNOWN_SPEED: &str = "—";
/// Placeholder for an ETA that cannot be estimated yet.
pub const UNKNOWN_ETA: &str = "calculating…";

// Format bytes using binary units, always one decimal: "1.5 KB"
pub fn fmt_size(bytes: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut v = bytes as f64;
    let mut i = 0usize;
    while v >= 1024.0 && i < units.len() - 1 {
        v /= 1024.0;
        i += 1;
    }
    format!("{:.1} {}", v, units[i])
}

// Three tiers: whole B/s, KB/s with one decimal, MB/s with two.
pub fn fmt_speed(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return UNKNOWN_SPEED.to_string();
    }
    if bytes_per_sec < KIB {
        format!("{:.0} B/s", bytes_per_sec)
    } else if bytes_per_sec < MIB {
        format!("{:.1} KB/s", bytes_per_sec / KIB)
    } else {
        format!("{:.2} MB/s", bytes_per_sec / MIB)
    }
}

// "{m}m {s}s" with both parts floored, or the placeholder for infinite/NaN.
pub fn fmt_eta(eta_seconds: f64) -> String {
    if !eta_seconds.is_finite() || eta_seconds < 0.0 {
        return UNKNOWN_ETA.to_string();
    }
    let minutes = (eta_seconds / 60.0).floor() as u64;
    let seconds = (eta_seconds % 60.0).floor() as u64;
    format!("{}m {}s", minutes, seconds)
}

// Batch totals are always shown in MB, like the progress line of the web page.
pub fn fmt_total_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB)
}
