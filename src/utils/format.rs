const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Transfer size shown next to the Receiving phase, e.g. `512 B` or `2.0 KB`
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
