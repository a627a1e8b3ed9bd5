//! Human-readable sizes, speeds and durations

/// Convert a byte count using binary prefixes
///
/// `1024` → `"1.0 KB"`, `1048576` → `"1.0 MB"`
pub fn bytes_to_readable_string(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    with_units(bytes, &["KB", "MB", "GB", "TB", "PB", "EB"])
}

/// Convert a bit rate using binary prefixes
///
/// `1024` → `"1.0 Kbit/s"`
pub fn bits_per_second_to_readable_string(bits_per_second: u64) -> String {
    if bits_per_second < 1024 {
        return format!("{} bit/s", bits_per_second);
    }
    with_units(bits_per_second, &["Kbit/s", "Mbit/s", "Gbit/s"])
}

pub fn seconds_to_readable_time(seconds: f32) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{} h {:02} min {:02} s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{} min {:02} s", minutes, secs)
    } else {
        format!("{} s", secs)
    }
}

fn with_units(value: u64, units: &[&str]) -> String {
    let mut size = value as f64;
    let mut unit = 0usize;

    size /= 1024.0;
    while size >= 1024.0 && unit < units.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, units[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes() {
        assert_eq!(bytes_to_readable_string(0), "0 B");
        assert_eq!(bytes_to_readable_string(1023), "1023 B");
        assert_eq!(bytes_to_readable_string(1024), "1.0 KB");
        assert_eq!(bytes_to_readable_string(1536), "1.5 KB");
        assert_eq!(bytes_to_readable_string(1_048_576), "1.0 MB");
        assert_eq!(bytes_to_readable_string(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_bits_per_second() {
        assert_eq!(bits_per_second_to_readable_string(800), "800 bit/s");
        assert_eq!(bits_per_second_to_readable_string(1024), "1.0 Kbit/s");
        assert_eq!(bits_per_second_to_readable_string(1_048_576), "1.0 Mbit/s");
        // saturates at the largest unit
        assert_eq!(
            bits_per_second_to_readable_string(1024u64.pow(4)),
            "1024.0 Gbit/s"
        );
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds_to_readable_time(4.4), "4 s");
        assert_eq!(seconds_to_readable_time(65.0), "1 min 05 s");
        assert_eq!(seconds_to_readable_time(3725.0), "1 h 02 min 05 s");
        assert_eq!(seconds_to_readable_time(-3.0), "0 s");
        assert_eq!(seconds_to_readable_time(f32::INFINITY), "0 s");
    }
}
