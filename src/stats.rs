use itertools::Itertools;

/// Mean of `times` after dropping exactly one minimum and one maximum entry.
/// Returns None for fewer than 3 entries. With duplicate extremes only a
/// single instance of each is trimmed, so `[10, 10, 10]` averages to 10.
pub fn trimmed_average(times: &[u64]) -> Option<f64> {
    if times.len() < 3 {
        return None;
    }

    let sorted: Vec<u64> = times.iter().copied().sorted().collect();
    let trimmed = &sorted[1..sorted.len() - 1];
    let sum: u64 = trimmed.iter().sum();

    Some(sum as f64 / trimmed.len() as f64)
}

/// Average-of-N over the most recent `n` entries (times are ordered
/// most-recent-first). None if fewer than `n` entries exist.
pub fn average_of_n(times: &[u64], n: usize) -> Option<f64> {
    if times.len() < n {
        return None;
    }
    trimmed_average(&times[..n])
}

pub fn mean(times: &[u64]) -> Option<f64> {
    match times.len() {
        0 => None,
        count => Some(times.iter().sum::<u64>() as f64 / count as f64),
    }
}

/// Formats a duration as `M:SS.cc` above one minute, `S.cc` below.
pub fn format_ms(ms: u64) -> String {
    let centis = (ms % 1000) / 10;
    let total_secs = ms / 1000;
    let mins = total_secs / 60;
    let secs = total_secs % 60;

    if mins > 0 {
        format!("{}:{:02}.{:02}", mins, secs, centis)
    } else {
        format!("{}.{:02}", secs, centis)
    }
}

/// Formats an optional average the way the history panel shows it.
pub fn format_average(avg: Option<f64>) -> String {
    match avg {
        Some(ms) => format_ms(ms.round() as u64),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_average_requires_three_entries() {
        assert_eq!(trimmed_average(&[]), None);
        assert_eq!(trimmed_average(&[12000]), None);
        assert_eq!(trimmed_average(&[12000, 9000]), None);
    }

    #[test]
    fn trimmed_average_drops_one_min_and_one_max() {
        assert_eq!(trimmed_average(&[9000, 12000, 15000]), Some(12000.0));
        assert_eq!(
            trimmed_average(&[12000, 11000, 13000, 9000, 15000]),
            Some(12000.0)
        );
    }

    #[test]
    fn trimmed_average_duplicate_extremes() {
        // Only a single instance of each extreme is trimmed.
        assert_eq!(trimmed_average(&[10, 10, 10]), Some(10.0));
        assert_eq!(trimmed_average(&[10, 10, 10, 10]), Some(10.0));
    }

    #[test]
    fn average_of_n_requires_n_entries() {
        assert_eq!(average_of_n(&[12000, 11000], 5), None);
        assert_eq!(average_of_n(&[], 5), None);
    }

    #[test]
    fn average_of_five_matches_reference() {
        let times = [12000, 11000, 13000, 9000, 15000];
        assert_eq!(average_of_n(&times, 5), Some(12000.0));
    }

    #[test]
    fn average_of_n_uses_most_recent() {
        // Most-recent-first: the trailing 60000 falls outside the window.
        let times = [10000, 11000, 12000, 60000];
        assert_eq!(average_of_n(&times, 3), Some(11000.0));
    }

    #[test]
    fn mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[5000, 7000]), Some(6000.0));
    }

    #[test]
    fn format_sub_minute() {
        assert_eq!(format_ms(0), "0.00");
        assert_eq!(format_ms(9870), "9.87");
        assert_eq!(format_ms(12345), "12.34");
    }

    #[test]
    fn format_over_a_minute() {
        assert_eq!(format_ms(62340), "1:02.34");
        assert_eq!(format_ms(600000), "10:00.00");
    }
}
