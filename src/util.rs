/// Format an epoch-millisecond timestamp as local date and time.
pub fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Hours with one decimal, the precision status lines use.
pub fn format_hours(hours: f64) -> String {
    format!("{hours:.1}h")
}

/// Non-negative interval given in hours, down to whole seconds ("30m 59s").
pub fn format_interval(hours: f64) -> String {
    let millis = (hours * crate::policy::MS_PER_HOUR).round().max(0.0) as u64;
    humantime::format_duration(std::time::Duration::from_secs(millis / 1000)).to_string()
}
