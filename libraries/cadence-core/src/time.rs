/// Format a millisecond position as `m:ss`
///
/// Absent or zero input renders as `0:00`.
pub fn format_time(millis: Option<u64>) -> String {
    let total_seconds = millis.unwrap_or(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
