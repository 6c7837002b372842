/// Formats a sample count as `HH:MM:SS.mmm`, truncating to whole milliseconds.
pub fn time_str(samples: u64, sample_rate: u32) -> String {
    let ms = samples * 1000 / u64::from(sample_rate.max(1));

    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1000 % 60;
    let milliseconds = ms % 1000;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

#[test]
fn test_time_str() {
    assert_eq!(time_str(0, 48000), "00:00:00.000");
    assert_eq!(time_str(960, 48000), "00:00:00.020");
    assert_eq!(time_str(48000 * 3661 + 24000, 48000), "01:01:01.500");
    assert_eq!(time_str(8000 * 3600 * 120, 8000), "120:00:00.000");
}
