use std::path::Path;

use crate::error::{Result, RedubError};

/// Tempo range supported by a single ffmpeg `atempo` filter
pub const MIN_STRETCH_RATIO: f64 = 0.5;
pub const MAX_STRETCH_RATIO: f64 = 2.0;

/// Ratio of target to current duration, clamped to the atempo range.
///
/// An unknown or non-positive current duration yields 1.0.
pub fn stretch_ratio(current_seconds: Option<f64>, target_seconds: f64) -> f64 {
    match current_seconds {
        Some(current) if current > 0.0 && current.is_finite() => {
            (target_seconds / current).clamp(MIN_STRETCH_RATIO, MAX_STRETCH_RATIO)
        }
        _ => 1.0,
    }
}

/// Playback speed that turns audio of ratio `r` into the target length
pub fn atempo_factor(ratio: f64) -> f64 {
    1.0 / ratio
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration(output: &str) -> Result<f64> {
    let trimmed = output.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| RedubError::Media(format!("Unparsable duration: {:?}", trimmed)))
}

/// Number of segments ffmpeg produces for `total_seconds` of media
pub fn expected_chunk_count(total_seconds: f64, chunk_seconds: u32) -> usize {
    if total_seconds <= 0.0 || chunk_seconds == 0 {
        return 0;
    }
    (total_seconds / chunk_seconds as f64).ceil() as usize
}

/// Render an ffmpeg concat demuxer manifest.
///
/// Single quotes inside a path close the quoted string, emit an escaped
/// quote, and reopen it.
pub fn concat_manifest<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut manifest = String::new();
    for path in paths {
        let escaped = path.as_ref().to_string_lossy().replace('\'', "'\\''");
        manifest.push_str(&format!("file '{}'\n", escaped));
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_ratio_clamps_to_supported_range() {
        assert_eq!(stretch_ratio(Some(100.0), 400.0), 2.0);
        assert_eq!(stretch_ratio(Some(100.0), 10.0), 0.5);
        assert_eq!(stretch_ratio(Some(100.0), 150.0), 1.5);
    }

    #[test]
    fn test_stretch_ratio_defaults_when_unmeasurable() {
        assert_eq!(stretch_ratio(Some(0.0), 30.0), 1.0);
        assert_eq!(stretch_ratio(None, 30.0), 1.0);
        assert_eq!(stretch_ratio(Some(f64::NAN), 30.0), 1.0);
    }

    #[test]
    fn test_atempo_factor_stays_in_range() {
        for ratio in [MIN_STRETCH_RATIO, 1.0, 1.5, MAX_STRETCH_RATIO] {
            let factor = atempo_factor(ratio);
            assert!((MIN_STRETCH_RATIO..=MAX_STRETCH_RATIO).contains(&factor));
        }
        // 100s of speech stretched to 150s plays at two thirds speed
        assert!((atempo_factor(stretch_ratio(Some(100.0), 150.0)) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30.023000\n").unwrap(), 30.023);
        assert_eq!(parse_duration("  12 ").unwrap(), 12.0);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1").is_err());
    }

    #[test]
    fn test_expected_chunk_count_is_ceiling() {
        assert_eq!(expected_chunk_count(30.0, 300), 1);
        assert_eq!(expected_chunk_count(600.0, 300), 2);
        assert_eq!(expected_chunk_count(601.0, 300), 3);
        assert_eq!(expected_chunk_count(0.0, 300), 0);
    }

    #[test]
    fn test_concat_manifest_preserves_order_and_escapes_quotes() {
        let manifest = concat_manifest(&[
            "/w/chunks/translated_000.mp3",
            "/w/it's here/translated_001.mp3",
        ]);
        assert_eq!(
            manifest,
            "file '/w/chunks/translated_000.mp3'\nfile '/w/it'\\''s here/translated_001.mp3'\n"
        );
    }
}
