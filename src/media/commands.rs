use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RedubError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Stream copy every selected stream
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn map<S: Into<String>>(self, specifier: S) -> Self {
        self.arg("-map").arg(specifier)
    }

    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-filter:a").arg(filter)
    }

    /// Run the command and return its stdout
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| RedubError::Media(format!(
                "Failed to execute {}: {}", self.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RedubError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Builder for the ffmpeg and ffprobe invocations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_binary_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_binary_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_binary_path: probe_binary_path.into(),
        }
    }

    /// Demux the first audio stream into a standalone file.
    ///
    /// WAV holds a single stream, so extra tracks (commentary, other
    /// languages) are left out.
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .map("0:a:0")
            .output(audio_path)
    }

    /// Cut a media file into fixed-length segments named by `pattern`
    pub fn segment<P: AsRef<Path>>(
        &self,
        input_path: P,
        pattern: P,
        segment_seconds: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, format!("Segmentation ({}s)", segment_seconds))
            .overwrite()
            .input(input_path)
            .format("segment")
            .arg("-segment_time").arg(segment_seconds.to_string())
            .arg("-reset_timestamps").arg("1")
            .copy_streams()
            .output(pattern)
    }

    /// Concatenate the files listed in a concat manifest
    pub fn concat<P: AsRef<Path>>(&self, manifest_path: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio concatenation")
            .overwrite()
            .format("concat")
            .arg("-safe").arg("0")
            .input(manifest_path)
            .copy_streams()
            .output(output_path)
    }

    /// Keep the first video stream untouched and replace the audio
    pub fn remux<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        output_path: P,
        audio_codec: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio/video remux")
            .overwrite()
            .input(video_path)
            .input(audio_path)
            .video_codec("copy")
            .audio_codec(audio_codec)
            .map("0:v:0")
            .map("1:a:0")
            .output(output_path)
    }

    /// Change playback tempo without altering pitch
    pub fn tempo<P: AsRef<Path>>(&self, audio_path: P, output_path: P, factor: f64) -> MediaCommand {
        MediaCommand::new(&self.binary_path, format!("Tempo adjustment (x{:.4})", factor))
            .overwrite()
            .input(audio_path)
            .audio_filter(format!("atempo={:.6}", factor))
            .output(output_path)
    }

    /// Print the container duration in seconds and nothing else
    pub fn probe_duration<P: AsRef<Path>>(&self, media_path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Duration probe")
            .arg("-v").arg("error")
            .arg("-show_entries").arg("format=duration")
            .arg("-of").arg("default=noprint_wrappers=1:nokey=1")
            .output(media_path)
    }

    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe")
    }

    #[test]
    fn test_paths_with_spaces_and_quotes_stay_single_arguments() {
        let command = builder().extract_audio("my \"clip\" $(rm).mp4", "out dir/audio.wav");
        assert_eq!(
            command.args,
            vec!["-y", "-i", "my \"clip\" $(rm).mp4", "-vn", "-map", "0:a:0", "out dir/audio.wav"]
        );
    }

    #[test]
    fn test_extract_maps_exactly_one_audio_stream() {
        let command = builder().extract_audio("two_tracks.mkv", "audio.wav");
        let maps: Vec<&str> = command
            .args
            .windows(2)
            .filter(|pair| pair[0] == "-map")
            .map(|pair| pair[1].as_str())
            .collect();

        assert_eq!(maps, vec!["0:a:0"]);
        assert!(!command.args.iter().any(|arg| arg == "-q:a"));
    }

    #[test]
    fn test_segment_command() {
        let command = builder().segment("uploads/audio.wav", "uploads/chunks/chunk_%03d.wav", 300);
        assert_eq!(command.binary_path, "ffmpeg");
        assert_eq!(
            command.args,
            vec![
                "-y", "-i", "uploads/audio.wav", "-f", "segment", "-segment_time", "300",
                "-reset_timestamps", "1", "-c", "copy", "uploads/chunks/chunk_%03d.wav",
            ]
        );
    }

    #[test]
    fn test_concat_command_puts_format_before_input() {
        let command = builder().concat("list.txt", "merged.mp3");
        assert_eq!(
            command.args,
            vec!["-y", "-f", "concat", "-safe", "0", "-i", "list.txt", "-c", "copy", "merged.mp3"]
        );
    }

    #[test]
    fn test_remux_copies_video_and_maps_streams() {
        let command = builder().remux("in.mp4", "dub.mp3", "out.mp4", "aac");
        assert_eq!(
            command.args,
            vec![
                "-y", "-i", "in.mp4", "-i", "dub.mp3", "-c:v", "copy", "-c:a", "aac",
                "-map", "0:v:0", "-map", "1:a:0", "out.mp4",
            ]
        );
    }

    #[test]
    fn test_probe_uses_probe_binary() {
        let command = builder().probe_duration("a.wav");
        assert_eq!(command.binary_path, "ffprobe");
        assert_eq!(command.args.last().map(String::as_str), Some("a.wav"));
    }

    #[test]
    fn test_tempo_filter_argument() {
        let command = builder().tempo("a.mp3", "b.mp3", 0.5);
        assert!(command.args.contains(&"atempo=0.500000".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let command = MediaCommand::new("redub-no-such-binary", "Missing").arg("-version");
        let result = command.execute().await;
        assert!(matches!(result, Err(RedubError::Media(_))));
    }
}
