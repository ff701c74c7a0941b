//! Video transcoding and frame extraction through ffmpeg.

use super::tier::TierParams;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no output written to {}", .0.display())]
    MissingOutput(PathBuf),
}

/// External transcoder. A returned error is the only failure signal the pipeline consumes.
#[async_trait]
pub trait VideoTranscoder: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        params: &TierParams,
    ) -> Result<(), TranscodeError>;

    /// Write a single still frame taken `at_secs` into the clip.
    async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        at_secs: f64,
    ) -> Result<(), TranscodeError>;
}

pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<String>, output: &Path) -> Result<(), TranscodeError> {
        let out = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            // ffmpeg prints the actual error at the end
            let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" | ");
            return Err(TranscodeError::Failed {
                program: self.program.clone(),
                status: out.status,
                stderr: tail,
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(m) if m.len() > 0 => Ok(()),
            _ => Err(TranscodeError::MissingOutput(output.to_path_buf())),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Full argument list for one transcode, input and output included.
pub fn transcode_args(input: &Path, output: &Path, p: &TierParams) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vcodec".into(),
        "libx264".into(),
        "-crf".into(),
        p.crf.to_string(),
        "-preset".into(),
        p.preset.into(),
        "-r".into(),
        p.fps.to_string(),
        "-acodec".into(),
        "aac".into(),
        "-ac".into(),
        "1".into(),
        "-b:a".into(),
        format!("{}k", p.audio_kbps),
        "-movflags".into(),
        "faststart".into(),
        "-vf".into(),
        p.scale_filter(),
        output.to_string_lossy().into_owned(),
    ]
}

pub fn frame_args(input: &Path, output: &Path, at_secs: f64) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format!("{at_secs:.3}"),
        "-frames:v".into(),
        "1".into(),
        output.to_string_lossy().into_owned(),
    ]
}

#[async_trait]
impl VideoTranscoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        params: &TierParams,
    ) -> Result<(), TranscodeError> {
        self.run(transcode_args(input, output, params), output).await
    }

    async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        at_secs: f64,
    ) -> Result<(), TranscodeError> {
        self.run(frame_args(input, output, at_secs), output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tier::CompressionTier;

    #[test]
    fn transcode_args_carry_tier_settings() {
        let p = CompressionTier::Strong.params();
        let args = transcode_args(Path::new("in.raw"), Path::new("out.mp4"), &p);
        let joined = args.join(" ");
        assert!(joined.starts_with("-y -i in.raw "));
        assert!(joined.contains("-crf 34 -preset veryfast -r 20"));
        assert!(joined.contains("-ac 1 -b:a 48k -movflags faststart"));
        assert!(joined.ends_with("-vf scale='min(360,iw)':-2 out.mp4"));
    }

    #[test]
    fn frame_args_seek_with_millis() {
        let args = frame_args(Path::new("v.mp4"), Path::new("p.jpg"), 1.0);
        assert_eq!(args[4], "1.000");
        assert_eq!(args.last().unwrap(), "p.jpg");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let t = FfmpegTranscoder::new("definitely-not-a-real-ffmpeg-binary");
        let p = CompressionTier::Standard.params();
        let err = t
            .transcode(Path::new("a"), Path::new("b"), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
    }
}
