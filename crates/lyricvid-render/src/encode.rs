//! FFmpeg command building and the encode pipeline.
//!
//! Scenes are rendered to frame sequences, encoded into intermediate clips,
//! then concatenated and encoded once with the selected quality profile.
//! Very large scene counts can instead be encoded in fixed-size batches to
//! bound peak disk/memory use, producing numbered output segments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use lyricvid_models::EncodingProfile;

use crate::error::{RenderError, RenderResult};

/// Default per-invocation FFmpeg timeout.
const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 600;

/// Builder for FFmpeg commands.
///
/// The input is a string rather than a path so `lavfi` sources can be used
/// as inputs for overlay rasterisation.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: String,
    output: PathBuf,
    input_args: Vec<String>,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the input frame rate (before -i).
    pub fn framerate(self, fps: u32) -> Self {
        self.input_arg("-framerate").input_arg(fps.to_string())
    }

    /// Set a video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Emit a single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());
        args.push("-i".to_string());
        args.push(self.input.clone());
        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with a timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    timeout_secs: u64,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> RenderResult<()> {
        which::which("ffmpeg").map_err(|_| RenderError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let wait = child.wait_with_output();
        let output = match tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            wait,
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout_secs,
                    "FFmpeg timed out, abandoning invocation"
                );
                return Err(RenderError::Timeout(self.timeout_secs));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            Err(RenderError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(tail),
                output.status.code(),
            ))
        }
    }
}

/// Check that FFmpeg is available.
pub fn check_ffmpeg() -> RenderResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| RenderError::FfmpegNotFound)
}

/// Encode a directory of numbered frames into an intermediate clip.
///
/// Intermediate clips use a fast, high-quality setting; the final concat
/// pass applies the job's encoding profile.
pub async fn encode_frames_to_clip(
    frames_dir: &Path,
    fps: u32,
    output: &Path,
) -> RenderResult<()> {
    let pattern = frames_dir.join("frame_%05d.png");
    let cmd = FfmpegCommand::new(pattern.to_string_lossy(), output)
        .framerate(fps)
        .output_args(["-c:v", "libx264", "-preset", "ultrafast", "-crf", "18"])
        .output_arg("-pix_fmt")
        .output_arg("yuv420p");

    FfmpegRunner::new().run(&cmd).await
}

/// Concatenate clips in order and encode with the given profile.
pub async fn concat_clips(
    clips: &[PathBuf],
    output: &Path,
    profile: &EncodingProfile,
) -> RenderResult<()> {
    if clips.is_empty() {
        return Err(RenderError::encoding_failed("no clips to concatenate"));
    }

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list(clips)).await?;

    let cmd = FfmpegCommand::new(list_path.to_string_lossy(), output)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .output_args(profile.to_ffmpeg_args());

    let result = FfmpegRunner::new().run(&cmd).await;
    tokio::fs::remove_file(&list_path).await.ok();

    result.map_err(|e| RenderError::encoding_failed(e.to_string()))?;
    info!(
        clips = clips.len(),
        output = %output.display(),
        "Concatenated and encoded output"
    );
    Ok(())
}

/// Encode clips in fixed-size batches, producing numbered segments.
///
/// Bounds peak resource use for very large scene counts at the cost of one
/// output file per batch.
pub async fn encode_in_batches(
    clips: &[PathBuf],
    output_stem: &Path,
    batch_size: usize,
    profile: &EncodingProfile,
) -> RenderResult<Vec<PathBuf>> {
    let batch_size = batch_size.max(1);
    let mut outputs = Vec::new();

    for (index, batch) in clips.chunks(batch_size).enumerate() {
        let output = segment_path(output_stem, index);
        concat_clips(batch, &output, profile).await?;
        outputs.push(output);
    }

    Ok(outputs)
}

/// Concat-demuxer list file contents.
fn concat_list(clips: &[PathBuf]) -> String {
    let mut list = String::new();
    for clip in clips {
        // Single quotes inside paths must be escaped for the concat demuxer
        let escaped = clip.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{}'\n", escaped));
    }
    list
}

/// Numbered segment path: `{stem}_batch_{index}.mp4`.
fn segment_path(stem: &Path, index: usize) -> PathBuf {
    let file_stem = stem
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{}_batch_{}.mp4", file_stem, index);
    match stem.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
