//! Codec engine capability interface and its ffmpeg subprocess implementation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use crate::discovery::parse_encoder_listing;
use crate::error::{CodecError, Result};
use crate::metadata::{StreamInfo, parse_probe_json};
use crate::pixel::RawPixelFormat;

/// Shape of the raw stream handed to the engine for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVideoInput {
    pub width: usize,
    pub height: usize,
    pub frame_rate: u32,
    pub pixel_format: RawPixelFormat,
}

/// What the bridge needs from a video engine. Paths are owned by the caller.
pub trait CodecEngine: Send + Sync {
    /// Encoder identifiers available for `family` (e.g. "hevc").
    fn list_encoders(&self, family: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Stream metadata of the compressed file at `path`.
    fn probe(&self, path: &Path) -> impl Future<Output = Result<StreamInfo>> + Send;

    /// Decodes the file at `path` into headerless `format` frames.
    fn transcode_to_raw(
        &self,
        path: &Path,
        format: RawPixelFormat,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Encodes `raw` frames with `codec_id` into a container file at `output`.
    fn transcode_to_container(
        &self,
        raw: &[u8],
        input: &RawVideoInput,
        codec_id: &str,
        output: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct FfmpegSettings {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// None waits for the engine indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            timeout: None,
        }
    }
}

/// Runs the ffmpeg and ffprobe executables.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    settings: FfmpegSettings,
}

impl FfmpegEngine {
    pub fn new(settings: FfmpegSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FfmpegSettings {
        &self.settings
    }

    /// Runs `cmd` to completion, feeding it `input` on stdin when given. The child
    /// is killed if the timeout elapses or the future is dropped.
    async fn run(&self, mut cmd: Command, input: Option<&[u8]>) -> Result<Output> {
        let program = program_name(&cmd);
        log::debug!("running {:?}", cmd.as_std());

        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| CodecError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let feed = async move {
            match (stdin, input) {
                (Some(mut stdin), Some(data)) => {
                    stdin.write_all(data).await?;
                    stdin.shutdown().await
                }
                _ => Ok::<(), std::io::Error>(()),
            }
        };
        let session = async { tokio::join!(feed, child.wait_with_output()) };

        let (fed, output) = match self.settings.timeout {
            Some(timeout) => tokio::time::timeout(timeout, session)
                .await
                .map_err(|_| CodecError::Timeout {
                    program: program.clone(),
                    timeout,
                })?,
            None => session.await,
        };
        let output = output?;

        if !output.status.success() {
            return Err(CodecError::Subprocess {
                program,
                status: output.status.to_string(),
                diagnostics: diagnostics(&output),
            });
        }
        // a broken pipe only matters if the engine claims success
        fed?;
        Ok(output)
    }
}

impl CodecEngine for FfmpegEngine {
    async fn list_encoders(&self, family: &str) -> Result<Vec<String>> {
        let mut cmd = Command::new(&self.settings.ffmpeg);
        cmd.args(["-hide_banner", "-codecs"]);
        let output = self.run(cmd, None).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(parse_encoder_listing(&listing, family))
    }

    async fn probe(&self, path: &Path) -> Result<StreamInfo> {
        let mut cmd = Command::new(&self.settings.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=index,codec_name,width,height,pix_fmt,r_frame_rate,nb_frames",
            "-of",
            "json",
        ])
        .arg(path);
        let output = self.run(cmd, None).await?;
        parse_probe_json(path, &output.stdout)
    }

    async fn transcode_to_raw(&self, path: &Path, format: RawPixelFormat) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.settings.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-v", "error", "-i"])
            .arg(path)
            .args([
                "-c:v",
                "rawvideo",
                "-pix_fmt",
                format.ffmpeg_name(),
                "-f",
                "rawvideo",
                "pipe:1",
            ]);
        let output = self.run(cmd, None).await?;
        if output.stdout.is_empty() {
            return Err(CodecError::NoOutput {
                program: program_name_of(&self.settings.ffmpeg),
                diagnostics: diagnostics(&output),
            });
        }
        Ok(output.stdout)
    }

    async fn transcode_to_container(
        &self,
        raw: &[u8],
        input: &RawVideoInput,
        codec_id: &str,
        output: &Path,
    ) -> Result<()> {
        let size = format!("{}x{}", input.width, input.height);
        let rate = input.frame_rate.to_string();
        let mut cmd = Command::new(&self.settings.ffmpeg);
        cmd.args([
            "-hide_banner",
            "-v",
            "error",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            input.pixel_format.ffmpeg_name(),
            "-s",
            &size,
            "-r",
            &rate,
            "-i",
            "pipe:0",
            "-c:v",
            codec_id,
            "-pix_fmt",
            input.pixel_format.ffmpeg_name(),
        ])
        .arg(output);
        self.run(cmd, Some(raw)).await?;
        Ok(())
    }
}

fn program_name(cmd: &Command) -> String {
    program_name_of(Path::new(cmd.as_std().get_program()))
}

fn program_name_of(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

/// Last lines of stderr, which is where ffmpeg explains a failure.
fn diagnostics(output: &Output) -> String {
    const KEEP_LINES: usize = 8;
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(KEEP_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_engine() -> FfmpegEngine {
        FfmpegEngine::new(FfmpegSettings {
            ffmpeg: PathBuf::from("/nonexistent/h5j/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/h5j/ffprobe"),
            timeout: Some(Duration::from_secs(5)),
        })
    }

    #[tokio::test]
    async fn test_missing_engine_is_spawn_error() {
        let engine = missing_engine();
        match engine.list_encoders("hevc").await {
            Err(CodecError::Spawn { program, .. }) => assert_eq!(program, "ffmpeg"),
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_command_reports_diagnostics() {
        let engine = FfmpegEngine::default();
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo 'Unknown encoder libfoo' >&2; exit 3"]);
        match engine.run(cmd, None).await {
            Err(CodecError::Subprocess {
                program,
                diagnostics,
                ..
            }) => {
                assert_eq!(program, "sh");
                assert!(diagnostics.contains("Unknown encoder libfoo"));
            }
            other => panic!("expected subprocess error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_is_fed_to_child() {
        let engine = FfmpegEngine::default();
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "wc -c"]);
        let output = engine.run(cmd, Some(&[0u8; 1000])).await.unwrap();
        let count = String::from_utf8_lossy(&output.stdout);
        assert_eq!(count.trim(), "1000");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_engine_times_out() {
        let engine = FfmpegEngine::new(FfmpegSettings {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 10"]);
        let err = engine.run(cmd, None).await.unwrap_err();
        assert!(matches!(err, CodecError::Timeout { .. }));
    }
}
