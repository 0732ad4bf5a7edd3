//! FFmpeg-backed frame writer
//!
//! Raw BGR24 frames are piped to an `ffmpeg` child process which encodes
//! them into an MP4 container.

use crate::capture::Frame;
use crate::encoder::types::{EncoderBackend, EncoderRequest, FrameWriter, VideoSize};
use crate::utils::error::{RecorderError, RecorderResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Once};
use std::thread::JoinHandle;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// Opens [`FfmpegWriter`]s using a given ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl EncoderBackend for FfmpegBackend {
    fn open(&self, request: &EncoderRequest) -> RecorderResult<Box<dyn FrameWriter>> {
        Ok(Box::new(FfmpegWriter::spawn(&self.binary, request)?))
    }
}

/// Format a frame rate the way ffmpeg accepts it on the command line
fn format_fps(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as u64)
    } else {
        format!("{:.3}", fps)
    }
}

/// Build the ffmpeg command line for a recording
pub fn build_encoder_args(request: &EncoderRequest) -> RecorderResult<Vec<String>> {
    let codec = request.fourcc.ffmpeg_codec().ok_or_else(|| {
        RecorderError::Encoder(format!("unsupported fourcc {}", request.fourcc))
    })?;

    if !(request.fps.is_finite() && request.fps > 0.0) {
        return Err(RecorderError::Encoder(format!(
            "invalid frame rate {}",
            request.fps
        )));
    }

    let VideoSize { width, height } = request.size;
    if width == 0 || height == 0 {
        return Err(RecorderError::Encoder(format!(
            "invalid recording size {}",
            request.size
        )));
    }

    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "warning".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "bgr24".to_string(),
        "-s".to_string(),
        request.size.to_string(),
        "-r".to_string(),
        format_fps(request.fps),
        "-i".to_string(),
        "-".to_string(), // stdin for video frames
        "-c:v".to_string(),
        codec.to_string(),
    ];

    match codec {
        "mpeg4" => {
            args.extend([
                "-q:v".to_string(),
                "3".to_string(),
                "-tag:v".to_string(),
                request.fourcc.to_string().to_ascii_lowercase(),
            ]);
        }
        "libx264" | "libx265" => {
            args.extend([
                "-preset".to_string(),
                "veryfast".to_string(),
                "-crf".to_string(),
                "18".to_string(),
            ]);
        }
        _ => {}
    }

    args.extend([
        "-pix_fmt".to_string(),
        if codec == "mjpeg" { "yuvj420p" } else { "yuv420p" }.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        request.path.to_string_lossy().to_string(),
    ]);

    Ok(args)
}

/// Ignore SIGPIPE for the whole process.
///
/// A write to an ffmpeg that has already exited must come back as an
/// `EPIPE` error instead of killing the host that loaded this library.
fn ignore_sigpipe() {
    static IGNORE: Once = Once::new();
    IGNORE.call_once(|| {
        #[cfg(unix)]
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_IGN);
        };
    });
}

/// Bounded ring of the most recent stderr lines
#[derive(Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    fn push(&mut self, line: String) {
        if self.lines.len() == STDERR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn joined(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// A running ffmpeg process consuming raw frames on stdin
pub struct FfmpegWriter {
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    size: VideoSize,
    frame_count: u64,
    stderr_tail: Arc<Mutex<StderrTail>>,
    drain: Option<JoinHandle<()>>,
}

impl FfmpegWriter {
    /// Start ffmpeg for the given request
    pub fn spawn(binary: &std::path::Path, request: &EncoderRequest) -> RecorderResult<Self> {
        let args = build_encoder_args(request)?;
        ignore_sigpipe();

        tracing::debug!("Starting FFmpeg encoder: {:?}", args);

        let mut process = Command::new(binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecorderError::Encoder(format!("Failed to start FFmpeg encoder: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| RecorderError::Encoder("Failed to capture FFmpeg stdin".to_string()))?;

        // ffmpeg blocks once its stderr pipe fills, so drain it continuously
        let stderr_tail = Arc::new(Mutex::new(StderrTail::default()));
        let drain = process.stderr.take().map(|stderr| {
            let tail = Arc::clone(&stderr_tail);
            std::thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::debug!(target: "ffmpeg", "{}", line);
                    tail.lock().push(line);
                }
            })
        });

        tracing::info!(
            "Opened encoder {} {} @ {}fps -> {:?}",
            request.fourcc,
            request.size,
            format_fps(request.fps),
            request.path
        );

        Ok(Self {
            process: Some(process),
            stdin: Some(stdin),
            size: request.size,
            frame_count: 0,
            stderr_tail,
            drain,
        })
    }

    fn stderr_summary(&self) -> String {
        self.stderr_tail.lock().joined()
    }
}

impl FrameWriter for FfmpegWriter {
    fn write_frame(&mut self, frame: &Frame) -> RecorderResult<()> {
        frame.ensure_size(self.size.width, self.size.height)?;

        if self.stdin.is_none() {
            return Err(RecorderError::Encoder("encoder already closed".to_string()));
        }

        // ffmpeg quits early on a bad output path or codec; stop feeding it
        if let Some(process) = self.process.as_mut() {
            if let Ok(Some(status)) = process.try_wait() {
                self.stdin = None;
                return Err(RecorderError::Encoder(format!(
                    "FFmpeg exited with {} before frame {}: {}",
                    status,
                    self.frame_count + 1,
                    self.stderr_summary()
                )));
            }
        }

        let written = match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(frame.data()),
            None => return Err(RecorderError::Encoder("encoder already closed".to_string())),
        };
        if let Err(e) = written {
            self.stdin = None;
            return Err(RecorderError::Encoder(format!(
                "Failed to write frame: {} {}",
                e,
                self.stderr_summary()
            )));
        }
        self.frame_count += 1;
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.stdin.is_some()
    }

    fn frames_written(&self) -> u64 {
        self.frame_count
    }

    fn finish(mut self: Box<Self>) -> RecorderResult<()> {
        // Close stdin to signal EOF to FFmpeg
        drop(self.stdin.take());

        let status = match self.process.take() {
            Some(mut process) => process
                .wait()
                .map_err(|e| RecorderError::Encoder(format!("Failed to wait for FFmpeg: {}", e)))?,
            None => return Ok(()),
        };

        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }

        if !status.success() {
            return Err(RecorderError::Encoder(format!(
                "FFmpeg exited with {}: {}",
                status,
                self.stderr_summary()
            )));
        }

        tracing::info!("Encoder finished after {} frames", self.frame_count);
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        // Only reached without finish(); the output file is abandoned
        if let Some(mut process) = self.process.take() {
            drop(self.stdin.take());
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}
