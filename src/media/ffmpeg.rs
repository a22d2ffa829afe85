use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::audio::mix::write_f32le_file;
use crate::audio::pcm::AudioPcm;
use crate::config::FfmpegConfig;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{EngineError, EngineResult};
use crate::media::buffer::{AudioFormat, MediaBuffer, MediaInfo};
use crate::media::codec::{FrameSink, FrameSource, MediaCodec, SinkConfig, VideoRequest, Window};
use crate::render::frame::FrameRGBA;

/// Codec backed by the system `ffmpeg`/`ffprobe` binaries (H.264/AAC in MP4).
///
/// Buffers are staged through temporary files because `ffmpeg` needs seekable MP4 input and output.
#[derive(Clone, Debug)]
pub struct FfmpegCodec {
    cfg: FfmpegConfig,
}

impl FfmpegCodec {
    /// Create a codec using the given binaries and encoder settings.
    pub fn new(cfg: FfmpegConfig) -> Self {
        Self { cfg }
    }

    fn probe_path(&self, path: &Path) -> EngineResult<MediaInfo> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
            nb_frames: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u16>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        let out = Command::new(&self.cfg.probe_binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| EngineError::decode(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(EngineError::decode(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| EngineError::decode(format!("ffprobe json parse failed: {e}")))?;
        let duration_secs = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_ref())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let audio = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
            .and_then(|s| {
                let sample_rate = s.sample_rate.as_deref()?.parse::<u32>().ok()?;
                let channels = s.channels.filter(|&c| c > 0)?;
                Some(AudioFormat {
                    sample_rate,
                    channels,
                })
            });

        let Some(video) = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
        else {
            return Ok(MediaInfo {
                width: 0,
                height: 0,
                has_video: false,
                fps: None,
                frame_count: 0,
                duration_secs,
                audio,
            });
        };

        let width = video
            .width
            .ok_or_else(|| EngineError::decode("missing video width from ffprobe"))?;
        let height = video
            .height
            .ok_or_else(|| EngineError::decode("missing video height from ffprobe"))?;
        let (num, den) = parse_ff_ratio(video.r_frame_rate.as_deref().unwrap_or("0/1"))
            .ok_or_else(|| EngineError::decode("invalid video r_frame_rate"))?;
        let fps = Fps::new(num, den).map_err(|_| EngineError::decode("video fps is zero"))?;
        let frame_count = video
            .nb_frames
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| fps.secs_to_frames_round(duration_secs));

        Ok(MediaInfo {
            width,
            height,
            has_video: true,
            fps: Some(fps),
            frame_count,
            duration_secs: if frame_count > 0 {
                fps.frames_to_secs(frame_count)
            } else {
                duration_secs
            },
            audio,
        })
    }
}

impl MediaCodec for FfmpegCodec {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn mime_type(&self) -> &'static str {
        "video/mp4"
    }

    fn probe(&self, buf: &MediaBuffer) -> EngineResult<MediaInfo> {
        let input = TempFile::with_bytes("probe", "bin", buf.as_bytes())?;
        self.probe_path(&input.path)
    }

    fn open_video<'a>(
        &'a self,
        buf: &'a MediaBuffer,
        req: VideoRequest,
    ) -> EngineResult<Box<dyn FrameSource + 'a>> {
        let input = TempFile::with_bytes("decode", "bin", buf.as_bytes())?;
        let info = self.probe_path(&input.path)?;
        if !info.has_video {
            return Err(EngineError::decode("container has no video track"));
        }
        let count = match req.window {
            Some(w) => w.frame_count(req.fps),
            None if info.fps == Some(req.fps) => info.frame_count,
            None => req.fps.secs_to_frames_round(info.duration_secs),
        };

        let mut cmd = Command::new(&self.cfg.binary);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args(["-v", "error"]);
        push_window_args(&mut cmd, req.window);
        cmd.arg("-i").arg(&input.path).args([
            "-an",
            "-vf",
            &format!("fps={}/{}", req.fps.num, req.fps.den),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ]);

        let mut child = cmd
            .spawn()
            .map_err(|e| EngineError::decode(format!("failed to run ffmpeg for video decode: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::decode("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr_drain = drain_stderr(&mut child)?;

        Ok(Box::new(FfmpegFrameSource {
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            _input: input,
            width: info.width,
            height: info.height,
            count,
            emitted: 0,
            last: None,
        }))
    }

    fn decode_audio(
        &self,
        buf: &MediaBuffer,
        window: Option<Window>,
    ) -> EngineResult<Option<AudioPcm>> {
        let input = TempFile::with_bytes("audio", "bin", buf.as_bytes())?;
        let Some(format) = self.probe_path(&input.path)?.audio else {
            return Ok(None);
        };

        let mut cmd = Command::new(&self.cfg.binary);
        cmd.args(["-v", "error"]);
        push_window_args(&mut cmd, window);
        cmd.arg("-i").arg(&input.path).args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &format.channels.to_string(),
            "-ar",
            &format.sample_rate.to_string(),
            "pipe:1",
        ]);
        let out = cmd
            .output()
            .map_err(|e| EngineError::decode(format!("failed to run ffmpeg for audio decode: {e}")))?;
        if !out.status.success() {
            return Err(EngineError::decode(format!(
                "ffmpeg audio decode failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        AudioPcm::from_f32le_bytes(format, &out.stdout).map(Some)
    }

    fn sink(&self) -> EngineResult<Box<dyn FrameSink + '_>> {
        Ok(Box::new(FfmpegSink::new(&self.cfg)))
    }
}

fn push_window_args(cmd: &mut Command, window: Option<Window>) {
    if let Some(w) = window {
        cmd.args([
            "-ss",
            &format!("{:.6}", w.start),
            "-t",
            &format!("{:.6}", w.duration),
        ]);
    }
}

fn drain_stderr(child: &mut Child) -> EngineResult<JoinHandle<std::io::Result<Vec<u8>>>> {
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| EngineError::decode("failed to open ffmpeg stderr (unexpected)"))?;
    Ok(std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    }))
}

fn join_stderr(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .and_then(|r| r.ok())
        .map(|b| String::from_utf8_lossy(&b).trim().to_string())
        .unwrap_or_default()
}

/// Streams `rgba` frames from an `ffmpeg` child, padding with the last frame up to `count`.
struct FfmpegFrameSource {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    _input: TempFile,
    width: u32,
    height: u32,
    count: u64,
    emitted: u64,
    last: Option<Vec<u8>>,
}

impl FfmpegFrameSource {
    fn finish(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self) -> u64 {
        self.count
    }

    fn next_frame(&mut self) -> EngineResult<Option<FrameRGBA>> {
        if self.emitted >= self.count {
            self.finish();
            return Ok(None);
        }

        let len = (self.width as usize) * (self.height as usize) * 4;
        let mut data = vec![0u8; len];
        let read = match self.stdout.as_mut() {
            Some(stdout) => match stdout.read_exact(&mut data) {
                Ok(()) => true,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
                Err(e) => {
                    return Err(EngineError::decode(format!(
                        "failed to read decoded frame from ffmpeg: {e}"
                    )));
                }
            },
            None => false,
        };

        if read {
            self.last = Some(data.clone());
        } else {
            // Stream ended early; the window is held on its last frame.
            self.finish();
            match &self.last {
                Some(last) => data.copy_from_slice(last),
                None => {
                    return Err(EngineError::decode(format!(
                        "ffmpeg returned no video frames: {}",
                        join_stderr(self.stderr_drain.take())
                    )));
                }
            }
        }

        self.emitted += 1;
        Ok(Some(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: true,
        }))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
struct FfmpegSink<'a> {
    cfg: &'a FfmpegConfig,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    output: Option<TempFile>,
    audio_input: Option<TempFile>,

    scratch: Vec<u8>,
    sink_cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl<'a> FfmpegSink<'a> {
    fn new(cfg: &'a FfmpegConfig) -> Self {
        Self {
            cfg,
            child: None,
            stdin: None,
            stderr_drain: None,
            output: None,
            audio_input: None,
            scratch: Vec::new(),
            sink_cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink<'_> {
    fn begin(&mut self, cfg: SinkConfig) -> EngineResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(EngineError::encode(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(EngineError::encode(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        let output = TempFile::reserve("encode", "mp4");
        let mut cmd = Command::new(&self.cfg.binary);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: premultiplied RGBA8 flattened to opaque in push_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        let crf = self.cfg.crf.to_string();
        let video_args = [
            "-c:v",
            "libx264",
            "-preset",
            self.cfg.preset.as_str(),
            "-crf",
            crf.as_str(),
            "-pix_fmt",
            "yuv420p",
        ];

        let audio_input = match cfg.audio.as_ref() {
            Some(audio) if audio.channels > 0 && audio.sample_rate > 0 => {
                let file = TempFile::reserve("audio", "f32le");
                write_f32le_file(audio, &file.path)?;
                cmd.args([
                    "-f",
                    "f32le",
                    "-ar",
                    &audio.sample_rate.to_string(),
                    "-ac",
                    &audio.channels.to_string(),
                    "-i",
                ])
                .arg(&file.path)
                .args(video_args)
                .args([
                    "-c:a",
                    "aac",
                    "-b:a",
                    self.cfg.audio_bitrate.as_str(),
                    "-shortest",
                ]);
                Some(file)
            }
            _ => {
                cmd.arg("-an").args(video_args);
                None
            }
        };
        cmd.args(["-movflags", "+faststart", "-f", "mp4"])
            .arg(&output.path);

        let mut child = cmd.spawn().map_err(|e| {
            EngineError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stderr_drain = drain_stderr(&mut child)
            .map_err(|_| EngineError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.output = Some(output);
        self.audio_input = audio_input;
        self.sink_cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> EngineResult<()> {
        let cfg = self
            .sink_cfg
            .as_ref()
            .ok_or_else(|| EngineError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(EngineError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(EngineError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(EngineError::encode(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_to_opaque_black(&mut self.scratch, &frame.data);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EngineError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            EngineError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> EngineResult<MediaBuffer> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| EngineError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            EngineError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = join_stderr(self.stderr_drain.take());
        self.audio_input = None;
        self.sink_cfg = None;

        if !status.success() {
            return Err(EngineError::encode(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let output = self
            .output
            .take()
            .ok_or_else(|| EngineError::encode("ffmpeg sink has no output file"))?;
        let bytes = std::fs::read(&output.path).map_err(|e| {
            EngineError::encode(format!(
                "failed to read encoded output '{}': {e}",
                output.path.display()
            ))
        })?;
        Ok(MediaBuffer::new(bytes))
    }
}

impl Drop for FfmpegSink<'_> {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Composite premultiplied RGBA8 over opaque black.
fn flatten_premul_to_opaque_black(dst: &mut [u8], src_premul: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

/// Temporary file removed on drop.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn reserve(tag: &str, ext: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = TEMP_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "wavyte_reel_{tag}_{}_{nanos}_{seq}.{ext}",
            std::process::id()
        ));
        Self { path }
    }

    fn with_bytes(tag: &str, ext: &str, bytes: &[u8]) -> EngineResult<Self> {
        let file = Self::reserve(tag, ext);
        std::fs::write(&file.path, bytes).map_err(|e| {
            EngineError::decode(format!(
                "failed to stage media in '{}': {e}",
                file.path.display()
            ))
        })?;
        Ok(file)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

static TEMP_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Return `true` when `binary -version` runs successfully.
pub fn is_tool_on_path(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
