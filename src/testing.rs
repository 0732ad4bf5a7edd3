//! In-memory host, encoder, and UI used by the unit tests

use crate::capture::{Frame, MediaHost};
use crate::encoder::{EncoderBackend, EncoderRequest, FrameWriter};
use crate::host::{ConsoleHost, PanelUi, PreloadHost};
use crate::utils::error::{RecorderError, RecorderResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host double recording every call
#[derive(Debug)]
pub struct FakeHost {
    pub devices: Vec<String>,
    pub invalid_devices: HashSet<String>,
    pub references: HashMap<String, i32>,
    pub reference_log: Vec<(String, bool)>,
    pub fps: f64,
    pub preload: HashMap<i32, Option<PathBuf>>,
    pub preload_log: Vec<(i32, Option<PathBuf>)>,
    pub console: Vec<String>,
    pub unloaded: Vec<PathBuf>,
    pub unload_succeeds: bool,
    pub sample_requests: Vec<(String, u32, u32)>,
    /// Return samples of this size instead of the requested one
    pub sample_size_override: Option<(u32, u32)>,
}

impl FakeHost {
    pub fn with_devices(names: &[&str]) -> Self {
        Self {
            devices: names.iter().map(|n| n.to_string()).collect(),
            invalid_devices: HashSet::new(),
            references: HashMap::new(),
            reference_log: Vec::new(),
            fps: 25.0,
            preload: HashMap::new(),
            preload_log: Vec::new(),
            console: Vec::new(),
            unloaded: Vec::new(),
            unload_succeeds: true,
            sample_requests: Vec::new(),
            sample_size_override: None,
        }
    }

    pub fn reference_count(&self, name: &str) -> i32 {
        self.references.get(name).copied().unwrap_or(0)
    }

    pub fn console_contains(&self, needle: &str) -> bool {
        self.console.iter().any(|line| line.contains(needle))
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::with_devices(&["Program Out", "Camera 1", "Camera 2"])
    }
}

impl MediaHost for FakeHost {
    fn capture_device_names(&self) -> Vec<String> {
        self.devices.clone()
    }

    fn is_valid_device(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d == name) && !self.invalid_devices.contains(name)
    }

    fn reference_device(&mut self, name: &str, active: bool) {
        *self.references.entry(name.to_string()).or_insert(0) += if active { 1 } else { -1 };
        self.reference_log.push((name.to_string(), active));
    }

    fn image_sample(&mut self, name: &str, width: u32, height: u32) -> Option<Frame> {
        self.sample_requests.push((name.to_string(), width, height));
        let (width, height) = self.sample_size_override.unwrap_or((width, height));
        // Row y holds value (height - 1 - y): bottom-up, so flipping yields 0, 1, 2, ...
        let mut frame = Frame::black(width, height);
        for y in 0..height {
            frame.row_mut(y).fill((height - 1 - y) as u8);
        }
        Some(frame)
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn unload_media(&mut self, path: &Path) -> bool {
        self.unloaded.push(path.to_path_buf());
        self.unload_succeeds
    }
}

impl PreloadHost for FakeHost {
    fn set_preload_media(&mut self, index: i32, media: Option<&Path>) {
        let media = media.map(Path::to_path_buf);
        self.preload.insert(index, media.clone());
        self.preload_log.push((index, media));
    }
}

impl ConsoleHost for FakeHost {
    fn print_console(&mut self, message: &str) {
        self.console.push(message.to_string());
    }
}

/// What the fake encoder saw
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub opened: Vec<EncoderRequest>,
    /// First row byte of every written frame
    pub frame_markers: Vec<Vec<u8>>,
    pub finished: usize,
    pub fail_open: bool,
    /// Fail the next write and close the writer, like a dead ffmpeg pipe
    pub fail_write: bool,
    pub fail_finish: bool,
}

/// Encoder double writing frame bytes to the requested path
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub log: Arc<Mutex<EncoderLog>>,
}

impl EncoderBackend for FakeBackend {
    fn open(&self, request: &EncoderRequest) -> RecorderResult<Box<dyn FrameWriter>> {
        let mut log = self.log.lock();
        if log.fail_open {
            return Err(RecorderError::Encoder("open refused".to_string()));
        }
        let file = File::create(&request.path)?;
        log.opened.push(request.clone());
        Ok(Box::new(FakeWriter {
            file: Some(file),
            frames: 0,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeWriter {
    file: Option<File>,
    frames: u64,
    log: Arc<Mutex<EncoderLog>>,
}

impl FrameWriter for FakeWriter {
    fn write_frame(&mut self, frame: &Frame) -> RecorderResult<()> {
        if self.file.is_some() && self.log.lock().fail_write {
            self.file = None;
            return Err(RecorderError::Encoder("broken pipe".to_string()));
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| RecorderError::Encoder("closed".to_string()))?;
        file.write_all(frame.data())?;
        let stride = frame.stride();
        let markers = frame.data().chunks(stride.max(1)).map(|row| row[0]).collect();
        self.log.lock().frame_markers.push(markers);
        self.frames += 1;
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.file.is_some()
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }

    fn finish(mut self: Box<Self>) -> RecorderResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        let mut log = self.log.lock();
        log.finished += 1;
        if log.fail_finish {
            return Err(RecorderError::Encoder("finish failed".to_string()));
        }
        Ok(())
    }
}

/// UI double: draws nothing, records widget calls, returns scripted edits
#[derive(Debug, Default)]
pub struct ScriptedUi {
    pub drawn: Vec<String>,
    pub combo: Option<usize>,
    pub drag_int: Option<i32>,
    pub drag_int2: Option<[i32; 2]>,
    pub checkbox: Option<bool>,
    pub radio_click: Option<&'static str>,
    pub input_text: Option<String>,
}

impl PanelUi for ScriptedUi {
    fn text_unformatted(&mut self, text: &str) {
        self.drawn.push(format!("text:{}", text));
    }

    fn combo(&mut self, label: &str, current: usize, _items: &[String]) -> (bool, usize) {
        self.drawn.push(format!("combo:{}={}", label, current));
        match self.combo.take() {
            Some(selected) => (true, selected),
            None => (false, current),
        }
    }

    fn drag_int(&mut self, label: &str, value: i32, _speed: f32, _min: i32, _max: i32) -> (bool, i32) {
        self.drawn.push(format!("drag_int:{}={}", label, value));
        match self.drag_int.take() {
            Some(v) => (true, v),
            None => (false, value),
        }
    }

    fn drag_int2(&mut self, label: &str, value: [i32; 2]) -> (bool, [i32; 2]) {
        self.drawn.push(format!("drag_int2:{}={}x{}", label, value[0], value[1]));
        match self.drag_int2.take() {
            Some(v) => (true, v),
            None => (false, value),
        }
    }

    fn checkbox(&mut self, label: &str, value: bool) -> (bool, bool) {
        self.drawn.push(format!("checkbox:{}={}", label, value));
        match self.checkbox.take() {
            Some(v) => (true, v),
            None => (false, value),
        }
    }

    fn radio_button(&mut self, label: &str, active: bool) -> bool {
        self.drawn.push(format!("radio:{}={}", label, active));
        self.radio_click == Some(label)
    }

    fn input_text(&mut self, label: &str, value: &str, _max_len: usize) -> (bool, String) {
        self.drawn.push(format!("input_text:{}={}", label, value));
        match self.input_text.take() {
            Some(v) => (true, v),
            None => (false, value.to_string()),
        }
    }
}
