//! [`Stages`] backed by the real command line tools: yt-dlp for downloads,
//! an `audio-separator` compatible CLI for the UVR model, ffmpeg for the
//! remux.

use super::progress::ProgressScraper;
use super::{MergeInputs, Stages};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use log::debug;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Instrumental on the left channel, original mix on the right.
const KARAOKE_FILTER: &str = "[0:a]pan=mono|c0=c0[left];[1:a]pan=mono|c0=c0[right];[left][right]join=inputs=2:channel_layout=stereo[a]";

/// How much of a failing tool's stderr ends up in the job's error message.
const STDERR_TAIL_LINES: usize = 8;

#[derive(Debug, Clone)]
pub struct ExternalTools {
    yt_dlp: String,
    ffmpeg: String,
    separator: String,
    model: String,
}

impl ExternalTools {
    pub fn new(
        yt_dlp: impl Into<String>,
        ffmpeg: impl Into<String>,
        separator: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            ffmpeg: ffmpeg.into(),
            separator: separator.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.yt_dlp.clone(),
            config.ffmpeg.clone(),
            config.separator.clone(),
            config.model.clone(),
        )
    }

    /// Whether each configured tool can be found.
    pub fn availability(&self) -> BTreeMap<String, bool> {
        [&self.yt_dlp, &self.ffmpeg, &self.separator]
            .into_iter()
            .map(|tool| (tool.clone(), which::which(tool).is_ok()))
            .collect()
    }
}

impl Stages for ExternalTools {
    fn fetch_video_id(&self, url: &str) -> PipelineResult<String> {
        let stdout = run_captured(&self.yt_dlp, &video_id_args(url))?;
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PipelineError::InvalidOutput {
                tool: self.yt_dlp.clone(),
                message: format!("no video id for {}", url),
            })
    }

    fn download_audio(
        &self,
        url: &str,
        output: &Path,
        progress: &mut dyn FnMut(String),
    ) -> PipelineResult<()> {
        download(&self.yt_dlp, &audio_args(url, output), output, progress)
    }

    fn download_video(
        &self,
        url: &str,
        output: &Path,
        progress: &mut dyn FnMut(String),
    ) -> PipelineResult<()> {
        download(&self.yt_dlp, &video_args(url, output), output, progress)
    }

    fn separate(&self, input: &Path, output_dir: &Path) -> PipelineResult<Vec<PathBuf>> {
        run_captured(&self.separator, &separator_args(input, output_dir, &self.model))?;

        let mut stems: Vec<PathBuf> = std::fs::read_dir(output_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        stems.sort();
        if stems.is_empty() {
            return Err(PipelineError::InvalidOutput {
                tool: self.separator.clone(),
                message: format!("no stems written to {}", output_dir.display()),
            });
        }
        Ok(stems)
    }

    fn merge(&self, inputs: &MergeInputs) -> PipelineResult<()> {
        run_captured(&self.ffmpeg, &merge_args(inputs))?;
        Ok(())
    }
}

pub(crate) fn video_id_args(url: &str) -> Vec<OsString> {
    vec!["--get-id".into(), "--no-playlist".into(), url.into()]
}

pub(crate) fn audio_args(url: &str, output: &Path) -> Vec<OsString> {
    vec![
        "-x".into(),
        "--audio-format".into(),
        "wav".into(),
        "--no-playlist".into(),
        "--newline".into(),
        "-o".into(),
        output.into(),
        url.into(),
    ]
}

pub(crate) fn video_args(url: &str, output: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "bestvideo".into(),
        "--no-playlist".into(),
        "--newline".into(),
        "-o".into(),
        output.into(),
        url.into(),
    ]
}

pub(crate) fn separator_args(input: &Path, output_dir: &Path, model: &str) -> Vec<OsString> {
    vec![
        input.into(),
        "--model_filename".into(),
        model.into(),
        "--output_dir".into(),
        output_dir.into(),
        "--output_format".into(),
        "WAV".into(),
    ]
}

pub(crate) fn merge_args(inputs: &MergeInputs) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        inputs.instrumental.clone().into(),
        "-i".into(),
        inputs.original_audio.clone().into(),
        "-i".into(),
        inputs.video.clone().into(),
        "-filter_complex".into(),
        KARAOKE_FILTER.into(),
        "-map".into(),
        "2:v".into(),
        "-map".into(),
        "[a]".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        inputs.output.clone().into(),
    ]
}

/// Runs `tool` to completion and returns its stdout.
fn run_captured(tool: &str, args: &[OsString]) -> PipelineResult<String> {
    debug!("Running {} {:?}", tool, args);
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| PipelineError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(PipelineError::ToolFailed {
            tool: tool.to_string(),
            code: output.status.code(),
            stderr: tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs a yt-dlp download, feeding its stdout through the progress scraper,
/// and checks that `output` was actually written.
fn download(
    tool: &str,
    args: &[OsString],
    output: &Path,
    progress: &mut dyn FnMut(String),
) -> PipelineResult<()> {
    debug!("Running {} {:?}", tool, args);
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| PipelineError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    // Drain stderr on the side so a chatty tool can't block on a full pipe.
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    if let Some(stdout) = child.stdout.take() {
        scrape_progress(BufReader::new(stdout), progress);
    }

    let status = child.wait()?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(PipelineError::ToolFailed {
            tool: tool.to_string(),
            code: status.code(),
            stderr: tail(&stderr, STDERR_TAIL_LINES),
        });
    }
    if !output.is_file() {
        return Err(PipelineError::InvalidOutput {
            tool: tool.to_string(),
            message: format!("{} was not created", output.display()),
        });
    }
    Ok(())
}

/// Feeds every line of `reader` to the progress scraper until EOF. File names
/// in yt-dlp's output need not be UTF-8, so lines are decoded lossily.
fn scrape_progress(mut reader: impl BufRead, progress: &mut dyn FnMut(String)) {
    let mut scraper = ProgressScraper::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(percent) = scraper.feed(&String::from_utf8_lossy(&line)) {
                    progress(percent);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Stopped reading progress: {}", e);
                // Keep the pipe open until the tool exits.
                let _ = io::copy(&mut reader, &mut io::sink());
                break;
            }
        }
    }
}

/// Last `lines` non-empty lines of `text`, joined back with newlines.
fn tail(text: &str, lines: usize) -> String {
    let kept: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join("\n")
}
