//! Server configuration, parsed from CLI flags with environment fallbacks.
//!
//! ```bash
//! karaoke_server --port 8080 --storage-dir /srv/songs
//! KARAOKE_PORT=8080 KARAOKE_SEPARATOR=/opt/uvr/bin/audio-separator karaoke_server
//! ```

use clap::Parser;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "karaoke_server")]
#[command(about = "Turns a YouTube link into a karaoke video")]
#[command(version)]
pub struct Config {
    /// Host/IP to bind
    #[arg(long, default_value = "0.0.0.0", env = "KARAOKE_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "KARAOKE_PORT")]
    pub port: u16,

    /// Where finished videos and stems are published (served under /songs)
    #[arg(long, default_value = "songs", env = "KARAOKE_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// Scratch space for downloads and raw separator output
    #[arg(long, default_value = "tmp", env = "KARAOKE_TMP_DIR")]
    pub tmp_dir: PathBuf,

    /// Directory of `<lang>.json` language packs
    #[arg(long, default_value = "locales", env = "KARAOKE_LOCALES_DIR")]
    pub locales_dir: PathBuf,

    /// Language pack used when a requested one is missing
    #[arg(long, default_value = "en", env = "KARAOKE_DEFAULT_LOCALE")]
    pub default_locale: String,

    /// Separation model file handed to the separator
    #[arg(long, default_value = "UVR-MDX-NET-Inst_HQ_3.onnx", env = "KARAOKE_MODEL")]
    pub model: String,

    #[arg(long = "yt-dlp", default_value = "yt-dlp", env = "KARAOKE_YT_DLP")]
    pub yt_dlp: String,

    #[arg(long, default_value = "ffmpeg", env = "KARAOKE_FFMPEG")]
    pub ffmpeg: String,

    #[arg(long, default_value = "audio-separator", env = "KARAOKE_SEPARATOR")]
    pub separator: String,

    /// Base URL used in result links instead of the request's host
    #[arg(long, env = "KARAOKE_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Open the UI in the default browser once the server is up
    #[arg(long, env = "KARAOKE_OPEN_BROWSER")]
    pub open_browser: bool,
}

impl Config {
    /// Creates the storage and temp directories if they are missing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.storage_dir)?;
        std::fs::create_dir_all(&self.tmp_dir)?;
        Ok(())
    }

    /// URL the browser should open; a wildcard bind is shown as localhost.
    pub fn local_url(&self) -> String {
        let host = if self.host == "0.0.0.0" { "127.0.0.1" } else { &self.host };
        format!("http://{}:{}", host, self.port)
    }
}
