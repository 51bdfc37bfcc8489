use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug)]
/// Request payload for `POST /process`.
/// Carries the YouTube (or any yt-dlp supported) URL to turn into karaoke.
pub struct ProcessRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
/// Response of `POST /process`, the id to poll `/status/{job_id}` with.
pub struct ProcessResponse {
    pub job_id: String,
}
