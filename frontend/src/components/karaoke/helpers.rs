//! Network helpers for the karaoke page: submitting a URL, polling a job and
//! loading the language pack.

use super::{KaraokeComponent, Msg};
use common::jobs::JobView;
use common::model::locale::LanguagePack;
use common::requests::{ProcessRequest, ProcessResponse};
use gloo_net::http::Request;
use std::cell::Cell;
use std::rc::Rc;
use yew::html::Scope;

/// Delay between two `/status` requests.
const POLL_INTERVAL_MS: u32 = 2000;

pub async fn submit_url(url: String) -> Result<String, String> {
    let request = Request::post("/process")
        .json(&ProcessRequest { url })
        .map_err(|e| e.to_string())?;
    let response = request.send().await.map_err(|e| e.to_string())?;

    if response.ok() {
        response
            .json::<ProcessResponse>()
            .await
            .map(|body| body.job_id)
            .map_err(|e| e.to_string())
    } else {
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["detail"].as_str().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", response.status()));
        Err(detail)
    }
}

/// Polls `/status/{job_id}` until the job is terminal, unknown, or a newer
/// submission bumped `generation`.
pub async fn poll_job(
    link: Scope<KaraokeComponent>,
    job_id: String,
    generation: Rc<Cell<u32>>,
    started: u32,
) {
    loop {
        if generation.get() != started {
            return;
        }
        match Request::get(&format!("/status/{}", job_id)).send().await {
            Ok(resp) if resp.status() == 404 => {
                link.send_message(Msg::JobLost { generation: started });
                return;
            }
            Ok(resp) => match resp.json::<JobView>().await {
                Ok(view) => {
                    let terminal = view.status.is_terminal();
                    link.send_message(Msg::Polled {
                        generation: started,
                        view,
                    });
                    if terminal {
                        return;
                    }
                }
                Err(e) => gloo_console::warn!(format!("Bad status payload: {}", e)),
            },
            // Keep trying; the server may just be busy.
            Err(e) => gloo_console::warn!(format!("Status request failed: {}", e)),
        }
        gloo_timers::future::TimeoutFuture::new(POLL_INTERVAL_MS).await;
    }
}

/// Fetches the pack matching the browser language (the server falls back to
/// its default).
pub async fn load_language_pack(link: Scope<KaraokeComponent>) {
    let lang = web_sys::window()
        .and_then(|window| window.navigator().language())
        .unwrap_or_else(|| "en".to_string());

    match Request::get(&format!("/api/locales/{}", lang)).send().await {
        Ok(resp) if resp.ok() => match resp.json::<LanguagePack>().await {
            Ok(pack) => link.send_message(Msg::SetLanguagePack(pack)),
            Err(e) => gloo_console::warn!(format!("Bad language pack: {}", e)),
        },
        Ok(resp) => gloo_console::warn!(format!("No language pack: HTTP {}", resp.status())),
        Err(e) => gloo_console::warn!(format!("Language pack request failed: {}", e)),
    }
}
