use super::helpers::{poll_job, submit_url};
use super::{KaraokeComponent, Msg};
use yew::platform::spawn_local;
use yew::prelude::*;

pub fn update(component: &mut KaraokeComponent, ctx: &Context<KaraokeComponent>, msg: Msg) -> bool {
    match msg {
        Msg::UpdateUrl(url) => {
            component.url = url;
            true
        }
        Msg::Submit => {
            let url = component.url.trim().to_string();
            if url.is_empty() || component.busy {
                return false;
            }
            component.busy = true;
            component.error = None;
            component.view = None;
            component.job_id = None;

            let link = ctx.link().clone();
            spawn_local(async move {
                match submit_url(url).await {
                    Ok(job_id) => link.send_message(Msg::Submitted(job_id)),
                    Err(err) => link.send_message(Msg::SubmitFailed(err)),
                }
            });
            true
        }
        Msg::Submitted(job_id) => {
            let started = component.poll_generation.get().wrapping_add(1);
            component.poll_generation.set(started);
            component.job_id = Some(job_id.clone());

            let link = ctx.link().clone();
            let generation = component.poll_generation.clone();
            spawn_local(poll_job(link, job_id, generation, started));
            true
        }
        Msg::SubmitFailed(err) => {
            component.busy = false;
            component.error = Some(err);
            true
        }
        Msg::Polled { generation, view } => {
            if generation != component.poll_generation.get() {
                return false;
            }
            if view.status.is_terminal() {
                component.busy = false;
            }
            component.view = Some(view);
            true
        }
        Msg::JobLost { generation } => {
            if generation != component.poll_generation.get() {
                return false;
            }
            component.busy = false;
            component.error = Some(component.t("status.not_found").to_string());
            true
        }
        Msg::SetLanguagePack(pack) => {
            component.pack = pack;
            true
        }
    }
}
