use super::{KaraokeComponent, Msg};
use common::jobs::{keys, JobStatus};
use web_sys::HtmlInputElement;
use yew::prelude::*;

pub fn view(component: &KaraokeComponent, ctx: &Context<KaraokeComponent>) -> Html {
    let link = ctx.link();

    html! {
        <div class="karaoke">
            <h1>{ component.t("app.title") }</h1>
            <div class="karaoke-form">
                <input
                    type="url"
                    placeholder={component.t("form.placeholder").to_string()}
                    value={component.url.clone()}
                    disabled={component.busy}
                    oninput={link.callback(|e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        Msg::UpdateUrl(input.value())
                    })}
                    onkeydown={link.batch_callback(|e: KeyboardEvent| {
                        (e.key() == "Enter").then_some(Msg::Submit)
                    })}
                />
                <button disabled={component.busy} onclick={link.callback(|_| Msg::Submit)}>
                    { component.t("form.submit") }
                </button>
            </div>
            { status_box(component) }
            { results(component) }
        </div>
    }
}

fn status_box(component: &KaraokeComponent) -> Html {
    if let Some(error) = &component.error {
        return html! { <div class="status-box error">{ error.clone() }</div> };
    }
    let Some(view) = &component.view else {
        return html! {};
    };

    let label = component.t(status_key(view.status)).to_string();
    let class = if view.status == JobStatus::Error {
        "status-box error"
    } else {
        "status-box"
    };

    html! {
        <div class={class}>
            <div>{ format!("{}: {}", component.t("status.label"), label) }</div>
            if let Some(position) = view.position {
                <div>{ format!("{}: {}", component.t("status.position"), position) }</div>
            }
            if let Some(progress) = view.data.get(keys::PROGRESS) {
                <div>{ format!("{}: {}", component.t("status.progress"), progress) }</div>
            }
            if let Some(message) = view.data.get(keys::MESSAGE) {
                <div>{ message.clone() }</div>
            }
        </div>
    }
}

fn results(component: &KaraokeComponent) -> Html {
    let Some(view) = component.view.as_ref().filter(|v| v.status == JobStatus::Complete) else {
        return html! {};
    };
    let url_of = |key: &str| view.data.get(key).cloned().unwrap_or_default();

    html! {
        <div class="results">
            <video controls=true src={url_of(keys::VIDEO)} />
            <p><a href={url_of(keys::VIDEO)} download="">{ component.t("result.download") }</a></p>
            { stem(component.t("result.instrumental"), url_of(keys::INSTRUMENTAL)) }
            { stem(component.t("result.vocals"), url_of(keys::VOCALS)) }
        </div>
    }
}

fn stem(title: &str, src: String) -> Html {
    html! {
        <div class="stem">
            <div>{ title.to_string() }</div>
            <audio controls=true src={src} />
        </div>
    }
}

fn status_key(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Waiting => "status.waiting",
        JobStatus::Processing => "status.processing",
        JobStatus::FetchingInfo => "status.fetching_info",
        JobStatus::DownloadingAudio => "status.downloading_audio",
        JobStatus::DownloadingVideo => "status.downloading_video",
        JobStatus::AiSeparation => "status.ai_separation",
        JobStatus::Merging => "status.merging",
        JobStatus::Complete => "status.complete",
        JobStatus::Error => "status.error",
    }
}
