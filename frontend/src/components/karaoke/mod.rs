//! Karaoke page: submit a link, follow the job, play the result.
//!
//! Split like the other components: `state` holds the data, `update` reacts
//! to messages, `view` renders and `helpers` does the HTTP calls.

use yew::platform::spawn_local;
use yew::prelude::*;

mod helpers;
mod messages;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use state::KaraokeComponent;

impl Component for KaraokeComponent {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        KaraokeComponent::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render && !self.loaded {
            self.loaded = true;
            spawn_local(helpers::load_language_pack(ctx.link().clone()));
        }
    }
}
