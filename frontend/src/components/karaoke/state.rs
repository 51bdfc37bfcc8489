//! Runtime state of the karaoke page.

use common::jobs::JobView;
use common::model::locale::LanguagePack;
use std::cell::Cell;
use std::rc::Rc;

pub struct KaraokeComponent {
    /// Text of the URL input.
    pub url: String,

    /// Job currently followed, once `/process` answered.
    pub job_id: Option<String>,

    /// Last status received for `job_id`.
    pub view: Option<JobView>,

    /// Submission or polling problem to show instead of a status.
    pub error: Option<String>,

    /// `true` between pressing submit and the job reaching a terminal state.
    pub busy: bool,

    /// Bumped on every submission. A polling loop stops as soon as the value
    /// no longer matches the one it was started with.
    pub poll_generation: Rc<Cell<u32>>,

    pub pack: LanguagePack,

    /// Guard for the one-time language pack fetch.
    pub loaded: bool,
}

impl KaraokeComponent {
    pub fn new() -> Self {
        Self {
            url: String::new(),
            job_id: None,
            view: None,
            error: None,
            busy: false,
            poll_generation: Rc::new(Cell::new(0)),
            pack: LanguagePack::default(),
            loaded: false,
        }
    }

    /// Localized text; the raw key shows until the pack has loaded.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.pack.text(key)
    }
}
