use common::jobs::JobView;
use common::model::locale::LanguagePack;

#[derive(Clone)]
pub enum Msg {
    UpdateUrl(String),
    Submit,
    Submitted(String),
    SubmitFailed(String),
    /// A fresh status for the job started in poll round `generation`.
    Polled { generation: u32, view: JobView },
    JobLost { generation: u32 },
    SetLanguagePack(LanguagePack),
}
