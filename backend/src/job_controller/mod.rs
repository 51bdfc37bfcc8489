//! Background job machinery: the shared registry/queue (`state`) and the
//! single worker draining it (`worker`).

pub mod state;
pub mod worker;
