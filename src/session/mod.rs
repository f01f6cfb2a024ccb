pub mod controller;
pub mod snapshot;
mod viewer_session;

pub use controller::{
    ApplyReport, OpenOutcome, SearchOutcome, SessionController, SessionDeps, StreamOutcome,
    SUMMARY_PLACEHOLDER,
};
pub use snapshot::SessionSnapshot;
