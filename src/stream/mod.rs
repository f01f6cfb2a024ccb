pub mod decoder;
pub mod input;
pub mod state;

pub use decoder::Utf8StreamDecoder;
pub use input::{FolderScope, InputFingerprint, StreamInput};
pub use state::StreamState;
