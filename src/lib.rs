pub mod config;
pub mod error;
pub mod kernel;

pub use kernel::controller::PlaybackController;
pub use kernel::reactor::{Reactor, ReactorHandle};
pub use kernel::settings::PlaybackSettings;
pub use kernel::snapshot::PlaybackSnapshot;
pub use kernel::tokenizer::{tokenize, TokenSequence};
