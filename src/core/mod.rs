//! Core data types: peers, files, progress and transfer events

pub mod events;
pub mod files;
pub mod peer;
pub mod progress;

pub use events::{AcceptPolicy, FileReceivingEventHandler, FileSendingEventHandler, PolicyHandler};
pub use files::{
    FileWithMetadata, destination_candidates, dir_size, expand_files_with_relative_paths,
    sanitize_relative_path,
};
pub use peer::Peer;
pub use progress::{Progress, SpeedEstimator};
