pub mod dashboard;
pub mod engine;
pub mod folder;
pub mod paths;
pub mod report;

pub use engine::{GENERAL_FOLDER_ID, SyncEngine, SyncError};
pub use report::{FolderOutcome, ItemOutcome, Summary, SyncReport};
