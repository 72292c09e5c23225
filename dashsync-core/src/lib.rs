mod client;
mod error;
mod models;
mod transport;

pub use client::DashboardClient;
pub use error::ClientError;
pub use models::{
    DashboardMeta, DashboardSource, DashboardUploadResponse, DashboardWithMeta, Folder, SearchHit,
    SearchParams, SearchType, same_identity,
};
pub use transport::{Credentials, RawResponse, Transport};
