//! Download queue entries.

use serde::{Deserialize, Serialize};

/// Backend used to fetch a download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Downloader {
    RealDebrid,
    AllDebrid,
    TorBox,
    Torrent,
    Gofile,
    PixelDrain,
    Qiwi,
    Datanodes,
    Mediafire,
}

impl Downloader {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RealDebrid => "real_debrid",
            Self::AllDebrid => "all_debrid",
            Self::TorBox => "tor_box",
            Self::Torrent => "torrent",
            Self::Gofile => "gofile",
            Self::PixelDrain => "pixel_drain",
            Self::Qiwi => "qiwi",
            Self::Datanodes => "datanodes",
            Self::Mediafire => "mediafire",
        }
    }
}

/// Lifecycle status of a download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    #[default]
    Waiting,
    Active,
    Paused,
    Error,
    Complete,
    Seeding,
    Removed,
}

/// A download in the queue, keyed by `shop:objectId`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub shop: String,
    pub object_id: String,
    /// Magnet link or direct URL. `None` once the source has been dropped.
    pub uri: Option<String>,
    pub folder_name: Option<String>,
    pub download_path: String,
    /// Completion ratio in `0.0..=1.0`.
    #[serde(default)]
    pub progress: f64,
    pub downloader: Downloader,
    #[serde(default)]
    pub bytes_downloaded: u64,
    pub file_size: Option<u64>,
    #[serde(default)]
    pub status: DownloadStatus,
    #[serde(default)]
    pub should_seed: bool,
    #[serde(default)]
    pub queued: bool,
    /// Last queue change as unix milliseconds.
    pub timestamp: i64,
}
