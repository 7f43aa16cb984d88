pub mod extract;
pub mod scheduler;
pub mod store;

pub use extract::{ContentExtractor, PageMeta, SavedArtifacts};
pub use scheduler::{
    BrowserlessFetcher, DelaySampler, NoDelay, PageFetcher, RunStats, Scheduler, SnapshotIndex,
    UniformDelay,
};
pub use store::{CrawlStats, PageStore};
