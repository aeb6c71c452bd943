pub mod html;
pub mod profile_page;

use crate::domain::Candidate;

pub use profile_page::ProfilePageSource;

#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Most recent post on the monitored profile.
    ///
    /// Soft failures (login wall, empty grid) come back as [`Candidate::none`]; errors are
    /// reserved for failures of the profile request itself.
    async fn latest(&self) -> anyhow::Result<Candidate>;
}
