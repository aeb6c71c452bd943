pub mod post;
pub mod state;

pub use post::Candidate;
pub use state::PersistedState;
