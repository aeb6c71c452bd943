pub mod local;

pub use local::{parse_instant, LocalTime, UNKNOWN_DATE};
