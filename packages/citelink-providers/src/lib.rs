pub mod works;

pub use works::{Work, WorksClient, parse_works};
