pub mod csv_codec;
pub mod etl;
pub mod report;
pub mod run_log;
pub mod schema;
pub mod transform;

pub use crate::domain::model::{Dataset, Record, TransformResult};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
