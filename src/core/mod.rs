pub mod etl;
pub mod parser;
pub mod report;
pub mod serializer;
pub mod session;
pub mod transform;

pub use crate::domain::model::{ParseSnapshot, RawDocument, Row, RowError};
pub use crate::domain::ports::{ConfigProvider, ResultSink};
pub use crate::utils::error::Result;
