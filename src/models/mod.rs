pub mod fields;
pub mod position;
pub mod trade;
pub mod stress_event;

pub use fields::{parse_timestamp, Identifier, StoredRecord};
pub use position::PositionRecord;
pub use stress_event::StressEventRecord;
pub use trade::TradeRecord;
