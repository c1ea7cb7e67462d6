//! Record model shared by the codec, the access layer and the stores

pub mod entity;
pub mod field;
pub mod filter;
pub mod record_set;
pub mod row;
pub mod value;

pub use entity::{CounterEntity, Entity, IdentitySource, ENTERPRISE_ID_COLUMN};
pub use field::{rounded_eq, Field};
pub use filter::{Changes, FieldMap, Filter};
pub use record_set::RecordSet;
pub use row::Row;
pub use value::FieldValue;
