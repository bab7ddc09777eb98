//! Data model and pure-function layer shared by the acquisition pipeline:
//! the format codec (§4.1), the expression evaluator (§4.2), the point
//! mapper (§4.3), and the device/point/rule descriptor types (§3).
//!
//! Nothing in this crate performs I/O; it is the part of the pipeline that
//! is exhaustively unit-testable without a network or a clock.

pub mod descriptor;
pub mod expression;
pub mod format;
pub mod mapper;
pub mod value;

pub use descriptor::{
    AlarmSpec, DeviceDescriptor, FunctionGroup, PointConfig, PointType,
};
pub use expression::evaluate_bool;
pub use format::{decode, FormatTag, WordOrder4, WordOrder8};
pub use mapper::{map_reading, RawReading};
pub use value::Value;
