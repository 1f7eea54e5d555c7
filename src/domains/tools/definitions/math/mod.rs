//! Arithmetic tools module.
//!
//! Integer arithmetic exposed as pure tools:
//! - `add`, `subtract`, `multiply`: checked integer arithmetic
//! - `divide`: floating point quotient, rejecting a zero divisor

pub mod add;
pub mod common;
pub mod divide;
pub mod multiply;
pub mod subtract;

pub use add::AddTool;
pub use common::OperandsParams;
pub use divide::DivideTool;
pub use multiply::MultiplyTool;
pub use subtract::SubtractTool;
