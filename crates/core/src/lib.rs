#![forbid(unsafe_code)]

pub mod model;
pub mod time;
pub mod validation;

pub use time::Clock;
pub use validation::{Validation, ValidationIssue, parse_and_validate, validate_questions};
