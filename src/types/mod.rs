//! Type definitions for the employee performance predictor

pub mod employee;
pub mod schema;

pub use employee::{EmployeeRecord, FieldValue};
pub use schema::{Control, FieldSpec, FIELDS};
