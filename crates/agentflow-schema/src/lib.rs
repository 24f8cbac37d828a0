//! Caller-declared field schemas: JSON-Schema emission, missing-field
//! tracking, opportunistic extraction, and structured-output validation.

pub mod extraction;
pub mod field;
pub mod schema;
pub mod validation;

pub use extraction::extract_fields;
pub use field::{Field, FieldType};
pub use schema::Schema;
pub use validation::{parse_structured_output, StructuredParseOutcome};
