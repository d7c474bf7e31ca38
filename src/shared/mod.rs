pub mod json_fields;
pub mod text;
