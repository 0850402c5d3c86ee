pub mod path_validator;

pub use path_validator::{sanitize_filename, PathValidator};
