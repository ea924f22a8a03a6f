mod builder;

pub use builder::{build_sql, visibility_sql, SqlFragment, SqlValue};
