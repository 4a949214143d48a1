mod conversions;
mod pg_storage;

pub use pg_storage::PgStorage;
