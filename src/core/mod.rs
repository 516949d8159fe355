pub mod error;
pub mod importer;
pub mod mapping;
pub mod record;
pub mod row_processor;
pub mod stats;
pub mod validation;
