pub mod import;

pub use import::{ArticleRecord, ImportError, OrderImporter};
