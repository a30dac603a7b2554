pub mod fs_document_source;
pub mod history_log;
pub mod memory_store;
pub mod sqlite_store;
