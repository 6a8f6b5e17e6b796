pub mod dir_entry;
pub mod request;
