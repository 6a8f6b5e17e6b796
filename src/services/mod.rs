pub mod file_service;
pub mod listing_service;
pub mod path_service;
