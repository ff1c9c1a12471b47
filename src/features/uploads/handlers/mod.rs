pub mod upload_handler;

pub use upload_handler::{__path_upload_files, upload_files};
