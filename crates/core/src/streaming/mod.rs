pub mod domain;
pub mod frame_broadcaster;
pub mod infrastructure;
pub mod multipart;
