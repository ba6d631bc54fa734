pub mod frame_source;
pub mod photo_writer;
