pub mod image_file_source;
pub mod image_sequence_source;
pub mod photo_file_writer;
