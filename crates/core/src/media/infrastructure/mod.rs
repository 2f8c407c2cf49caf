pub mod image_directory;
pub mod image_file_reader;
pub mod image_file_writer;
