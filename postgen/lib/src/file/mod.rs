pub mod go_file;
