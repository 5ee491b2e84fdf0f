/// Module for loading documents from delimited text files.
pub mod file_loaders;
