pub mod file_formats;
pub mod group;
pub mod reading;
pub mod sensor;
pub mod species;
