pub mod planes;
pub mod tiff_io;
