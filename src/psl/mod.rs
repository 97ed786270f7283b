pub mod eof;
pub mod error;
pub mod fetch;
pub mod grid;
