pub mod client;
pub mod parser;

pub use client::ArxivClient;
pub use parser::{ArxivEntry, parse_atom_response};
