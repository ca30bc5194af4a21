pub mod compact;

pub use compact::to_compact_string;
