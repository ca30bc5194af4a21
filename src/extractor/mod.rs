pub mod path_extractor;

pub use path_extractor::{extract_local_paths, is_local_path, paths_between, PathExtractor};
