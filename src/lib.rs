pub mod archive;
pub mod cli;
pub mod error;
pub mod github;
pub mod model;
pub mod stats;
pub mod store;
pub mod svg;
pub mod sync;
pub mod util;
