//! I/O glue around the core: fetch the source page, locate the dataset
//! links inside it, and download the raw files. No retries here; a failed
//! fetch fails the refresh.

pub mod files;
pub mod links;
pub mod page;
