//! Rolling 7-day county averages for Michigan COVID-19 data.
//!
//! The pipeline per refresh cycle: fetch the state data page, locate the two
//! dataset links, download the files, normalize their schema, derive the
//! positive rate, roll per-county (or per-region) 7-day averages, and join the
//! two rolled series into one combined report. The `process` modules are pure
//! table-to-table functions; all I/O lives in `fetch`, `table::csv` and the
//! binary.

pub mod fetch;
pub mod process;
pub mod report;
pub mod table;
