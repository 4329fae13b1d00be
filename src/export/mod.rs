//! Flat views of a resolved schedule for tabular and gantt renderers.
//!
//! Nothing here schedules; every value is read through
//! [`Timeline`](crate::timeline::Timeline).

pub mod csv_file;
pub mod frame;
pub mod table;

pub use csv_file::{save_csv, write_csv};
pub use frame::to_dataframe;
pub use table::{TaskRow, month_span, rows};
