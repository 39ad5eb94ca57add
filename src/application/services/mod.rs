//! Background application services

mod overdue_sweep;

pub use overdue_sweep::{run_sweep, start_overdue_sweep_task};
