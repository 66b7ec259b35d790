//! Reservation, execution, and worker lifecycle built on top of
//! `byplay-core`'s domain types and `byplay-db`'s installed schema.

mod callback;
mod executor;
mod reserve;
mod schedule;
mod worker;

pub use callback::{AckEvent, FailureEvent, OnAck, OnFail, default_on_ack, default_on_fail};
pub use executor::execute_once;
pub use reserve::reserve;
pub use schedule::{schedule, schedule_to};
pub use worker::{Worker, WorkerConfig, WorkerState};
