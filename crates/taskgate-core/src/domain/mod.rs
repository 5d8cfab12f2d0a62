//! Domain model (decoded task, verdicts, decode errors, business rules).

pub mod errors;
pub mod policy;
pub mod state;
pub mod task;
pub mod task_type;
pub mod verdict;

pub use errors::DecodeError;
pub use policy::{BusinessRule, ExpiryRule, MaxLeadRule};
pub use state::DecodeStage;
pub use task::DecodedTask;
pub use task_type::{TaskType, TaskTypeError};
pub use verdict::{PolicyVerdict, ReasonCode};
