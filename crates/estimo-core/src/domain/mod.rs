//! Domain model (ids, precision, task state, records, jobs, errors).

pub mod counts;
pub mod errors;
pub mod ids;
pub mod job;
pub mod precision;
pub mod record;
pub mod state;

pub use counts::RegistryCounts;
pub use errors::{ErrorKind, InvalidTransition};
pub use ids::{DeliveryId, ParseIdError, TaskId};
pub use job::{EstimatorJob, Job};
pub use precision::{Precision, PrecisionOutOfRange};
pub use record::TaskRecord;
pub use state::TaskState;
