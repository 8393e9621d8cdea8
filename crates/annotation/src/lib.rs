//! Annotation workspace core: projects, questionnaires, tasks, dataset
//! normalization and the annotation session state machine.

pub mod error;
pub mod kipp;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod status;
pub mod store;

pub use error::*;
pub use kipp::KippConfig;
pub use normalize::{examples_for_task, normalize, parse_upload, Example, FileSummary, Parsed, Turn};
pub use schema::*;
pub use session::{is_answered, AnnotationSession, Finalize, SaveStatus, SessionSnapshot};
pub use status::{transition, Effect, TaskEvent, TaskStatus};
pub use store::{Dashboard, Store};
