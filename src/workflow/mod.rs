pub mod admin_console;
pub mod exam_ctx;
pub mod exam_workflow;
pub mod outcome;
pub mod purchase_flow;

pub use admin_console::{AdminConsole, ExamFormOptions};
pub use exam_ctx::ExamCtx;
pub use exam_workflow::{ExamState, ExamView, ExamWorkflow, ScheduleRow};
pub use outcome::{ActionOutcome, LoadSection, LoadStatus, PartialFailure};
pub use purchase_flow::{OrderQuote, OrderReceipt, PurchaseFlow, PurchaseState};
