pub mod notifier;
pub mod package_access;
pub mod route_guard;
pub mod schedule_state;
pub mod validation;

pub use notifier::{
    Confirmer, MemoryNotifier, Notice, NoticeLevel, Notifier, StaticConfirmer, TracingNotifier,
};
pub use package_access::{CatalogPartition, LabeledPackage, PackageAccess};
pub use route_guard::RouteDecision;
pub use schedule_state::{ScheduleActions, SchedulePhase, ScheduleState};
