pub mod catalog;
pub mod exam;
pub mod order;
pub mod package;
pub mod user;

pub use catalog::{
    Course, CourseInput, MasterDataItem, MasterDataKind, PlatformConfig, Student, StudentInput,
};
pub use exam::{
    DeliveryType, Enrollment, EnrollmentStatus, Exam, ExamInput, ExamSchedule, ExamType,
    ScheduleInput,
};
pub use order::{NewOrder, Order, OrderItem, OrderStats, OrderStatus, PaymentUpdate, PaymentWebhook};
pub use package::{Package, PackageInput, PackageType};
pub use user::{AuthUser, Role};
