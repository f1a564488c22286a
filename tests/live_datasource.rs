use edu_portal_client::datasource::{DataSource, LiveDataSource};
use edu_portal_client::error::{ApiError, AppError};
use edu_portal_client::infrastructure::{ApiClient, AuthSession};
use edu_portal_client::models::{
    AuthUser, EnrollmentStatus, MasterDataKind, NewOrder, OrderStatus, Role,
};
use edu_portal_client::services::{MemoryNotifier, NoticeLevel, StaticConfirmer};
use edu_portal_client::workflow::{
    ActionOutcome, AdminConsole, ExamCtx, ExamWorkflow, LoadSection, LoadStatus,
};
use edu_portal_client::Config;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn student() -> AuthUser {
    AuthUser {
        id: 7,
        name: "Test Student".to_string(),
        email: None,
        role: Role::Student,
    }
}

fn live_source(server: &MockServer) -> (Arc<LiveDataSource>, Arc<AuthSession>) {
    let session = Arc::new(AuthSession::in_memory());
    session.login(student(), "secret-token").unwrap();

    let config = Config {
        api_base_url: server.base_url(),
        request_timeout_secs: 5,
        ..Config::default()
    };
    let client = ApiClient::new(&config, Arc::clone(&session)).unwrap();
    (Arc::new(LiveDataSource::new(client)), session)
}

fn exam_json() -> serde_json::Value {
    json!({
        "id": 1,
        "title": "Unit Test 3",
        "type": "PRACTICE",
        "deliveryType": "ONLINE",
        "duration": 45,
        "totalMarks": 30
    })
}

fn enrollment_json(id: i64, student_id: i64, schedule_id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "studentId": student_id,
        "examId": 1,
        "scheduleId": schedule_id,
        "status": "ENROLLED",
        "enrolledAt": "2098-12-01T08:00:00Z"
    })
}

fn schedule_json(id: i64, capacity: u32, enrolled: u32) -> serde_json::Value {
    json!({
        "id": id,
        "examId": 1,
        "startDateTime": "2099-01-10T09:00:00Z",
        "endDateTime": "2099-01-10T10:00:00Z",
        "capacity": capacity,
        "enrolledCount": enrolled
    })
}

#[tokio::test]
async fn test_message_envelope_is_unwrapped_with_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/exams/1")
                .header("authorization", "Bearer secret-token");
            then.status(200)
                .json_body(json!({ "message": "ok", "data": exam_json() }));
        })
        .await;

    let (source, _) = live_source(&server);
    let exam = source.get_exam(1).await.unwrap();

    mock.assert_async().await;
    assert_eq!(exam.title(), "Unit Test 3");
    assert_eq!(exam.details.duration, 45);
}

#[tokio::test]
async fn test_plain_payload_passes_through() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/packages");
            then.status(200).json_body(json!([{
                "id": 4,
                "name": "Board Exam Test Series",
                "type": "test_series",
                "price": 1999.0,
                "duration_months": 6
            }]));
        })
        .await;

    let (source, _) = live_source(&server);
    let packages = source.list_packages().await.unwrap();

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].price(), 1999.0);
    assert!(packages[0].is_active());
}

#[tokio::test]
async fn test_server_message_is_kept_on_conflict() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/exams/1/schedules/13/enroll");
            then.status(409)
                .json_body(json!({ "message": "Schedule is full" }));
        })
        .await;

    let (source, _) = live_source(&server);
    let err = source.enroll(1, 13).await.unwrap_err();

    assert!(matches!(
        &err,
        AppError::Api(ApiError::BadResponse { status: 409, .. })
    ));
    assert_eq!(err.user_message(), "Schedule is full");
}

#[tokio::test]
async fn test_success_false_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/orders");
            then.status(200)
                .json_body(json!({ "success": false, "message": "Package inactive" }));
        })
        .await;

    let (source, _) = live_source(&server);
    let err = source
        .create_order(&NewOrder {
            package_ids: vec![5],
        })
        .await
        .unwrap_err();

    assert!(matches!(&err, AppError::Api(ApiError::Rejected { .. })));
    assert_eq!(err.user_message(), "Package inactive");
}

#[tokio::test]
async fn test_success_envelope_decodes_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/orders")
                .json_body(json!({ "package_ids": [4, 7] }));
            then.status(201).json_body(json!({
                "success": true,
                "data": {
                    "id": 900,
                    "student_id": 7,
                    "total_amount": 4998.0,
                    "status": "pending",
                    "items": [
                        { "package_id": 4, "price": 1999.0 },
                        { "package_id": 7, "price": 2999.0 }
                    ]
                }
            }));
        })
        .await;

    let (source, _) = live_source(&server);
    let order = source
        .create_order(&NewOrder {
            package_ids: vec![4, 7],
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 4998.0);
    assert!(order.references(7));
}

#[tokio::test]
async fn test_unauthorized_maps_to_login_prompt() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/my/enrollments");
            then.status(401);
        })
        .await;

    let (source, _) = live_source(&server);
    let err = tokio_test::assert_err!(source.my_enrollments().await);

    assert!(matches!(err, AppError::Api(ApiError::Unauthorized { .. })));
    assert_eq!(err.user_message(), "请先登录");
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(500);
        })
        .await;

    let (source, session) = live_source(&server);
    source.client().logout().await.unwrap();

    mock.assert_async().await;
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_schedule_failure_is_partial_not_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1");
            then.status(200).json_body(exam_json());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1/schedules");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/my/enrollments");
            then.status(200).json_body(json!({ "message": "ok", "data": [] }));
        })
        .await;

    let (source, _) = live_source(&server);
    let mut workflow = ExamWorkflow::new(
        ExamCtx::new(1, Some(7)),
        source,
        Arc::new(MemoryNotifier::new()),
        Arc::new(StaticConfirmer::always_yes()),
    );

    assert_eq!(workflow.load().await.unwrap(), LoadStatus::Loaded);

    let view = workflow.view(chrono::Utc::now());
    assert_eq!(view.title(), "Unit Test 3");
    assert!(view.rows.is_empty());
    assert_eq!(view.partial_failures.len(), 1);
    assert_eq!(view.partial_failures[0].section, LoadSection::Schedules);
}

#[tokio::test]
async fn test_failed_enroll_reloads_from_server() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1");
            then.status(200).json_body(exam_json());
        })
        .await;
    let schedules = server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1/schedules");
            then.status(200)
                .json_body(json!({ "success": true, "data": [schedule_json(13, 100, 100)] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/my/enrollments");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/exams/1/schedules/13/enroll");
            then.status(400)
                .json_body(json!({ "message": "Schedule is full" }));
        })
        .await;

    let (source, _) = live_source(&server);
    let notifier = Arc::new(MemoryNotifier::new());
    let mut workflow = ExamWorkflow::new(
        ExamCtx::new(1, Some(7)),
        source,
        notifier.clone(),
        Arc::new(StaticConfirmer::always_yes()),
    );
    workflow.load().await.unwrap();

    let outcome = workflow.enroll(13).await;
    assert_eq!(outcome, ActionOutcome::Failed("Schedule is full".to_string()));

    // 初次加载 + 失败后的重新加载
    schedules.assert_hits_async(2).await;
    let notices = notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("Schedule is full"));
}

#[tokio::test]
async fn test_enroll_without_data_is_still_success() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1");
            then.status(200).json_body(exam_json());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/1/schedules");
            then.status(200)
                .json_body(json!({ "success": true, "data": [schedule_json(13, 100, 58)] }));
        })
        .await;
    let enrollments = server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/my/enrollments");
            then.status(200)
                .json_body(json!({ "message": "ok", "data": [enrollment_json(900, 7, 13)] }));
        })
        .await;
    let enroll = server
        .mock_async(|when, then| {
            when.method(POST).path("/exams/1/schedules/13/enroll");
            then.status(201).json_body(json!({ "message": "Enrolled successfully" }));
        })
        .await;

    let (source, _) = live_source(&server);
    let notifier = Arc::new(MemoryNotifier::new());
    let mut workflow = ExamWorkflow::new(
        ExamCtx::new(1, Some(7)),
        source,
        notifier.clone(),
        Arc::new(StaticConfirmer::always_yes()),
    );
    workflow.load().await.unwrap();

    let outcome = workflow.enroll(13).await;

    enroll.assert_async().await;
    enrollments.assert_hits_async(2).await;
    let enrollment = outcome.into_success().flatten().unwrap();
    assert_eq!(enrollment.id, 900);
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
    assert!(workflow.is_enrolled(13));

    let notices = notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn test_enroll_with_empty_body_returns_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/exams/1/schedules/13/enroll");
            then.status(204);
        })
        .await;

    let (source, _) = live_source(&server);
    let enrollment = tokio_test::assert_ok!(source.enroll(1, 13).await);

    assert!(enrollment.is_none());
}

#[tokio::test]
async fn test_schedule_roster_reads_enrollments_endpoint() {
    let server = MockServer::start_async().await;
    let roster = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/exams/1/schedules/13/enrollments")
                .header("authorization", "Bearer secret-token");
            then.status(200).json_body(json!({
                "message": "ok",
                "data": [enrollment_json(900, 7, 13), enrollment_json(901, 8, 13)]
            }));
        })
        .await;

    let (source, _) = live_source(&server);
    let notifier = Arc::new(MemoryNotifier::new());
    let console = AdminConsole::new(
        source,
        notifier.clone(),
        Arc::new(StaticConfirmer::always_yes()),
    );

    let enrollments = console.schedule_roster(1, 13).await.into_success().unwrap();

    roster.assert_async().await;
    let students: Vec<i64> = enrollments.iter().map(|e| e.student_id).collect();
    assert_eq!(students, vec![7, 8]);
    assert!(notifier.drain().is_empty());
}

#[tokio::test]
async fn test_academic_boards_dropdown_uses_hyphenated_segment() {
    let server = MockServer::start_async().await;
    let dropdown = server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/dropdown/academic-boards");
            then.status(200).json_body(json!({
                "success": true,
                "data": [{ "id": 1, "name": "CBSE" }, { "id": 2, "name": "ICSE" }]
            }));
        })
        .await;

    let (source, _) = live_source(&server);
    let items = source.list_master_data(MasterDataKind::AcademicBoards).await.unwrap();

    dropdown.assert_async().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].name, "ICSE");
}

#[tokio::test]
async fn test_exam_form_keeps_loaded_dropdowns_when_others_fail() {
    let server = MockServer::start_async().await;
    let boards = server
        .mock_async(|when, then| {
            when.method(GET).path("/exams/dropdown/boards");
            then.status(200)
                .json_body(json!({ "message": "ok", "data": [{ "id": 1, "name": "CBSE" }] }));
        })
        .await;
    // 其余下拉没有注册，模拟服务返回 404
    let (source, _) = live_source(&server);
    let notifier = Arc::new(MemoryNotifier::new());
    let console = AdminConsole::new(
        source,
        notifier.clone(),
        Arc::new(StaticConfirmer::always_yes()),
    );

    let form = console.load_exam_form_options().await;

    boards.assert_async().await;
    assert_eq!(form.items(MasterDataKind::Boards).len(), 1);
    assert!(form.items(MasterDataKind::AcademicBoards).is_empty());
    assert_eq!(form.failures.len(), 4);

    let notices = notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
}

#[tokio::test]
async fn test_data_source_logout_notifies_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/logout")
                .header("authorization", "Bearer secret-token");
            then.status(200).json_body(json!({ "message": "Logged out" }));
        })
        .await;

    let (source, session) = live_source(&server);
    let source: Arc<dyn DataSource> = source;
    tokio_test::assert_ok!(source.logout().await);

    mock.assert_async().await;
    assert!(!session.is_authenticated());
}
