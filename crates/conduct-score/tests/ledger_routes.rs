use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use conduct_score::auth::AdminCredential;
use conduct_score::ledger::{Ledger, LedgerSnapshot};
use conduct_score::router::ledger_router;
use conduct_score::scoring::{
    AppSettings, CodeId, DeductionCode, Employee, IncentiveTier, MasterSignatures, TierId,
};
use conduct_score::sync::{ConductService, OfflineSheetGateway};
use serde_json::{json, Value};
use tower::ServiceExt;

fn seeded_router() -> Router {
    let mut employee = Employee::new("58044306", "Somchai", "Jaidee");
    employee.position = "Reach Truck Driver".to_string();
    employee.position_allowance = 2000;
    employee.signature_url = Some("https://images.example.com/somchai.png".to_string());

    let mut unsigned = Employee::new("9", "Anan", "Sukjai");
    unsigned.position_allowance = 1500;
    unsigned.no_position_allowance = true;

    let ledger = Ledger::from_snapshot(LedgerSnapshot {
        employees: vec![employee, unsigned],
        deduction_codes: vec![DeductionCode {
            id: CodeId::new("D-SAFE01"),
            code: "SAFE01".to_string(),
            category: "Safety".to_string(),
            description: "No hard hat".to_string(),
            points: 15,
        }],
        incentive_tiers: vec![IncentiveTier {
            id: TierId::new("T-1"),
            name: "Grade A".to_string(),
            min_score: 90,
            max_score: 100,
            amount: 2000,
        }],
        settings: AppSettings {
            logo_url: None,
            master_signatures: MasterSignatures {
                asst_manager: Some("https://images.example.com/asst.png".to_string()),
                evp_hr: Some("https://images.example.com/evp.png".to_string()),
                ..MasterSignatures::default()
            },
        },
        ..LedgerSnapshot::default()
    });

    let service = ConductService::with_ledger(
        Arc::new(OfflineSheetGateway),
        vec![AdminCredential::new("admin", "admin1234")],
        ledger,
    );
    ledger_router(Arc::new(service))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("body serializes")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

async fn record_deduction(router: &Router) -> Value {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/deductions",
            json!({
                "employee_id": "58044306",
                "deduction_code_id": "D-SAFE01",
                "date": "2024-05-03",
                "remark": "Dock 4"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

#[tokio::test]
async fn deduction_route_returns_updated_employee_and_record() {
    let router = seeded_router();

    let body = record_deduction(&router).await;

    assert_eq!(body["employee"]["score"], 85);
    assert_eq!(body["record"]["points"], 15);
    assert_eq!(body["record"]["date"], "2024-05-03");
    assert_eq!(body["record"]["deductionCodeCode"], "SAFE01");
}

#[tokio::test]
async fn deduction_for_unknown_employee_is_not_found() {
    let response = seeded_router()
        .oneshot(json_request(
            "POST",
            "/api/v1/deductions",
            json!({
                "employee_id": "99999999",
                "deduction_code_id": "D-SAFE01",
                "date": "2024-05-03"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().expect("error text").contains("99999999"));
}

#[tokio::test]
async fn monthly_score_route_reads_record_log() {
    let router = seeded_router();
    record_deduction(&router).await;

    let response = router
        .clone()
        .oneshot(get("/api/v1/employees/58044306/score?month=2024-05"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["score"], 85);

    let response = router
        .oneshot(get("/api/v1/employees/58044306/score?month=2024-06"))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await["score"], 100);
}

#[tokio::test]
async fn malformed_month_is_a_bad_request() {
    let response = seeded_router()
        .oneshot(get("/api/v1/reports/finance?month=2024-5"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn finance_report_pays_nothing_outside_tiers() {
    let router = seeded_router();
    record_deduction(&router).await;

    let response = router
        .oneshot(get("/api/v1/reports/finance?month=2024-05"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["lines"][0]["monthly_score"], 85);
    assert_eq!(body["lines"][0]["payable"], 0);
    assert!(body["lines"][0].get("tier").is_none());
    assert_eq!(body["total_payable"], 0);
}

#[tokio::test]
async fn csv_export_route_sets_attachment_headers() {
    let router = seeded_router();
    record_deduction(&router).await;

    let response = router
        .clone()
        .oneshot(get("/api/v1/reports/export?month=2024-05"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Deduction_Report_2024-05.csv\""
    );

    let response = router
        .oneshot(get("/api/v1/reports/export?month=2024-06"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_tier_range_is_rejected() {
    let response = seeded_router()
        .oneshot(json_request(
            "PUT",
            "/api/v1/tiers",
            json!({ "id": "T-2", "name": "Broken", "minScore": 80, "maxScore": 70, "amount": 100 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn eligibility_toggle_zeroes_portal_incentive() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/employees/58044306/eligibility",
            json!({ "no_position_allowance": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get("/api/v1/portal/58044306?month=2024-05"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 100);
    assert_eq!(body["incentive_amount"], 0);
    assert_eq!(body["ineligible"], true);
}

#[tokio::test]
async fn sign_off_uses_stored_signature_and_shows_up_in_portal() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/portal/58044306/sign-off",
            json!({ "month": "2024-05", "signature_image": "forged.png" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(
        body["signature_image"],
        "https://images.example.com/somchai.png"
    );

    let response = router
        .oneshot(get("/api/v1/portal/58044306?month=2024-05"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["signed_off"]["month"], "2024-05");
}

#[tokio::test]
async fn sign_off_without_stored_signature_is_rejected() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/portal/9/sign-off",
            json!({ "month": "2024-05" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(get("/api/v1/portal/9?month=2024-05"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body.get("signed_off"), None);
}

#[tokio::test]
async fn approval_sheet_defaults_and_signing() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(get("/api/v1/approvals/2024-05"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["entries"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["entries"][0]["decision"], Value::Null);
    assert_eq!(body["entries"][1]["decision"], "approved");

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/approvals/2024-05",
            json!({ "role": "asst_manager", "date": "2024-05-31", "decision": "rejected" }),
        ))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["entries"][1]["decision"], "rejected");
    assert_eq!(body["entries"][1]["date"], "2024-05-31");
    assert_eq!(
        body["entries"][1]["signature"],
        "https://images.example.com/asst.png"
    );

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/approvals/2024-05",
            json!({ "role": "evp_hr", "signature": "forged.png" }),
        ))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["entries"][4]["decision"], "approved");
    assert_eq!(body["entries"][4]["date"], "2024-05-01");
    assert_eq!(
        body["entries"][4]["signature"],
        "https://images.example.com/evp.png"
    );
}

#[tokio::test]
async fn approval_without_master_signature_is_rejected() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/approvals/2024-05",
            json!({ "role": "hr_manager" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(get("/api/v1/approvals/2024-05"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["entries"][3]["signature"], Value::Null);
}

#[tokio::test]
async fn monthly_report_lists_roster_by_numeric_id() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/portal/58044306/sign-off",
            json!({ "month": "2024-05" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(get("/api/v1/reports/monthly?month=2024-05"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["roster"][0]["employee_id"], "9");
    assert_eq!(body["roster"][1]["employee_id"], "58044306");
    assert_eq!(body["roster"][1]["grade"], "Grade A");
    assert_eq!(body["roster"][1]["actual_pay"], 2000);
    assert_eq!(body["roster"][1]["signed_off"], true);
    assert_eq!(body["roster"][0]["signed_off"], false);
    assert_eq!(body["roster"][0]["actual_pay"], 0);
    assert_eq!(body["total_projected"], 3500);
    assert_eq!(body["signed_off_count"], 1);
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "admin", "password": "nope" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "58044306", "password": "58044306" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await["role"], "employee");
}

#[tokio::test]
async fn offline_refresh_is_a_bad_gateway() {
    let router = seeded_router();

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/sync/refresh")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = router
        .oneshot(get("/api/v1/ledger"))
        .await
        .expect("route executes");
    let body = read_json_body(response).await;
    assert_eq!(body["status"]["offline"], true);
    assert_eq!(body["ledger"]["employees"][0]["id"], "58044306");
}
