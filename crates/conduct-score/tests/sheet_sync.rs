use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use conduct_score::auth::AdminCredential;
use conduct_score::ledger::{
    ApprovalDecision, ApprovalRole, Collection, DeductionRequest, LedgerError,
};
use conduct_score::scoring::{CodeId, EmployeeId, MonthKey};
use conduct_score::sync::{
    BrandingTarget, ConductService, ImageUpload, RemoteSnapshot, SaveAllPayload, SheetError,
    SheetGateway, SyncError,
};
use serde_json::{json, Value};

#[derive(Debug, Default)]
struct FakeSheet {
    snapshot: Mutex<Option<RemoteSnapshot>>,
    saved: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<String>>,
}

impl FakeSheet {
    fn with_snapshot(body: Value) -> Self {
        let snapshot: RemoteSnapshot = serde_json::from_value(body).expect("snapshot parses");
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    fn go_offline(&self) {
        *self.snapshot.lock().expect("snapshot mutex") = None;
    }

    fn saved(&self) -> Vec<Value> {
        self.saved.lock().expect("saved mutex").clone()
    }
}

#[async_trait]
impl SheetGateway for FakeSheet {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, SheetError> {
        self.snapshot
            .lock()
            .expect("snapshot mutex")
            .clone()
            .ok_or(SheetError::NotConfigured)
    }

    async fn save_all(&self, payload: &SaveAllPayload) -> Result<(), SheetError> {
        let value = serde_json::to_value(payload).expect("payload serializes");
        self.saved.lock().expect("saved mutex").push(value);
        Ok(())
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, SheetError> {
        self.uploads
            .lock()
            .expect("upload mutex")
            .push(upload.file_name.clone());
        Ok(format!("https://images.example.com/{}", upload.file_name))
    }
}

fn sheet_body() -> Value {
    json!({
        "employees": [
            { "id": 58044306, "firstName": "Somchai", "lastName": "Jaidee", "score": "40",
              "pendingDeductionPoints": 12, "positionAllowance": "1500" },
            { "id": "PRESERVE_HEADER", "firstName": "", "lastName": "" },
            { "id": " 60070027 ", "firstName": "Anan", "lastName": "Sukjai", "score": 100,
              "noPositionAllowance": "true" }
        ],
        "deductionCodes": [
            { "id": "D-SAFE01", "code": "SAFE01", "description": "No hard hat", "points": "10" }
        ],
        "records": [
            { "id": "R-1", "employeeId": 58044306, "deductionCodeId": "D-SAFE01",
              "deductionCodeCode": "SAFE01", "date": "2024-05-03T17:00:00.000Z", "points": 10 },
            { "id": "R-0", "employeeId": "58044306", "deductionCodeId": "D-SAFE01",
              "deductionCodeCode": "SAFE01", "date": "2024-04-11", "points": 30 }
        ],
        "incentiveTiers": [
            { "id": "T-1", "name": "Grade A", "minScore": 90, "maxScore": 100, "amount": 2000 },
            { "id": "T-2", "name": "Grade B", "minScore": "80", "maxScore": "89", "amount": 1500 }
        ]
    })
}

fn service(sheet: Arc<FakeSheet>) -> ConductService {
    ConductService::new(sheet, vec![AdminCredential::new("admin", "admin1234")])
}

fn may() -> MonthKey {
    MonthKey::parse("2024-05").expect("valid month")
}

#[tokio::test]
async fn refresh_normalizes_rows_and_rescores_for_month() {
    let sheet = Arc::new(FakeSheet::with_snapshot(sheet_body()));
    let service = service(sheet);

    let status = service.refresh(&may()).await.expect("refresh succeeds");
    assert!(!status.offline);
    assert!(status.last_synced_at.is_some());

    let ledger = service.ledger();
    assert_eq!(ledger.employees().len(), 2);
    let somchai = ledger
        .employee(&EmployeeId::new("58044306"))
        .expect("numeric id normalized");
    assert_eq!(somchai.score, 90);
    assert_eq!(somchai.pending_deduction_points, 12);
    assert_eq!(somchai.position_allowance, 1500);
    let anan = ledger
        .employee(&EmployeeId::new("60070027"))
        .expect("padded id trimmed");
    assert!(anan.no_position_allowance);
    assert_eq!(ledger.records()[0].date.as_str(), "2024-05-03");
    assert_eq!(ledger.incentive_tiers()[1].min_score, 80);
}

#[tokio::test]
async fn failed_refresh_keeps_cache_and_goes_offline() {
    let sheet = Arc::new(FakeSheet::with_snapshot(sheet_body()));
    let service = service(sheet.clone());
    service.refresh(&may()).await.expect("first refresh succeeds");
    let cached = service.ledger();

    sheet.go_offline();
    let err = service.refresh(&may()).await.expect_err("refresh fails");

    assert!(matches!(err, SyncError::Fetch(SheetError::NotConfigured)));
    assert!(service.status().offline);
    assert_eq!(service.ledger(), cached);
}

#[tokio::test]
async fn save_reports_empty_collections_and_sends_placeholders() {
    let sheet = Arc::new(FakeSheet::default());
    let service = service(sheet.clone());

    let report = service
        .save(NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date"))
        .await
        .expect("save succeeds");

    assert_eq!(
        report.empty_collections,
        vec![
            Collection::Employees,
            Collection::DeductionCodes,
            Collection::IncentiveTiers,
            Collection::Records,
        ]
    );
    let saved = sheet.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["action"], "saveAll");
    assert_eq!(saved[0]["data"]["Employees"][0]["id"], "PRESERVE_HEADER");
    assert_eq!(saved[0]["data"]["Records"][0]["date"], "2024-05-20");
    assert_eq!(saved[0]["data"]["tiers"][0]["id"], "PRESERVE_HEADER");
}

#[tokio::test]
async fn recorded_deduction_is_pushed_on_next_save() {
    let sheet = Arc::new(FakeSheet::with_snapshot(sheet_body()));
    let service = service(sheet.clone());
    service.refresh(&may()).await.expect("refresh succeeds");

    let outcome = service
        .record_deduction(DeductionRequest {
            employee_id: EmployeeId::new("58044306"),
            deduction_code_id: CodeId::new("D-SAFE01"),
            date: NaiveDate::from_ymd_opt(2024, 5, 21).expect("valid date"),
            remark: "Forklift aisle".to_string(),
        })
        .expect("deduction recorded");
    assert_eq!(outcome.employee.score, 80);

    let report = service
        .save(NaiveDate::from_ymd_opt(2024, 5, 21).expect("valid date"))
        .await
        .expect("save succeeds");
    assert!(report.empty_collections.is_empty());

    let saved = sheet.saved();
    let records = saved[0]["data"]["Records"].as_array().expect("records array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["remark"], "Forklift aisle");
    assert_eq!(saved[0]["data"]["records"], saved[0]["data"]["Records"]);
}

#[tokio::test]
async fn branding_upload_stores_url_in_settings() {
    let sheet = Arc::new(FakeSheet::default());
    let service = service(sheet);

    let settings = service
        .upload_branding(
            BrandingTarget::Signature(ApprovalRole::HrManager),
            ImageUpload::new(
                "data:image/png;base64,AAAA".to_string(),
                "image/png".to_string(),
                "hr.png".to_string(),
            ),
        )
        .await
        .expect("upload succeeds");

    assert_eq!(
        settings.master_signatures.hr_manager.as_deref(),
        Some("https://images.example.com/hr.png")
    );
    assert_eq!(service.ledger().settings(), &settings);
}

#[tokio::test]
async fn login_checks_admins_then_employees() {
    let sheet = Arc::new(FakeSheet::with_snapshot(sheet_body()));
    let service = service(sheet);
    service.refresh(&may()).await.expect("refresh succeeds");

    assert!(service.authenticate("admin", "admin1234").is_ok());
    let session = service
        .authenticate("58044306", "58044306")
        .expect("employee logs in with id");
    assert_eq!(session.employee_id, Some(EmployeeId::new("58044306")));
    assert!(service.authenticate("58044306", "wrong").is_err());
}

#[tokio::test]
async fn refresh_survives_malformed_config_and_stray_rows() {
    let mut body = sheet_body();
    body["config"] = json!({ "logoUrl": "", "masterSignatures": "" });
    if let Some(rows) = body["employees"].as_array_mut() {
        rows.push(json!(""));
    }
    let sheet = Arc::new(FakeSheet::with_snapshot(body));
    let service = service(sheet);

    let status = service.refresh(&may()).await.expect("refresh succeeds");

    assert!(!status.offline);
    let ledger = service.ledger();
    assert_eq!(ledger.employees().len(), 2);
    assert_eq!(ledger.records().len(), 2);
    assert_eq!(ledger.settings().logo_url, None);
    assert_eq!(ledger.settings().master_signatures.evp_hr, None);
}

#[tokio::test]
async fn approval_signs_with_uploaded_master_signature() {
    let sheet = Arc::new(FakeSheet::default());
    let service = service(sheet);

    let err = service
        .sign_approval(&may(), ApprovalRole::EvpHr, None, None)
        .expect_err("no master signature yet");
    assert_eq!(err, LedgerError::MissingMasterSignature(ApprovalRole::EvpHr));

    service
        .upload_branding(
            BrandingTarget::Signature(ApprovalRole::EvpHr),
            ImageUpload::new(
                "data:image/png;base64,AAAA".to_string(),
                "image/png".to_string(),
                "evp.png".to_string(),
            ),
        )
        .await
        .expect("upload succeeds");

    let sheet = service
        .sign_approval(&may(), ApprovalRole::EvpHr, None, None)
        .expect("approval signed");
    let entry = sheet.entry(ApprovalRole::EvpHr).expect("present");
    assert_eq!(
        entry.signature.as_deref(),
        Some("https://images.example.com/evp.png")
    );
    assert_eq!(entry.decision, Some(ApprovalDecision::Approved));
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 5, 1));
}

#[tokio::test]
async fn sign_off_requires_signature_on_profile() {
    let sheet = Arc::new(FakeSheet::with_snapshot(sheet_body()));
    let service = service(sheet);
    service.refresh(&may()).await.expect("refresh succeeds");

    let err = service
        .sign_off(&EmployeeId::new("58044306"), &may())
        .expect_err("no signature on file");
    assert_eq!(
        err,
        LedgerError::MissingEmployeeSignature(EmployeeId::new("58044306"))
    );
    assert_eq!(service.monthly_report(&may()).signed_off_count, 0);
}
