use chrono::NaiveDate;
use conduct_score::ledger::{DeductionRequest, Ledger, LedgerError, LedgerSnapshot};
use conduct_score::scoring::{
    recalculate_monthly_score, resolve_incentive, CodeId, DeductionCode, DeductionRecord,
    Employee, EmployeeId, IncentiveTier, MonthKey, RecordDate, RecordId, TierId,
};

fn code(id: &str, points: u32) -> DeductionCode {
    DeductionCode {
        id: CodeId::new(id),
        code: id.to_string(),
        category: "Operations".to_string(),
        description: format!("{id} violation"),
        points,
    }
}

fn employee_with_score(id: &str, score: u8) -> Employee {
    let mut employee = Employee::new(id, "Test", "Operator");
    employee.score = score;
    employee
}

fn tiers() -> Vec<IncentiveTier> {
    [(90, 100, 2000), (80, 89, 1500), (0, 69, 0)]
        .into_iter()
        .enumerate()
        .map(|(index, (min, max, amount))| IncentiveTier {
            id: TierId::new(format!("T-{index}")),
            name: format!("Tier {index}"),
            min_score: min,
            max_score: max,
            amount,
        })
        .collect()
}

fn ledger(employees: Vec<Employee>) -> Ledger {
    Ledger::from_snapshot(LedgerSnapshot {
        employees,
        deduction_codes: vec![code("OPS30", 30), code("NOOP", 0)],
        incentive_tiers: tiers(),
        ..LedgerSnapshot::default()
    })
}

fn request(employee_id: &str, code_id: &str) -> DeductionRequest {
    DeductionRequest {
        employee_id: EmployeeId::new(employee_id),
        deduction_code_id: CodeId::new(code_id),
        date: NaiveDate::from_ymd_opt(2024, 5, 3).expect("valid date"),
        remark: String::new(),
    }
}

fn month(raw: &str) -> MonthKey {
    MonthKey::parse(raw).expect("valid month")
}

#[test]
fn deduction_within_score_leaves_pending_alone() {
    let ledger = ledger(vec![employee_with_score("E1", 100)]);

    let (next, outcome) = ledger
        .apply_deduction(request("E1", "OPS30"), RecordId::new("R1"))
        .expect("deduction applies");

    assert_eq!(outcome.employee.score, 70);
    assert_eq!(outcome.employee.pending_deduction_points, 0);
    assert_eq!(outcome.record.carried_over_points, 0);
    assert_eq!(outcome.record.points, 30);
    assert_eq!(next.employee(&EmployeeId::new("E1")).map(|e| e.score), Some(70));
    assert_eq!(next.version(), ledger.version() + 1);
}

#[test]
fn deduction_beyond_score_carries_deficit_forward() {
    let ledger = ledger(vec![employee_with_score("E1", 10)]);

    let (next, outcome) = ledger
        .apply_deduction(request("E1", "OPS30"), RecordId::new("R1"))
        .expect("deduction applies");

    assert_eq!(outcome.employee.score, 0);
    assert_eq!(outcome.employee.pending_deduction_points, 20);
    assert_eq!(outcome.record.carried_over_points, 20);
    assert_eq!(next.records()[0].id, RecordId::new("R1"));
}

#[test]
fn zero_cost_deduction_changes_nothing_but_the_log() {
    let mut employee = employee_with_score("E1", 40);
    employee.pending_deduction_points = 7;
    let ledger = ledger(vec![employee.clone()]);

    let (next, outcome) = ledger
        .apply_deduction(request("E1", "NOOP"), RecordId::new("R1"))
        .expect("deduction applies");

    assert_eq!(outcome.employee, employee);
    assert_eq!(outcome.carried_over(), 0);
    assert_eq!(next.records().len(), 1);
}

#[test]
fn padded_employee_ids_resolve_to_the_same_employee() {
    let ledger = ledger(vec![employee_with_score("65020007", 100)]);

    let (next, _) = ledger
        .apply_deduction(request(" 65020007 ", "OPS30"), RecordId::new("R1"))
        .expect("deduction applies");

    assert_eq!(next.employees().len(), 1);
    assert_eq!(next.employees()[0].score, 70);
}

#[test]
fn unknown_employee_or_code_fails_without_new_version() {
    let ledger = ledger(vec![employee_with_score("E1", 100)]);

    assert_eq!(
        ledger
            .apply_deduction(request("E9", "OPS30"), RecordId::new("R1"))
            .map(|_| ()),
        Err(LedgerError::EmployeeNotFound(EmployeeId::new("E9")))
    );
    assert_eq!(
        ledger
            .apply_deduction(request("E1", "MISSING"), RecordId::new("R1"))
            .map(|_| ()),
        Err(LedgerError::CodeNotFound(CodeId::new("MISSING")))
    );
    assert!(ledger.records().is_empty());
    assert_eq!(ledger.version(), 0);
}

#[test]
fn monthly_recalculation_uses_only_that_months_records() {
    let record = |id: &str, date: &str, points: u32| DeductionRecord {
        id: RecordId::new(id),
        employee_id: EmployeeId::new("E1"),
        deduction_code_id: CodeId::new("OPS"),
        deduction_code_code: "OPS".to_string(),
        deduction_description: String::new(),
        date: RecordDate::normalize(date),
        points,
        fine_amount: 0,
        remark: String::new(),
        carried_over_points: 0,
    };
    let records = vec![record("R1", "2024-05-03", 10), record("R2", "2024-06-01", 5)];
    let e1 = EmployeeId::new("E1");

    assert_eq!(recalculate_monthly_score(&e1, &records, &month("2024-05")), 90);
    assert_eq!(recalculate_monthly_score(&e1, &records, &month("2024-06")), 95);
    assert_eq!(recalculate_monthly_score(&e1, &records, &month("2024-07")), 100);
    assert_eq!(recalculate_monthly_score(&e1, &records, &month("2024-05")), 90);
}

#[test]
fn rescoring_resets_score_but_keeps_pending_points() {
    let mut employee = employee_with_score("E1", 10);
    employee.pending_deduction_points = 20;
    let ledger = ledger(vec![employee]);

    let rescored = ledger.rescored_for(&month("2024-07"));

    let stored = rescored
        .employee(&EmployeeId::new("E1"))
        .expect("employee kept");
    assert_eq!(stored.score, 100);
    assert_eq!(stored.pending_deduction_points, 20);
}

#[test]
fn tier_gaps_and_ineligibility_pay_nothing() {
    assert_eq!(resolve_incentive(75, &tiers(), false), 0);
    assert_eq!(resolve_incentive(95, &tiers(), true), 0);
    assert_eq!(resolve_incentive(95, &tiers(), false), 2000);
    assert_eq!(resolve_incentive(100, &[], true), 0);
}
