use std::collections::HashMap;

use serde::Serialize;

use super::domain::{DeductionCode, DeductionRecord, Employee, IncentiveTier, TierId};

/// Number of entries reported by [`top_violations`].
pub const TOP_VIOLATION_LIMIT: usize = 5;

/// First tier, in iteration order, whose inclusive range covers `score`.
///
/// Overlapping tiers are not rejected anywhere; the earliest one wins.
pub fn matching_tier(score: u8, tiers: &[IncentiveTier]) -> Option<&IncentiveTier> {
    tiers.iter().find(|tier| tier.covers(score))
}

/// Payable incentive for `score`. Ineligible employees always receive nothing, and a
/// score no tier covers pays nothing either.
pub fn resolve_incentive(score: u8, tiers: &[IncentiveTier], is_ineligible: bool) -> u32 {
    if is_ineligible {
        return 0;
    }

    matching_tier(score, tiers)
        .map(|tier| tier.amount)
        .unwrap_or(0)
}

pub fn employee_incentive(employee: &Employee, tiers: &[IncentiveTier]) -> u32 {
    resolve_incentive(employee.score, tiers, employee.no_position_allowance)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeBand {
    pub tier_id: TierId,
    pub name: String,
    pub min_score: u8,
    pub max_score: u8,
    pub amount: u32,
    pub count: usize,
    pub percentage: f32,
}

/// Employees per tier, highest band first.
pub fn grade_distribution(employees: &[Employee], tiers: &[IncentiveTier]) -> Vec<GradeBand> {
    let total = employees.len();
    let mut ordered: Vec<&IncentiveTier> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.min_score.cmp(&a.min_score));

    ordered
        .into_iter()
        .map(|tier| {
            let count = employees
                .iter()
                .filter(|employee| tier.covers(employee.score))
                .count();
            GradeBand {
                tier_id: tier.id.clone(),
                name: tier.name.clone(),
                min_score: tier.min_score,
                max_score: tier.max_score,
                amount: tier.amount,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationFrequency {
    pub code: String,
    pub description: String,
    pub count: usize,
    pub percentage: f32,
}

/// Most frequent violation codes across the whole record log.
///
/// Descriptions come from the current catalog, so codes deleted since are reported as
/// `Unknown`. Equal counts keep the order in which codes first appear in `records`.
pub fn top_violations(
    records: &[DeductionRecord],
    codes: &[DeductionCode],
) -> Vec<ViolationFrequency> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for record in records {
        let code = record.deduction_code_code.as_str();
        match positions.get(code) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(code, counts.len());
                counts.push((code, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_VIOLATION_LIMIT)
        .map(|(code, count)| ViolationFrequency {
            code: code.to_string(),
            description: codes
                .iter()
                .find(|entry| entry.code == code)
                .map(|entry| entry.description.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            count,
            percentage: percentage(count, records.len()),
        })
        .collect()
}

pub(crate) fn percentage(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32 * 100.0
    }
}
