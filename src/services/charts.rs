//! Chart data preparation.
//!
//! Every function here is pure: it takes records that were already fetched
//! and returns the series or graph a chart renders. Nothing is cached and
//! nothing is mutated, so calling an operation twice with the same input
//! yields the same output.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_utils::PeriodKey;
use crate::error::ChartError;

/// Category id reserved for the "All Categories" aggregate.
pub const ALL_CATEGORIES_ID: i64 = -1;

pub const ROOT_NODE_NAME: &str = "Total Spent";

/// Spending of one category over one period, with per-day burndown maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: i64,
    pub category_name: String,
    pub budget: Decimal,
    pub total_spent: Decimal,
    #[serde(default)]
    pub daily_spending: BTreeMap<u32, Decimal>,
    #[serde(default)]
    pub remaining_budget: BTreeMap<u32, Decimal>,
}

impl CategoryTotal {
    /// A total with no per-day breakdown.
    pub fn new(category_id: i64, category_name: impl Into<String>, total_spent: Decimal) -> Self {
        Self {
            category_id,
            category_name: category_name.into(),
            budget: Decimal::ZERO,
            total_spent,
            daily_spending: BTreeMap::new(),
            remaining_budget: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySeriesPoint {
    pub label: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyOverviewPoint {
    pub month: String,
    pub spent: Decimal,
    pub earned: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowPoint {
    pub month: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net_flow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownPoint {
    pub day: u32,
    pub remaining: Decimal,
    pub spent: Decimal,
}

/// What to do with a day that appears in only one of the two burndown maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingDayPolicy {
    /// Treat the missing side as 0 and keep the day.
    #[default]
    ZeroFill,
    /// Leave the day out of the series.
    Drop,
    /// Fail with [`ChartError::IncompleteBurndownData`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub category_id: i64,
    pub category_name: String,
    pub current_period_amount: Decimal,
    pub previous_period_amount: Decimal,
    pub difference: Decimal,
    /// `None` when the previous amount is zero and the current one is not.
    pub percentage_change: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub current_period_label: String,
    pub previous_period_label: String,
    pub categories: Vec<ComparisonRow>,
    pub total_current_period: Decimal,
    pub total_previous_period: Decimal,
    pub total_difference: Decimal,
    pub total_percentage_change: Option<Decimal>,
}

/// One month of the category timeline, with one `cat_<id>` entry per selected category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub month: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

/// Aggregate spending of one category, as fed to [`build_flow_graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAmount {
    pub category_id: i64,
    pub name: String,
    pub amount: Decimal,
}

/// A single record hanging below its category in the flow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRecord {
    pub name: String,
    pub category_id: i64,
    pub amount: Decimal,
}

/// Twelve points in calendar order; months missing from `records` are 0.
pub fn build_monthly_series(
    records: &BTreeMap<u32, Decimal>,
    labels: &[&str; 12],
) -> Vec<MonthlySeriesPoint> {
    if let Some(stray) = records.keys().find(|m| !(1..=12).contains(*m)) {
        tracing::debug!(month = stray, "Ignoring out-of-range month in monthly series");
    }

    labels
        .iter()
        .zip(1u32..)
        .map(|(label, month)| MonthlySeriesPoint {
            label: (*label).to_string(),
            value: records.get(&month).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Spent and earned side by side for the twelve months of a year.
pub fn build_monthly_overview(
    spent: &BTreeMap<u32, Decimal>,
    earned: &BTreeMap<u32, Decimal>,
    labels: &[&str; 12],
) -> Vec<MonthlyOverviewPoint> {
    build_monthly_series(spent, labels)
        .into_iter()
        .zip(build_monthly_series(earned, labels))
        .map(|(spent, earned)| MonthlyOverviewPoint {
            month: spent.label,
            spent: spent.value,
            earned: earned.value,
        })
        .collect()
}

pub fn build_cash_flow(
    income: &BTreeMap<u32, Decimal>,
    expenses: &BTreeMap<u32, Decimal>,
    labels: &[&str; 12],
) -> Vec<CashFlowPoint> {
    build_monthly_series(income, labels)
        .into_iter()
        .zip(build_monthly_series(expenses, labels))
        .map(|(inflow, outflow)| CashFlowPoint {
            month: inflow.label,
            net_flow: inflow.value - outflow.value,
            inflow: inflow.value,
            outflow: outflow.value,
        })
        .collect()
}

/// Day-by-day remaining budget and spend, ascending by day number.
pub fn build_burndown_series(
    category: &CategoryTotal,
    policy: MissingDayPolicy,
) -> Result<Vec<BurndownPoint>, ChartError> {
    let days: BTreeSet<u32> = category
        .daily_spending
        .keys()
        .chain(category.remaining_budget.keys())
        .copied()
        .collect();

    let mut points = Vec::with_capacity(days.len());
    for day in days {
        let spent = category.daily_spending.get(&day).copied();
        let remaining = category.remaining_budget.get(&day).copied();

        let (spent, remaining) = match (spent, remaining) {
            (Some(spent), Some(remaining)) => (spent, remaining),
            _ => match policy {
                MissingDayPolicy::Strict => {
                    return Err(ChartError::IncompleteBurndownData {
                        category_id: category.category_id,
                        day,
                    })
                }
                MissingDayPolicy::Drop => {
                    tracing::warn!(
                        category_id = category.category_id,
                        day,
                        "Dropping burndown day present on one side only"
                    );
                    continue;
                }
                MissingDayPolicy::ZeroFill => {
                    tracing::warn!(
                        category_id = category.category_id,
                        day,
                        "Zero-filling burndown day present on one side only"
                    );
                    (
                        spent.unwrap_or(Decimal::ZERO),
                        remaining.unwrap_or(Decimal::ZERO),
                    )
                }
            },
        };

        points.push(BurndownPoint {
            day,
            remaining,
            spent,
        });
    }

    Ok(points)
}

/// `(current - previous) / previous * 100`, guarded against a zero base.
pub fn percentage_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return current.is_zero().then_some(Decimal::ZERO);
    }
    (current - previous)
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
}

/// One row per category id seen in either period: current ids first in
/// their order, then ids only present in `previous`.
pub fn build_comparison_series(
    current: &[CategoryTotal],
    previous: &[CategoryTotal],
) -> Vec<ComparisonRow> {
    let mut order: Vec<(i64, &str)> = Vec::new();
    let mut seen = HashSet::new();
    for total in current.iter().chain(previous) {
        if seen.insert(total.category_id) {
            order.push((total.category_id, total.category_name.as_str()));
        }
    }

    let amount_in = |totals: &[CategoryTotal], id: i64| -> Decimal {
        totals
            .iter()
            .filter(|t| t.category_id == id)
            .map(|t| t.total_spent)
            .sum()
    };

    order
        .into_iter()
        .map(|(category_id, name)| {
            let current_amount = amount_in(current, category_id);
            let previous_amount = amount_in(previous, category_id);
            ComparisonRow {
                category_id,
                category_name: name.to_string(),
                current_period_amount: current_amount,
                previous_period_amount: previous_amount,
                difference: current_amount - previous_amount,
                percentage_change: percentage_change(current_amount, previous_amount),
            }
        })
        .collect()
}

pub fn summarize_comparison(
    current_label: impl Into<String>,
    previous_label: impl Into<String>,
    rows: Vec<ComparisonRow>,
) -> ComparisonResponse {
    let total_current: Decimal = rows.iter().map(|r| r.current_period_amount).sum();
    let total_previous: Decimal = rows.iter().map(|r| r.previous_period_amount).sum();

    ComparisonResponse {
        current_period_label: current_label.into(),
        previous_period_label: previous_label.into(),
        categories: rows,
        total_current_period: total_current,
        total_previous_period: total_previous,
        total_difference: total_current - total_previous,
        total_percentage_change: percentage_change(total_current, total_previous),
    }
}

pub fn timeline_key(category_id: i64) -> String {
    format!("cat_{category_id}")
}

/// One point per month of `window`, carrying every selected category's
/// total for that month (0 when absent).
pub fn build_category_timeline(
    window: &[PeriodKey],
    category_ids: &[i64],
    totals: &BTreeMap<(i64, PeriodKey), Decimal>,
) -> Vec<TimelinePoint> {
    window
        .iter()
        .map(|period| TimelinePoint {
            month: period.short_label(),
            values: category_ids
                .iter()
                .map(|id| {
                    let amount = totals
                        .get(&(*id, *period))
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    (timeline_key(*id), amount)
                })
                .collect(),
        })
        .collect()
}

/// Sankey structure: "Total Spent" → categories → (optionally) records.
///
/// Categories and records with a non-positive amount get no node. A record
/// whose category was left out is dropped rather than reattached.
pub fn build_flow_graph(
    total_spent: Decimal,
    category_totals: &[CategoryAmount],
    leaf_records: Option<&[LeafRecord]>,
) -> FlowGraph {
    let mut graph = FlowGraph {
        nodes: vec![FlowNode {
            name: ROOT_NODE_NAME.to_string(),
            value: total_spent,
        }],
        links: Vec::new(),
    };

    let mut category_nodes: BTreeMap<i64, usize> = BTreeMap::new();
    for category in category_totals {
        if category.amount <= Decimal::ZERO || category_nodes.contains_key(&category.category_id) {
            continue;
        }
        let index = graph.nodes.len();
        graph.nodes.push(FlowNode {
            name: category.name.clone(),
            value: category.amount,
        });
        graph.links.push(FlowLink {
            source: 0,
            target: index,
            value: category.amount,
        });
        category_nodes.insert(category.category_id, index);
    }

    for record in leaf_records.unwrap_or_default() {
        if record.amount <= Decimal::ZERO {
            continue;
        }
        let Some(&parent) = category_nodes.get(&record.category_id) else {
            continue;
        };
        let index = graph.nodes.len();
        graph.nodes.push(FlowNode {
            name: record.name.clone(),
            value: record.amount,
        });
        graph.links.push(FlowLink {
            source: parent,
            target: index,
            value: record.amount,
        });
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_utils::{months_ending_at, SHORT_MONTH_NAMES};

    fn d(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn total(id: i64, name: &str, spent: i64) -> CategoryTotal {
        CategoryTotal::new(id, name, d(spent))
    }

    fn category(id: i64, name: &str, amount: i64) -> CategoryAmount {
        CategoryAmount {
            category_id: id,
            name: name.to_string(),
            amount: d(amount),
        }
    }

    fn leaf(name: &str, category_id: i64, amount: i64) -> LeafRecord {
        LeafRecord {
            name: name.to_string(),
            category_id,
            amount: d(amount),
        }
    }

    #[test]
    fn test_monthly_series_is_zero_filled_for_empty_input() {
        let series = build_monthly_series(&BTreeMap::new(), &SHORT_MONTH_NAMES);
        assert_eq!(series.len(), 12);
        assert!(series.iter().all(|p| p.value.is_zero()));
        assert_eq!(series[0].label, "Jan");
        assert_eq!(series[11].label, "Dec");
    }

    #[test]
    fn test_monthly_series_places_values_in_calendar_order() {
        let records = BTreeMap::from([(12, d(5)), (3, d(7)), (13, d(99))]);
        let series = build_monthly_series(&records, &SHORT_MONTH_NAMES);

        assert_eq!(series.len(), 12);
        assert_eq!(series[2].value, d(7));
        assert_eq!(series[11].value, d(5));
        let sum: Decimal = series.iter().map(|p| p.value).sum();
        assert_eq!(sum, d(12));
    }

    #[test]
    fn test_cash_flow_net_is_inflow_minus_outflow() {
        let income = BTreeMap::from([(1, d(1000))]);
        let expenses = BTreeMap::from([(1, d(400)), (2, d(50))]);
        let flow = build_cash_flow(&income, &expenses, &SHORT_MONTH_NAMES);

        assert_eq!(flow.len(), 12);
        assert_eq!(flow[0].net_flow, d(600));
        assert_eq!(flow[1].inflow, d(0));
        assert_eq!(flow[1].net_flow, d(-50));
    }

    #[test]
    fn test_monthly_overview_pairs_spent_and_earned() {
        let spent = BTreeMap::from([(6, d(20))]);
        let earned = BTreeMap::from([(6, d(30))]);
        let overview = build_monthly_overview(&spent, &earned, &SHORT_MONTH_NAMES);
        assert_eq!(overview[5].month, "Jun");
        assert_eq!(overview[5].spent, d(20));
        assert_eq!(overview[5].earned, d(30));
    }

    #[test]
    fn test_burndown_days_sort_numerically() {
        let mut category = total(1, "Food", 0);
        category.daily_spending = BTreeMap::from([(2, d(1)), (10, d(2)), (1, d(3))]);
        category.remaining_budget = BTreeMap::from([(2, d(96)), (10, d(94)), (1, d(97))]);

        let series = build_burndown_series(&category, MissingDayPolicy::default()).unwrap();
        let days: Vec<u32> = series.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![1, 2, 10]);
        assert_eq!(series[2].remaining, d(94));
        assert_eq!(series[2].spent, d(2));
    }

    #[test]
    fn test_burndown_missing_day_policies() {
        let mut category = total(7, "Food", 0);
        category.daily_spending = BTreeMap::from([(1, d(5)), (2, d(5))]);
        category.remaining_budget = BTreeMap::from([(1, d(95))]);

        let filled = build_burndown_series(&category, MissingDayPolicy::ZeroFill).unwrap();
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[1].remaining, d(0));
        assert_eq!(filled[1].spent, d(5));

        let dropped = build_burndown_series(&category, MissingDayPolicy::Drop).unwrap();
        assert_eq!(dropped.len(), 1);

        let strict = build_burndown_series(&category, MissingDayPolicy::Strict);
        assert_eq!(
            strict,
            Err(ChartError::IncompleteBurndownData {
                category_id: 7,
                day: 2
            })
        );
    }

    #[test]
    fn test_burndown_of_empty_maps_is_empty() {
        let series = build_burndown_series(&total(1, "Food", 0), MissingDayPolicy::Strict).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_comparison_category_only_in_current() {
        let rows = build_comparison_series(&[total(1, "Food", 50)], &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_period_amount, d(50));
        assert_eq!(rows[0].previous_period_amount, d(0));
        assert_eq!(rows[0].difference, d(50));
        assert_eq!(rows[0].percentage_change, None);
    }

    #[test]
    fn test_comparison_both_zero_is_zero_percent() {
        let rows = build_comparison_series(&[total(1, "Food", 0)], &[total(1, "Food", 0)]);
        assert_eq!(rows[0].percentage_change, Some(d(0)));
    }

    #[test]
    fn test_comparison_covers_union_in_order() {
        let current = [total(2, "Transport", 30), total(1, "Food", 150)];
        let previous = [total(1, "Food", 100), total(3, "Housing", 900)];
        let rows = build_comparison_series(&current, &previous);

        let ids: Vec<i64> = rows.iter().map(|r| r.category_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let food = &rows[1];
        assert_eq!(food.difference, d(50));
        assert_eq!(food.percentage_change, Some(d(50)));

        let housing = &rows[2];
        assert_eq!(housing.current_period_amount, d(0));
        assert_eq!(housing.percentage_change, Some(d(-100)));
    }

    #[test]
    fn test_comparison_percentage_is_rounded() {
        assert_eq!(
            percentage_change(d(1), d(3)),
            Some(Decimal::new(-6667, 2))
        );
    }

    #[test]
    fn test_comparison_summary_totals() {
        let rows = build_comparison_series(&[total(1, "Food", 50)], &[]);
        let summary = summarize_comparison("March 2024", "February 2024", rows);
        assert_eq!(summary.total_current_period, d(50));
        assert_eq!(summary.total_difference, d(50));
        assert_eq!(summary.total_percentage_change, None);
    }

    #[test]
    fn test_comparison_serializes_absent_percentage_as_null() {
        let rows = build_comparison_series(&[total(1, "Food", 50)], &[]);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert!(json["percentageChange"].is_null());
        assert_eq!(json["categoryName"], "Food");
    }

    #[test]
    fn test_flow_graph_excludes_zero_categories_and_their_leaves() {
        let categories = [category(1, "Food", 80), category(2, "Fun", 0)];
        let leaves = [leaf("Lunch", 1, 80), leaf("Cinema", 2, 15)];
        let graph = build_flow_graph(d(80), &categories, Some(&leaves));

        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec![ROOT_NODE_NAME, "Food", "Lunch"]);
        assert_eq!(graph.links.len(), 2);
        assert_eq!((graph.links[1].source, graph.links[1].target), (1, 2));
    }

    #[test]
    fn test_flow_graph_root_outflow_matches_category_nodes() {
        let categories = [
            category(1, "Food", 80),
            category(2, "Transport", 20),
            category(3, "Housing", -5),
        ];
        let graph = build_flow_graph(d(100), &categories, None);

        let root_out: Decimal = graph
            .links
            .iter()
            .filter(|l| l.source == 0)
            .map(|l| l.value)
            .sum();
        let category_sum: Decimal = graph.nodes[1..].iter().map(|n| n.value).sum();
        assert_eq!(root_out, category_sum);
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn test_flow_graph_links_reference_valid_nodes() {
        let categories = [category(1, "Food", 80), category(2, "Transport", 20)];
        let leaves = [
            leaf("Lunch", 1, 50),
            leaf("Refund", 1, -10),
            leaf("Orphan", 9, 10),
            leaf("Bus", 2, 20),
        ];
        let graph = build_flow_graph(d(100), &categories, Some(&leaves));

        assert!(graph
            .links
            .iter()
            .all(|l| l.source < graph.nodes.len() && l.target < graph.nodes.len()));
        assert_eq!(graph.nodes.len(), 5);
    }

    #[test]
    fn test_flow_graph_of_empty_input_is_root_only() {
        let graph = build_flow_graph(Decimal::ZERO, &[], None);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_timeline_zero_fills_missing_months() {
        let window = months_ending_at(2024, 2, 3);
        let totals = BTreeMap::from([((1, window[1]), d(40))]);
        let timeline = build_category_timeline(&window, &[1, 2], &totals);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].month, "Dec 2023");
        assert_eq!(timeline[1].values["cat_1"], d(40));
        assert_eq!(timeline[1].values["cat_2"], d(0));

        let json = serde_json::to_value(&timeline[1]).unwrap();
        assert_eq!(json["month"], "Jan 2024");
        assert!(json.get("cat_1").is_some());
    }

    #[test]
    fn test_operations_are_idempotent() {
        let categories = [category(1, "Food", 80)];
        let leaves = [leaf("Lunch", 1, 80)];
        assert_eq!(
            build_flow_graph(d(80), &categories, Some(&leaves)),
            build_flow_graph(d(80), &categories, Some(&leaves))
        );

        let current = [total(1, "Food", 10)];
        assert_eq!(
            build_comparison_series(&current, &[]),
            build_comparison_series(&current, &[])
        );
    }
}
