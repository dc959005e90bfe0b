use std::collections::BTreeMap;
use std::fmt::Write;

use crate::credit;
use crate::models::{Activity, TypeSummary};
use crate::view::ViewState;

pub fn summarize_by_type(activities: &[&Activity]) -> Vec<TypeSummary> {
    let mut map: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();

    for activity in activities {
        let entry = map
            .entry(activity.activity_type.clone())
            .or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += activity.amount;
        entry.2 += credit::activity_credit(activity);
    }

    let mut summaries: Vec<TypeSummary> = map
        .into_iter()
        .map(|(activity_type, (count, amount, credit))| TypeSummary {
            activity_type,
            count,
            amount,
            credit,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.credit
            .partial_cmp(&a.credit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

pub fn format_balance(balance: Option<f64>) -> String {
    match balance {
        Some(value) => format!("{value}"),
        None => "unknown".to_string(),
    }
}

pub fn build_report(state: &ViewState) -> String {
    let visible = state.visible_activities();
    let summaries = summarize_by_type(&visible);

    let mut output = String::new();
    let wallet_label = if state.wallet_address.is_empty() {
        "no wallet"
    } else {
        state.wallet_address.as_str()
    };
    let filter_label = state
        .filter
        .map(|activity_type| activity_type.label())
        .unwrap_or("all types");

    let _ = writeln!(output, "# Carbon Activity Report");
    let _ = writeln!(
        output,
        "Wallet {} (balance {}), showing {}",
        wallet_label,
        format_balance(state.balance),
        filter_label
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Total credit: {}", state.total_credit());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Activity Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No activities recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} activities, amount {}, credit {}",
                summary.activity_type, summary.count, summary.amount, summary.credit
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activities");

    if visible.is_empty() {
        let _ = writeln!(output, "No activities recorded.");
    } else {
        for activity in visible.iter() {
            let when = activity
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                output,
                "- {} {} x {} = {} credit ({}, {})",
                when,
                activity.activity_type,
                activity.amount,
                credit::activity_credit(activity),
                activity.wallet_address,
                activity.id
            );
        }
    }

    output
}
