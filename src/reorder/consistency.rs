//! Detection of gaps and duplicates in a scope's display orders

use std::collections::BTreeMap;
use std::fmt;

use crate::types::ParentType;

const MAX_REPORTED_MISSING: usize = 50;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConsistencyReport {
    pub parent_type: ParentType,
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Orders held by more than one field.
    pub duplicates: Vec<i64>,
    /// Orders inside `[min, max]` held by no field, capped for very sparse scopes.
    pub missing: Vec<i64>,
    pub missing_count: u64,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.duplicates.is_empty() && self.missing_count == 0
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return match (self.min, self.max) {
                (Some(min), Some(max)) => write!(
                    f,
                    "{} fields: {} ordered {}..={}",
                    self.parent_type, self.count, min, max
                ),
                _ => write!(f, "{} fields: empty", self.parent_type),
            };
        }

        write!(f, "{} fields: {} inconsistent", self.parent_type, self.count)?;
        if !self.duplicates.is_empty() {
            write!(f, "; duplicate orders {}", join_orders(&self.duplicates))?;
        }
        if self.missing_count > 0 {
            write!(f, "; missing orders {}", join_orders(&self.missing))?;
            let unreported = self.missing_count.saturating_sub(self.missing.len() as u64);
            if unreported > 0 {
                write!(f, " (+{unreported} more)")?;
            }
        }
        Ok(())
    }
}

fn join_orders(orders: &[i64]) -> String {
    orders
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn check_orders(
    parent_type: ParentType,
    orders: impl IntoIterator<Item = i64>,
) -> ConsistencyReport {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    let mut count = 0;
    for order in orders {
        *counts.entry(order).or_default() += 1;
        count += 1;
    }

    let min = counts.keys().next().copied();
    let max = counts.keys().next_back().copied();
    let duplicates = counts
        .iter()
        .filter(|(_, seen)| **seen > 1)
        .map(|(order, _)| *order)
        .collect();

    let (missing, missing_count) = match (min, max) {
        (Some(min), Some(max)) => {
            let span = max.abs_diff(min).saturating_add(1);
            let missing_count = span.saturating_sub(counts.len() as u64);
            let missing = (min..=max)
                .filter(|order| !counts.contains_key(order))
                .take(MAX_REPORTED_MISSING)
                .collect();
            (missing, missing_count)
        }
        _ => (Vec::new(), 0),
    };

    ConsistencyReport {
        parent_type,
        count,
        min,
        max,
        duplicates,
        missing,
        missing_count,
    }
}
