use std::collections::HashSet;

use crate::layout::grid::{
    AdaptiveRule, ContentMetrics, GridConfig, LayoutSlot, RuleAction, RuleCondition,
};

/// Font size assumed by `change_font_size` when the slot has no override.
pub const DEFAULT_RULE_FONT_SIZE: i64 = 56;

/// Smallest font size `change_font_size` can produce.
pub const MIN_RULE_FONT_SIZE: i64 = 24;

impl RuleCondition {
    pub fn holds(self, count: usize, threshold: i64) -> bool {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        match self {
            Self::LinesGt => count > threshold,
            Self::LinesLt => count < threshold,
            Self::HasContent => count > 0,
            Self::NoContent => count == 0,
        }
    }
}

impl AdaptiveRule {
    pub fn triggered_by(&self, metrics: &ContentMetrics) -> bool {
        self.condition
            .holds(metrics.get(&self.slot_name), self.threshold)
    }
}

/// Fold `grid.adaptive_rules` over copies of `grid.slots`.
///
/// Rules read only from `metrics`, so declaration order only decides which write wins when
/// several rules touch the same field. Hidden slots still receive other rules' adjustments but
/// are dropped from the result. The result keeps declaration order; `grid` is never modified.
pub fn apply_adaptive_rules(grid: &GridConfig, metrics: &ContentMetrics) -> Vec<LayoutSlot> {
    let mut slots = grid.slots.clone();
    let mut hidden: HashSet<&str> = HashSet::new();

    let max_col = i64::from(grid.cols.max(1)) - 1;
    let max_row = i64::from(grid.rows.max(1)) - 1;

    for rule in &grid.adaptive_rules {
        if !rule.triggered_by(metrics) {
            continue;
        }
        let Some(target) = slots.iter_mut().find(|s| s.name == rule.target_slot) else {
            tracing::warn!(
                rule_target = %rule.target_slot,
                observed = %rule.slot_name,
                "adaptive rule target not found, skipping"
            );
            continue;
        };

        let value = i64::from(rule.value);
        match rule.action {
            RuleAction::ShiftRow => {
                target.row_start = clamp_i32(i64::from(target.row_start) + value, 0, max_row);
            }
            RuleAction::ShiftCol => {
                target.col_start = clamp_i32(i64::from(target.col_start) + value, 0, max_col);
            }
            RuleAction::ResizeRow => {
                target.row_span = clamp_i32(i64::from(target.row_span) + value, 1, i64::MAX);
            }
            RuleAction::ResizeCol => {
                target.col_span = clamp_i32(i64::from(target.col_span) + value, 1, i64::MAX);
            }
            RuleAction::ChangeFontSize => {
                let current = target
                    .font_size
                    .map(i64::from)
                    .unwrap_or(DEFAULT_RULE_FONT_SIZE);
                let next = (current + value).max(MIN_RULE_FONT_SIZE);
                target.font_size = Some(u32::try_from(next).unwrap_or(u32::MAX));
            }
            RuleAction::Hide => {
                hidden.insert(rule.target_slot.as_str());
            }
        }
    }

    slots.retain(|s| !hidden.contains(s.name.as_str()));
    slots
}

fn clamp_i32(v: i64, min: i64, max: i64) -> i32 {
    v.clamp(min, max)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/layout/rules.rs"]
mod tests;
