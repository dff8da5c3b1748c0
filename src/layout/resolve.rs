use crate::foundation::core::PixelRect;
use crate::layout::grid::{ContentMetrics, GridConfig, LayoutSlot};
use crate::layout::rules::apply_adaptive_rules;

/// A slot after adaptive rules, paired with its pixel rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlot {
    pub slot: LayoutSlot,
    pub rect: PixelRect,
}

/// Apply adaptive rules for `metrics` and compute pixel rects.
///
/// Output is in declaration order; callers sort by `z_index` when painting.
pub fn resolve_layout(grid: &GridConfig, metrics: &ContentMetrics) -> Vec<ResolvedSlot> {
    apply_adaptive_rules(grid, metrics)
        .into_iter()
        .map(|slot| {
            let rect = grid.slot_pixel_rect(&slot);
            ResolvedSlot { slot, rect }
        })
        .collect()
}

/// Stable ascending sort by `z_index`; ties keep declaration order.
pub fn paint_order(slots: &mut [ResolvedSlot]) {
    slots.sort_by_key(|r| r.slot.z_index);
}
