//! Nearest-fit scale selection shared by both display axes.

/// Divisions of headroom either side of the zero-volt row.
pub const VERTICAL_HEADROOM_DIVISIONS: f32 = 3.0;
/// Grid width in divisions; autoscale wants two full periods across it.
pub const HORIZONTAL_DIVISIONS: f32 = 10.0;

/// Index of the smallest table entry whose span across `divisions` covers
/// `span`, or the largest entry when nothing does. Tables are short,
/// fixed and ascending, so a linear scan suffices and exhaustion is not
/// an error.
pub fn first_covering(table: &[f32], span: f32, divisions: f32) -> usize {
    table
        .iter()
        .position(|&s| s * divisions >= span)
        .unwrap_or(table.len().saturating_sub(1))
}

/// Smallest volts-per-division entry keeping the trace peak inside three
/// divisions of the centre row.
pub fn pick_vertical_scale(trace: &[f32], table: &[f32]) -> usize {
    let peak = trace.iter().fold(0.0f32, |peak, &v| peak.max(v.abs()));
    first_covering(table, peak, VERTICAL_HEADROOM_DIVISIONS)
}

/// Smallest time-per-division entry showing at least two full periods.
pub fn pick_horizontal_scale(table: &[f32], period_ms: f32) -> usize {
    first_covering(table, 2.0 * period_ms, HORIZONTAL_DIVISIONS)
}
