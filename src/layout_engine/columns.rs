//! Pure column/row arithmetic behind the autotile placement engine. All
//! functions are side-effect free and total over their clamped inputs.

/// Picks the number of columns to tile `window_count` windows into.
///
/// A single window is never split. Desktops at or below the ultrawide
/// threshold are capped at 2 columns, since narrower columns stop being
/// usable on standard-aspect displays.
pub fn column_count(
    window_count: usize,
    desired: usize,
    desktop_width: i32,
    ultrawide_threshold: i32,
    columns_max: usize,
) -> usize {
    let mut cols = if window_count <= 1 {
        1
    } else {
        window_count.min(desired)
    };

    let is_ultrawide = desktop_width > ultrawide_threshold;
    if !is_ultrawide && cols > 2 {
        cols = 2;
    }

    cols.clamp(1, columns_max.max(1))
}

/// Index of the column the master windows land in. A fixed visual-balance
/// table, not a computed optimum: the master sits to the right of center
/// for small counts and at the lower-center beyond that.
pub fn master_column(columns: usize) -> usize {
    match columns {
        0 | 1 => 0,
        2 | 3 => 1,
        4 => 2,
        n => n / 2,
    }
}

/// Distributes `window_count` windows over `columns` columns, returning the
/// row count per column (summing to `window_count`).
///
/// With more windows than columns, every column is seeded with one row and
/// the surplus goes to non-master columns first: the emptiest slave column
/// (lowest index on ties) keeps receiving windows until every slave column
/// holds at least 2, and only then does the master column start growing.
pub fn rows_per_column(window_count: usize, columns: usize, master_column: usize) -> Vec<usize> {
    let columns = columns.max(1);
    let mut rows = vec![0usize; columns];

    if window_count <= columns {
        for slot in rows.iter_mut().take(window_count) {
            *slot = 1;
        }
        return rows;
    }

    rows.fill(1);
    let mut remaining = window_count - columns;

    while remaining > 0 {
        let hungry_slave = rows
            .iter()
            .enumerate()
            .filter(|&(col, &count)| col != master_column && count < 2)
            .map(|(col, _)| col)
            .min_by_key(|&col| rows[col]);

        match hungry_slave {
            Some(col) => rows[col] += 1,
            None => rows[master_column.min(columns - 1)] += 1,
        }
        remaining -= 1;
    }

    rows
}

/// Converts the in-use prefix of the proportion table into per-column pixel
/// widths summing exactly to `desktop_width`.
///
/// The prefix is normalized to 1 (entries past the table default to an equal
/// share), each normalized share is floored at `proportion_min` without
/// re-normalizing, and the rounding remainder lands on the last column.
pub fn column_widths(
    desktop_width: i32,
    columns: usize,
    proportions: &[f64],
    proportion_min: f64,
) -> Vec<i32> {
    let columns = columns.max(1);
    if columns == 1 {
        return vec![desktop_width];
    }

    let equal = 1.0 / columns as f64;
    let total: f64 = (0..columns)
        .map(|col| proportions.get(col).copied().unwrap_or(equal))
        .sum();

    let mut widths: Vec<i32> = (0..columns)
        .map(|col| {
            let prop = match proportions.get(col) {
                Some(&p) if total > 0.0 => p / total,
                _ => equal,
            };
            let prop = prop.max(proportion_min);
            (desktop_width as f64 * prop).round() as i32
        })
        .collect();

    let sum: i32 = widths.iter().sum();
    if sum != desktop_width {
        widths[columns - 1] += desktop_width - sum;
    }

    widths
}
