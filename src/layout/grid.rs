use crate::config::GridConfig;
use crate::ir::{Position, Size};

/// Left edges for boxes of `widths` placed left to right from `start`.
pub fn place_row(widths: &[f32], gap: f32, start: f32) -> Vec<f32> {
    let mut lefts = Vec::with_capacity(widths.len());
    let mut cursor = start;
    for width in widths {
        lefts.push(cursor);
        cursor += width + gap;
    }
    lefts
}

pub fn row_width(widths: &[f32], gap: f32) -> f32 {
    if widths.is_empty() {
        return 0.0;
    }
    widths.iter().sum::<f32>() + gap * (widths.len() - 1) as f32
}

/// Fixed-column grid; each column is as wide as its widest box and each row
/// as tall as its tallest. Zero columns picks a roughly square grid.
pub fn place_grid(sizes: &[Size], config: &GridConfig) -> Vec<Position> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let columns = if config.columns == 0 {
        (sizes.len() as f32).sqrt().ceil() as usize
    } else {
        config.columns
    }
    .max(1);
    let rows = sizes.len().div_ceil(columns);

    let mut column_widths = vec![0.0f32; columns];
    let mut row_heights = vec![0.0f32; rows];
    for (idx, size) in sizes.iter().enumerate() {
        let (row, col) = (idx / columns, idx % columns);
        column_widths[col] = column_widths[col].max(size.width);
        row_heights[row] = row_heights[row].max(size.height);
    }

    let column_lefts = place_row(&column_widths, config.gap_x, 0.0);
    let row_tops = place_row(&row_heights, config.gap_y, 0.0);
    sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| {
            let (row, col) = (idx / columns, idx % columns);
            let x = column_lefts[col] + (column_widths[col] - size.width) / 2.0;
            Position::new(x, row_tops[row])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_is_sequential() {
        assert_eq!(place_row(&[10.0, 20.0, 5.0], 4.0, 0.0), vec![0.0, 14.0, 38.0]);
        assert!(place_row(&[], 4.0, 0.0).is_empty());
    }

    #[test]
    fn grid_wraps_after_column_count() {
        let sizes = vec![Size::new(10.0, 10.0); 5];
        let config = GridConfig {
            columns: 2,
            gap_x: 5.0,
            gap_y: 5.0,
        };
        let positions = place_grid(&sizes, &config);
        assert_eq!(positions[1], Position::new(15.0, 0.0));
        assert_eq!(positions[2], Position::new(0.0, 15.0));
        assert_eq!(positions[4], Position::new(0.0, 30.0));
    }

    #[test]
    fn auto_columns_are_square_ish() {
        let sizes = vec![Size::new(10.0, 10.0); 9];
        let positions = place_grid(&sizes, &GridConfig::default());
        assert_eq!(positions[3].y, positions[4].y);
        assert!(positions[3].y > positions[2].y);
    }
}
