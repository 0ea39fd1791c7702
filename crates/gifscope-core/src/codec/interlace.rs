/// `(first row, row step)` of the four interlace passes, in transmission order.
pub const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Reorder rows transmitted in interlaced pass order into top-to-bottom order.
///
/// Input rows are consumed strictly in arrival order; rows the input is too
/// short to fill stay zero.
pub fn deinterlace(indexes: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut output = vec![0u8; indexes.len()];
    if width == 0 {
        return output;
    }
    let mut rows = indexes.chunks(width);
    for (first, step) in INTERLACE_PASSES {
        for row in (first..height).step_by(step) {
            let Some(source) = rows.next() else {
                return output;
            };
            let start = row * width;
            let end = (start + source.len()).min(output.len());
            if start >= end {
                continue;
            }
            output[start..end].copy_from_slice(&source[..end - start]);
        }
    }
    output
}
