//! Output decoding

/// Index and value of the largest score.
///
/// The running maximum starts below every finite score and is only replaced
/// by a strictly greater value, so ties resolve to the earliest index and
/// NaN never wins. Returns `None` for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    if scores.is_empty() {
        return None;
    }

    let mut max = f32::NEG_INFINITY;
    let mut max_index = 0;
    for (i, &confidence) in scores.iter().enumerate() {
        if confidence > max {
            max = confidence;
            max_index = i;
        }
    }

    Some((max_index, scores[max_index]))
}
