use std::collections::HashMap;

use invitelist_core::Score;

/// Order candidates score-descending, breaking ties by ascending key.
#[must_use]
pub fn rank<K: Ord + Clone>(scores: &HashMap<K, Score>) -> Vec<(K, Score)> {
    let mut ranked: Vec<(K, Score)> = scores
        .iter()
        .map(|(key, score)| (key.clone(), *score))
        .collect();
    ranked.sort_unstable_by(|(a_key, a_score), (b_key, b_score)| {
        b_score.cmp(a_score).then_with(|| a_key.cmp(b_key))
    });
    ranked
}
