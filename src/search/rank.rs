use crate::models::Asset;

/// Per-token weights by matched field: domain > direction > color > print.
pub const DOMAIN_WEIGHT: u32 = 40;
pub const DIRECTION_WEIGHT: u32 = 30;
pub const COLOR_WEIGHT: u32 = 20;
pub const PRINT_WEIGHT: u32 = 10;

/// Candidate rows pulled from the store before local ranking.
pub const RANKED_OVERFETCH: usize = 80;

fn contains(hay: Option<&str>, needle: &str) -> bool {
    hay.map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Sum of field weights for every token that matches each field.
pub fn score_asset(asset: &Asset, tokens: &[String]) -> u32 {
    tokens
        .iter()
        .map(|t| {
            let mut score = 0;
            if contains(asset.domain.as_deref(), t) {
                score += DOMAIN_WEIGHT;
            }
            if contains(asset.direction.as_deref(), t) {
                score += DIRECTION_WEIGHT;
            }
            if contains(asset.color_notes.as_deref(), t) {
                score += COLOR_WEIGHT;
            }
            if contains(asset.print_pattern_notes.as_deref(), t) {
                score += PRINT_WEIGHT;
            }
            score
        })
        .sum()
}

/// Score, stable-sort descending, truncate to `limit`.
pub fn rank_assets(assets: Vec<Asset>, tokens: &[String], limit: usize) -> Vec<(Asset, u32)> {
    let mut scored: Vec<(Asset, u32)> = assets
        .into_iter()
        .map(|a| {
            let score = score_asset(&a, tokens);
            (a, score)
        })
        .collect();
    // sort_by is stable: equal scores keep store order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}
