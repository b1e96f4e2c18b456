/// Case-insensitive title similarity in [0.0, 1.0]. Identical strings score
/// 1.0, disjoint strings approach 0.0, and the score grows monotonically with
/// shared content. Used for every title comparison so verification thresholds
/// behave consistently.
pub fn title_similarity(a: &str, b: &str) -> f64 {
	strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}
