use cityfinder_data_processing::CityRecord;
use tracing::debug;

use super::CityHit;

/// Splits a name query on single spaces.
///
/// Repeated spaces produce empty tokens; they are kept and match anything.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split(' ').map(str::to_ascii_lowercase).collect()
}

/// Whether `tokens` occur in `name`, in order and without overlapping.
///
/// Same as matching the wildcard pattern `*t1*t2*...*tN*` ASCII case-insensitively,
/// with every token taken literally. `tokens` must already be lowercase.
pub fn matches_ordered<S: AsRef<str>>(name: &str, tokens: &[S]) -> bool {
    let name = name.to_ascii_lowercase();
    let mut rest = name.as_str();
    for token in tokens {
        let token = token.as_ref();
        match rest.find(token) {
            Some(start) => rest = &rest[start + token.len()..],
            None => return false,
        }
    }
    true
}

/// Limit for a name query: a positive `top_k`, otherwise `default_limit`.
pub fn resolve_limit(top_k: Option<i64>, default_limit: usize) -> usize {
    top_k
        .filter(|&k| k > 0)
        .and_then(|k| usize::try_from(k).ok())
        .unwrap_or(default_limit)
}

/// Candidates whose ASCII name matches `query`, sorted by ASCII name and cut to `limit`.
///
/// Candidates with the same ASCII name keep their incoming order.
pub fn match_by_name<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<CityHit>
where
    I: IntoIterator<Item = &'a CityRecord>,
{
    let tokens = tokenize(query);

    let mut matched: Vec<&CityRecord> = candidates
        .into_iter()
        .filter(|city| matches_ordered(&city.asciiname, &tokens))
        .collect();
    debug!(?tokens, matched = matched.len(), limit, "Matched by name");

    matched.sort_by(|a, b| a.asciiname.cmp(&b.asciiname));
    matched.truncate(limit);

    matched.into_iter().map(CityHit::from).collect()
}
