//! "Did you mean" hints for misspelled block keywords and helper names

/// Edit distance beyond which a candidate is not offered.
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Levenshtein distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }

    // Single rolling row: row[j] is the distance between the current prefix of `a` and b[..j].
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != *cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[b_chars.len()]
}

/// Candidates within `max_distance` of `query`, closest first, at most three.
///
/// Comparison ignores ASCII case, so `IfEquals` finds `ifEquals`.
pub fn suggest<'a>(query: &str, candidates: &[&'a str], max_distance: usize) -> Vec<&'a str> {
    let query = query.to_lowercase();

    let mut scored: Vec<(&str, usize)> = candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein_distance(&query, &candidate.to_lowercase())))
        .filter(|(_, distance)| *distance <= max_distance)
        .collect();

    // Stable sort keeps candidate order for ties.
    scored.sort_by_key(|(_, distance)| *distance);
    scored.into_iter().take(3).map(|(candidate, _)| candidate).collect()
}

/// Format a hint such as `Did you mean 'if' or 'each'?`.
pub fn format_suggestion(suggestions: &[&str]) -> Option<String> {
    match suggestions {
        [] => None,
        [only] => Some(format!("Did you mean '{}'?", only)),
        [first, second] => Some(format!("Did you mean '{}' or '{}'?", first, second)),
        [first, second, third, ..] => {
            Some(format!("Did you mean '{}', '{}', or '{}'?", first, second, third))
        }
    }
}

/// [`suggest`] and [`format_suggestion`] with the default distance.
pub fn did_you_mean(query: &str, candidates: &[&str]) -> Option<String> {
    format_suggestion(&suggest(query, candidates, MAX_SUGGESTION_DISTANCE))
}
