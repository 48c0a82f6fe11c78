// 🏷️ Runtime Adjustment Rules - Rules as Data
// One-shot startup mutation of movies.runtimeMinutes, keyed on genre substrings

/// A genre substring and the minutes added to movies whose genres contain it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeRule {
    pub genre: &'static str,
    pub minutes: i64,
}

/// Evaluated in order; the first matching rule wins.
pub const RUNTIME_RULES: &[RuntimeRule] = &[
    RuntimeRule { genre: "Documentary", minutes: 15 },
    RuntimeRule { genre: "Animation", minutes: 30 },
];

/// Applied when no rule matches (including NULL genres)
pub const DEFAULT_RUNTIME_MINUTES: i64 = 45;

/// Build the single bulk UPDATE for the movies relation.
///
/// Genres are matched with SQLite `LIKE`, so matching is a substring match
/// that ignores ASCII case.
pub fn runtime_update_sql() -> String {
    let branches = RUNTIME_RULES
        .iter()
        .map(|rule| {
            format!(
                "WHEN genres LIKE '%{}%' THEN runtimeMinutes + {}",
                rule.genre, rule.minutes
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "UPDATE movies SET runtimeMinutes = CASE {} ELSE runtimeMinutes + {} END",
        branches, DEFAULT_RUNTIME_MINUTES
    )
}

/// Minutes the update adds for a given genres value.
pub fn adjustment_for(genres: Option<&str>) -> i64 {
    let Some(genres) = genres else {
        return DEFAULT_RUNTIME_MINUTES;
    };
    let genres = genres.to_ascii_lowercase();

    RUNTIME_RULES
        .iter()
        .find(|rule| genres.contains(&rule.genre.to_ascii_lowercase()))
        .map(|rule| rule.minutes)
        .unwrap_or(DEFAULT_RUNTIME_MINUTES)
}
