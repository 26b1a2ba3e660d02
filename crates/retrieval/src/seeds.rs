//! Seed search
//!
//! A node scores one point for every question token found inside its
//! normalized title. Zero-score nodes are discarded; the rest are ordered by
//! (score, PageRank) descending with node order breaking remaining ties.

use chronograph_common::text::count_token_hits;

/// A title as seen by seed search
#[derive(Debug, Clone, Copy)]
pub struct SeedCandidate<'a> {
    pub title: &'a str,
    pub normalized_title: &'a str,
    pub pagerank: f64,
}

/// Up to `top_k` titles matching the question tokens
pub fn rank_seeds<'a, I>(tokens: &[String], candidates: I, top_k: usize) -> Vec<String>
where
    I: IntoIterator<Item = SeedCandidate<'a>>,
{
    if tokens.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, SeedCandidate<'a>)> = candidates
        .into_iter()
        .map(|c| (count_token_hits(tokens, c.normalized_title), c))
        .filter(|(hits, _)| *hits > 0)
        .collect();

    scored.sort_by(|(hits_a, a), (hits_b, b)| {
        hits_b
            .cmp(hits_a)
            .then_with(|| b.pagerank.total_cmp(&a.pagerank))
    });

    scored
        .into_iter()
        .take(top_k)
        .map(|(_, c)| c.title.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronograph_common::text::{match_tokens, normalize_for_match};

    fn candidates(rows: &[(&'static str, f64)]) -> Vec<(String, String, f64)> {
        rows.iter()
            .map(|(t, pr)| (t.to_string(), normalize_for_match(t), *pr))
            .collect()
    }

    fn run(question: &str, rows: &[(&'static str, f64)], k: usize) -> Vec<String> {
        let owned = candidates(rows);
        rank_seeds(
            &match_tokens(question),
            owned.iter().map(|(t, n, pr)| SeedCandidate {
                title: t,
                normalized_title: n,
                pagerank: *pr,
            }),
            k,
        )
    }

    #[test]
    fn test_accented_question_finds_title() {
        let seeds = run(
            "Cha của Minh Mạng là ai?",
            &[("Gia Long", 0.3), ("Minh Mạng", 0.2), ("Huế", 0.1)],
            5,
        );
        assert_eq!(seeds, vec!["Minh Mạng"]);
    }

    #[test]
    fn test_more_hits_beat_pagerank() {
        let seeds = run(
            "minh mang",
            &[("Minh Hoàng", 0.9), ("Minh Mạng", 0.1)],
            5,
        );
        assert_eq!(seeds, vec!["Minh Mạng", "Minh Hoàng"]);
    }

    #[test]
    fn test_pagerank_breaks_equal_hits_and_k_caps() {
        let seeds = run(
            "vua",
            &[("Vua Gia Long", 0.1), ("Vua Minh Mạng", 0.4), ("Vua Tự Đức", 0.2)],
            2,
        );
        assert_eq!(seeds, vec!["Vua Minh Mạng", "Vua Tự Đức"]);
    }

    #[test]
    fn test_nan_pagerank_keeps_a_total_order() {
        let seeds = run(
            "vua",
            &[("Vua Gia Long", 0.1), ("Vua Minh Mạng", f64::NAN.abs()), ("Vua Tự Đức", 0.2)],
            3,
        );
        assert_eq!(seeds, vec!["Vua Minh Mạng", "Vua Tự Đức", "Vua Gia Long"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(run("xyz", &[("Gia Long", 0.5)], 5).is_empty());
        assert!(run("   ", &[("Gia Long", 0.5)], 5).is_empty());
        assert!(run("Gia Long", &[("Gia Long", 0.5)], 0).is_empty());
    }
}
