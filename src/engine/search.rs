use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;

use crate::aop::NodeKind;

use super::graph::GraphModel;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Nodes whose id or label fuzzy-matches `query`, best first. Equal scores
/// are ordered by id.
pub fn find_nodes(model: &GraphModel, query: &str, limit: usize) -> Vec<SearchMatch> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut matches = model
        .nodes()
        .iter()
        .filter_map(|node| {
            let by_id = fuzzy_match_score(&matcher, &node.id, query);
            let by_label = fuzzy_match_score(&matcher, &node.label, query);
            let score = by_id.max(by_label)?;
            Some(SearchMatch {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind,
                score,
            })
        })
        .collect::<Vec<_>>();

    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    matches.truncate(limit);
    matches
}
