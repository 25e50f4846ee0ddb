//! Keyword scoring over record fields
//!
//! Query terms are matched against the label, category, section and body of
//! each record after accent and case folding. Numbers in the query are
//! compared with the numbers in the article label.

use crate::normalize::normalize;
use lexdz_common::config::WeightProfile;
use lexdz_common::Record;
use std::cmp::Ordering;

/// French function words ignored by the scorer (folded form, longer than two chars)
const STOP_WORDS: &[&str] = &[
    "les", "des", "une", "aux", "pour", "par", "sur", "dans", "avec", "sans", "sous", "est",
    "sont", "etre", "ete", "avoir", "que", "qui", "quoi", "quel", "quelle", "quels", "quelles",
    "cet", "cette", "ces", "son", "ses", "leur", "leurs", "mes", "tes", "nos", "vos", "pas",
    "plus", "ils", "elles", "nous", "vous", "lui", "comme", "mais", "donc", "car", "entre",
    "tout", "tous", "toute", "toutes", "tres", "quand", "comment", "combien", "lorsque", "puis",
    "peut", "faut", "fait", "dont", "ceux", "celle", "celui",
    // every label starts with "Art."; numbers carry the article reference
    "art", "article", "articles",
];

/// Per-field weights and the normalization ceiling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalWeights {
    pub label: f32,
    pub numeric: f32,
    pub category: f32,
    pub section: f32,
    pub body: f32,
    /// Accumulated weight that maps to a score of 1.0
    pub ceiling: f32,
}

impl LexicalWeights {
    /// Full field weighting
    pub const FULL: Self = Self {
        label: 15.0,
        numeric: 15.0,
        category: 8.0,
        section: 5.0,
        body: 3.0,
        ceiling: 25.0,
    };

    /// Field weights halved; label and number hits keep their weight
    pub const LIGHT: Self = Self {
        label: 15.0,
        numeric: 15.0,
        category: 4.0,
        section: 2.5,
        body: 1.5,
        ceiling: 25.0,
    };

    pub fn for_profile(profile: WeightProfile) -> Self {
        match profile {
            WeightProfile::Full => Self::FULL,
            WeightProfile::Light => Self::LIGHT,
        }
    }
}

impl Default for LexicalWeights {
    fn default() -> Self {
        Self::FULL
    }
}

/// A query prepared once and scored against many records
#[derive(Debug, Clone, Default)]
pub struct PreparedQuery {
    /// Folded, trimmed query used for exact label hits
    pub normalized: String,
    /// Word terms after filtering
    pub terms: Vec<String>,
    /// Digit sequences from the raw query
    pub numbers: Vec<String>,
}

impl PreparedQuery {
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Outcome of scoring one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalMatch {
    /// Accumulated, unclamped weight
    pub weight: f32,
    /// Query equals the record label
    pub exact: bool,
}

/// Weighted field matcher
#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    weights: LexicalWeights,
}

impl LexicalScorer {
    pub fn new(weights: LexicalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &LexicalWeights {
        &self.weights
    }

    /// Split a query into scoring terms and label numbers
    pub fn prepare(&self, query: &str) -> PreparedQuery {
        let normalized = normalize(query.trim());

        let mut terms: Vec<String> = Vec::new();
        for raw in normalized.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if token.chars().count() <= 2
                || token.chars().all(|c| c.is_ascii_digit())
                || STOP_WORDS.contains(&token)
            {
                continue;
            }
            if !terms.iter().any(|t| t == token) {
                terms.push(token.to_string());
            }
        }

        let mut numbers = Vec::new();
        for number in digit_runs(query) {
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }

        PreparedQuery {
            normalized,
            terms,
            numbers,
        }
    }

    /// Score one record; `None` when nothing matched
    pub fn score_prepared(&self, query: &PreparedQuery, record: &Record) -> Option<LexicalMatch> {
        if query.is_empty() {
            return None;
        }

        let label = normalize(record.label.trim());
        if !label.is_empty() && label == query.normalized {
            return Some(LexicalMatch {
                weight: self.weights.ceiling,
                exact: true,
            });
        }

        let w = &self.weights;
        let mut weight = 0.0;

        if !query.numbers.is_empty() {
            let label_numbers = digit_runs(&record.label);
            weight += query
                .numbers
                .iter()
                .filter(|n| label_numbers.contains(n))
                .count() as f32
                * w.numeric;
        }

        if !query.terms.is_empty() {
            let category = normalize(&record.category);
            let section = normalize(&record.section);
            let body = normalize(&record.body);

            for term in &query.terms {
                if !category.is_empty() && (category.contains(term.as_str()) || term.contains(&category)) {
                    weight += w.category;
                }
                if !section.is_empty() && (section.contains(term.as_str()) || term.contains(&section)) {
                    weight += w.section;
                }
                if body.contains(term.as_str()) {
                    weight += w.body;
                }
                if label.contains(term.as_str()) {
                    weight += w.label;
                }
            }
        }

        (weight > 0.0).then_some(LexicalMatch { weight, exact: false })
    }

    /// Relevance of a record for a query, in [0, 1]
    pub fn score(&self, query: &str, record: &Record) -> f32 {
        self.score_prepared(&self.prepare(query), record)
            .map(|m| self.to_score(m))
            .unwrap_or(0.0)
    }

    /// Map a match to its clamped score
    pub fn to_score(&self, m: LexicalMatch) -> f32 {
        if m.exact {
            return 1.0;
        }
        (m.weight / self.weights.ceiling).clamp(0.0, 1.0)
    }

    /// Rank records for a query
    ///
    /// Returns `(index, score)` pairs ordered by exact label hit, then
    /// weight, then position in `records`. Unmatched records are left out.
    pub fn rank(&self, query: &str, records: &[Record]) -> Vec<(usize, f32)> {
        let prepared = self.prepare(query);
        if prepared.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(usize, LexicalMatch)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| self.score_prepared(&prepared, r).map(|m| (i, m)))
            .collect();

        matches.sort_by(|(_, a), (_, b)| {
            b.exact
                .cmp(&a.exact)
                .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
        });

        matches
            .into_iter()
            .map(|(i, m)| (i, self.to_score(m)))
            .collect()
    }
}

/// Maximal runs of ASCII digits, in order of appearance
fn digit_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Record> {
        vec![
            Record::new(1, "Art. 254", "L'homicide commis intentionnellement est qualifié meurtre.")
                .with_category("Homicide"),
            Record::new(2, "Art. 350", "Quiconque soustrait frauduleusement une chose qui ne lui appartient pas est coupable de vol.")
                .with_category("Vol et extorsion"),
            Record::new(3, "Préambule", "Le présent code détermine les infractions."),
            Record::new(4, "Art. 35", "Concours d'infractions.").with_section("Dispositions générales"),
        ]
    }

    #[test]
    fn test_prepare_filters_tokens() {
        let scorer = LexicalScorer::default();
        let q = scorer.prepare("Quelle est la peine pour le VOL, article 350 ?");
        assert_eq!(q.terms, vec!["peine", "vol"]);
        assert_eq!(q.numbers, vec!["350"]);
    }

    #[test]
    fn test_category_and_body_weights() {
        let scorer = LexicalScorer::default();
        let records = corpus();
        // category "vol et extorsion" contains "vol" (8), body contains "vol" (3)
        assert!((scorer.score("vol", &records[1]) - 11.0 / 25.0).abs() < 1e-6);
        assert_eq!(scorer.score("vol", &records[0]), 0.0);
    }

    #[test]
    fn test_numeric_tokens_match_label_numbers_exactly() {
        let scorer = LexicalScorer::default();
        let records = corpus();
        assert!((scorer.score("article 350", &records[1]) - 15.0 / 25.0).abs() < 1e-6);
        // 35 is not 350
        assert_eq!(scorer.score("350", &records[3]), 0.0);
        assert!((scorer.score("35", &records[3]) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_word_label_and_accents() {
        let scorer = LexicalScorer::default();
        let records = corpus();
        // label (15) plus body (3)
        assert!((scorer.score("preambule du code", &records[2]) - 18.0 / 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_exact_label_hit_ranks_first() {
        let scorer = LexicalScorer::default();
        let mut records = corpus();
        records.push(
            Record::new(5, "Art. 351", "Vol vol vol")
                .with_category("Vol")
                .with_section("Vol"),
        );

        let ranked = scorer.rank("art. 350", &records);
        assert_eq!(ranked[0], (1, 1.0));
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let scorer = LexicalScorer::default();
        let records: Vec<Record> = (1..=4)
            .map(|i| Record::new(i, format!("Art. {}", 100 + i), "faux témoignage"))
            .collect();

        let ranked = scorer.rank("témoignage", &records);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_fields_never_match() {
        let scorer = LexicalScorer::default();
        let record = Record::new(1, "Art. 1", "Texte");
        let q = scorer.prepare("infraction");
        assert!(scorer.score_prepared(&q, &record).is_none());
    }

    #[test]
    fn test_light_profile_keeps_label_weight() {
        let scorer = LexicalScorer::new(LexicalWeights::for_profile(WeightProfile::Light));
        let records = corpus();
        assert!((scorer.score("vol", &records[1]) - 5.5 / 25.0).abs() < 1e-6);
        assert!((scorer.score("350", &records[1]) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let scorer = LexicalScorer::default();
        assert!(scorer.rank("   ", &corpus()).is_empty());
    }
}
