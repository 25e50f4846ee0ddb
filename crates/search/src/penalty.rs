//! Structured penalty fields from statute prose
//!
//! Rules run in a fixed order and the first match wins, even when the body
//! states a harsher penalty further down. Articles that list several
//! penalties therefore report the first one that a rule recognises.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Returned when no custodial rule matches
pub const CUSTODIAL_FALLBACK: &str = "see article";

/// Returned when the body mentions no fine range
pub const FINE_FALLBACK: &str = "not applicable";

/// Penalties stated by an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub custodial_term: String,
    pub fine: String,
}

impl Penalty {
    pub fn has_custodial_term(&self) -> bool {
        self.custodial_term != CUSTODIAL_FALLBACK
    }

    pub fn has_fine(&self) -> bool {
        self.fine != FINE_FALLBACK
    }
}

// `(?i)` folds ASCII only, so accented letters carry both cases explicitly.
// A spelled-out number may repeat itself in digits: `deux (2) ans`.
const QUANTITY: &str = r"(?:(?:\d+|un|une|deux|trois|quatre|cinq|six|sept|huit|neuf|dix|onze|douze|quinze|vingt|trente)(?:\s*\(\d+\))?)";
const UNIT: &str = r"(?:jours?|mois|ans?|ann[éÉ]es?)";
const CUSTODY: &str = r"(?:emprisonnement|r[éÉ]clusion(?:\s+[àÀ]\s+temps)?|d[éÉ]tention)";
const TO: &str = r"[àÀ]";

/// Digits with optional `.` or space thousands separators
const AMOUNT: &str = r"[0-9](?:[0-9.]|\s[0-9])*";

static RANGE_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){CUSTODY}\s+(?:de\s+|d['’]){QUANTITY}(?:\s+{UNIT})?\s+{TO}\s+{QUANTITY}\s+{UNIT}"
    ))
    .expect("range term pattern")
});

static SINGLE_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){CUSTODY}\s+(?:de\s+|d['’]){QUANTITY}\s+{UNIT}"
    ))
    .expect("single term pattern")
});

static LIFE_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)r[éÉ]clusion\s+perp[éÉ]tuelle").expect("life term pattern"));

static DEATH_PENALTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)peine\s+de\s+mort").expect("death penalty pattern"));

static PUNISHED_BY_DEATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)puni(?:e|s|es)?\s+de\s+(mort)").expect("punished by death pattern"));

static FINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)amende\s+(?:de\s+)?({AMOUNT})\s*(?:DA\s+)?{TO}\s+({AMOUNT})\s*DA"
    ))
    .expect("fine pattern")
});

/// Custodial rules, most specific first; `None` takes the whole match
static CUSTODIAL_RULES: Lazy<[(&'static Regex, Option<usize>); 5]> = Lazy::new(|| {
    [
        (&*RANGE_TERM, None),
        (&*SINGLE_TERM, None),
        (&*LIFE_TERM, None),
        (&*DEATH_PENALTY, None),
        (&*PUNISHED_BY_DEATH, Some(1)),
    ]
});

/// Extract the custodial term and fine from an article body
pub fn extract(body: &str) -> Penalty {
    Penalty {
        custodial_term: custodial_term(body).unwrap_or_else(|| CUSTODIAL_FALLBACK.to_string()),
        fine: fine(body).unwrap_or_else(|| FINE_FALLBACK.to_string()),
    }
}

fn custodial_term(body: &str) -> Option<String> {
    CUSTODIAL_RULES.iter().find_map(|(rule, group)| {
        let caps = rule.captures(body)?;
        let m = caps.get(group.unwrap_or(0))?;
        Some(m.as_str().to_string())
    })
}

fn fine(body: &str) -> Option<String> {
    let caps = FINE.captures(body)?;
    Some(format!("{} DA à {} DA", caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_sentence_without_fine() {
        let p = extract("Est puni de la réclusion perpétuelle quiconque...");
        assert_eq!(p.custodial_term, "réclusion perpétuelle");
        assert_eq!(p.fine, "not applicable");
        assert!(!p.has_fine());
    }

    #[test]
    fn test_range_term_and_fine() {
        let body = "Quiconque soustrait frauduleusement une chose qui ne lui appartient pas \
                    est coupable de vol et puni d'un emprisonnement d'un an à cinq ans \
                    et d'une amende de 100.000 DA à 500.000 DA.";
        let p = extract(body);
        assert_eq!(p.custodial_term, "emprisonnement d'un an à cinq ans");
        assert_eq!(p.fine, "100.000 DA à 500.000 DA");
    }

    #[test]
    fn test_fine_without_first_currency() {
        let p = extract("et d'une amende de 5.000 à 50.000 DA");
        assert!(p.fine.contains("5.000"));
        assert!(p.fine.contains("50.000"));
        assert_eq!(p.fine, "5.000 DA à 50.000 DA");
    }

    #[test]
    fn test_fine_with_space_separators() {
        let p = extract("amende de 20 000 DA à 100 000 DA");
        assert_eq!(p.fine, "20 000 DA à 100 000 DA");
    }

    #[test]
    fn test_single_duration() {
        let p = extract("puni d'un emprisonnement de six mois");
        assert_eq!(p.custodial_term, "emprisonnement de six mois");
    }

    #[test]
    fn test_numeric_range_with_units_on_both_sides() {
        let p = extract("puni de la réclusion à temps de 10 ans à 20 ans");
        assert_eq!(p.custodial_term, "réclusion à temps de 10 ans à 20 ans");
    }

    #[test]
    fn test_spelled_numbers_with_digits_in_parentheses() {
        let p = extract("est puni d'un emprisonnement de deux (2) à dix (10) ans");
        assert_eq!(p.custodial_term, "emprisonnement de deux (2) à dix (10) ans");

        let p = extract("est punie de la détention de six (6) mois");
        assert_eq!(p.custodial_term, "détention de six (6) mois");
    }

    #[test]
    fn test_upper_case_accented_terms() {
        let p = extract("Est puni de la RÉCLUSION PERPÉTUELLE");
        assert_eq!(p.custodial_term, "RÉCLUSION PERPÉTUELLE");

        let p = extract("EMPRISONNEMENT DE UN AN À CINQ ANS ET AMENDE DE 20.000 À 100.000 DA");
        assert_eq!(p.custodial_term, "EMPRISONNEMENT DE UN AN À CINQ ANS");
        assert_eq!(p.fine, "20.000 DA à 100.000 DA");
    }

    #[test]
    fn test_death_variants() {
        assert_eq!(extract("encourt la peine de mort").custodial_term, "peine de mort");
        assert_eq!(extract("Tout coupable d'assassinat est puni de mort.").custodial_term, "mort");
    }

    #[test]
    fn test_first_match_wins() {
        // Range rule is tried before the life-sentence rule regardless of prose order
        let body = "puni de la réclusion perpétuelle; la tentative est punie d'un \
                    emprisonnement de deux ans à cinq ans";
        assert_eq!(extract(body).custodial_term, "emprisonnement de deux ans à cinq ans");
    }

    #[test]
    fn test_no_match_sentinels() {
        let p = extract("Les dispositions du présent chapitre s'appliquent...");
        assert_eq!(p.custodial_term, CUSTODIAL_FALLBACK);
        assert_eq!(p.fine, FINE_FALLBACK);
        assert!(!p.has_custodial_term());
    }
}
