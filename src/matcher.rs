//! Set matching: decide which external products belong to a target set
//!
//! Remote search results are noisy. A product is accepted through layered
//! heuristics, evaluated in order with the first applicable path deciding:
//!
//! 1. Keyword path - niche subsets ("what if", "autograph", ...) require the
//!    keyword itself plus keyword-specific tokens in the candidate. This path
//!    is exclusive: a keyword-bearing target never falls through to the
//!    looser paths, so generic similarity cannot misclassify subsets.
//! 2. Similarity path - normalized edit distance against the console name.
//! 3. Word-overlap path - share of the target's significant words present
//!    in the candidate.
//! 4. Structured-pattern path - year + manufacturer + product line all
//!    present on both sides.

use crate::pricecharting::SearchProduct;
use crate::similarity::similarity;
use lazy_static::lazy_static;
use regex::Regex;

/// Default similarity threshold for the similarity path.
///
/// Kept in one place and overridable; do not duplicate this value.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Minimum share of the target's significant words for the overlap path
const WORD_OVERLAP_RATIO: f64 = 0.6;

/// Subset keywords and the extra tokens their candidates must carry
const SUBSET_KEYWORDS: &[(&str, &[&str])] = &[
    ("what if", &["marvel"]),
    ("autograph", &[]),
    ("refractor", &[]),
    ("sketch", &[]),
    ("hologram", &[]),
    ("promo", &[]),
    ("insert", &[]),
];

/// Manufacturer tokens recognized by the structured-pattern path
const MANUFACTURERS: &[&str] = &[
    "skybox",
    "fleer",
    "impel",
    "topps",
    "upper deck",
    "panini",
    "donruss",
    "leaf",
];

/// Product-line tokens recognized by the structured-pattern path
const PRODUCT_LINES: &[&str] = &[
    "masterpieces",
    "metal universe",
    "ultra",
    "prizm",
    "chrome",
    "finest",
    "origins",
    "universe",
];

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\b(19|20)\d{2}\b").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Matching configuration
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Threshold for the similarity path (not used by the keyword path)
    pub similarity_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Which path accepted a candidate (for logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPath {
    Keyword,
    Similarity,
    WordOverlap,
    StructuredPattern,
}

/// Filter `products` down to those matching the target set name.
pub fn filter_matching<'a>(
    target_set: &str,
    products: &'a [SearchProduct],
    config: &MatchConfig,
) -> Vec<&'a SearchProduct> {
    products
        .iter()
        .filter(|p| {
            if let Some(path) = matches_set(target_set, p, config) {
                log::debug!(
                    "Accepted '{}' for set '{}' via {:?}",
                    p.product_name,
                    target_set,
                    path
                );
                true
            } else {
                log::debug!("Rejected '{}' for set '{}'", p.product_name, target_set);
                false
            }
        })
        .collect()
}

/// Decide whether one candidate product belongs to the target set.
///
/// Returns the accepting path, or `None` if every path rejects.
pub fn matches_set(
    target_set: &str,
    product: &SearchProduct,
    config: &MatchConfig,
) -> Option<MatchPath> {
    let target_lower = target_set.to_lowercase();
    // Candidates carry set information in either field, depending on how
    // the store categorized the product.
    let candidate_lower = format!(
        "{} {}",
        product.console_name.to_lowercase(),
        product.product_name.to_lowercase()
    );

    // Keyword path decides outright for keyword-bearing targets.
    if let Some((keyword, required)) = subset_keyword(&target_lower) {
        return keyword_path_accepts(&target_lower, &candidate_lower, keyword, required)
            .then_some(MatchPath::Keyword);
    }

    if similarity(target_set, &product.console_name) >= config.similarity_threshold {
        return Some(MatchPath::Similarity);
    }

    if word_overlap_accepts(&target_lower, &candidate_lower) {
        return Some(MatchPath::WordOverlap);
    }

    if structured_pattern_accepts(&target_lower, &candidate_lower) {
        return Some(MatchPath::StructuredPattern);
    }

    None
}

/// First recognized subset keyword contained in the target name
fn subset_keyword(target_lower: &str) -> Option<(&'static str, &'static [&'static str])> {
    SUBSET_KEYWORDS
        .iter()
        .find(|(kw, _)| target_lower.contains(kw))
        .map(|&(kw, required)| (kw, required))
}

fn keyword_path_accepts(
    target_lower: &str,
    candidate_lower: &str,
    keyword: &str,
    required: &[&str],
) -> bool {
    if !candidate_lower.contains(keyword) {
        return false;
    }
    if !required.iter().all(|tok| candidate_lower.contains(tok)) {
        return false;
    }
    // A keyword subset is year-specific when the target names a year
    match YEAR.find(target_lower) {
        Some(year) => candidate_lower.contains(year.as_str()),
        None => true,
    }
}

/// Lowercase, strip punctuation, collapse whitespace, split into words
fn normalize_words(s: &str) -> Vec<String> {
    NON_ALNUM
        .split(&s.to_lowercase())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn word_overlap_accepts(target_lower: &str, candidate_lower: &str) -> bool {
    let significant: Vec<String> = normalize_words(target_lower)
        .into_iter()
        .filter(|w| w.len() > 2)
        .collect();
    if significant.is_empty() {
        return false;
    }
    let candidate_words: std::collections::HashSet<String> =
        normalize_words(candidate_lower).into_iter().collect();
    let hits = significant
        .iter()
        .filter(|w| candidate_words.contains(*w))
        .count();
    hits as f64 / significant.len() as f64 >= WORD_OVERLAP_RATIO
}

fn structured_pattern_accepts(target_lower: &str, candidate_lower: &str) -> bool {
    let year = match YEAR.find(target_lower) {
        Some(m) => m.as_str(),
        None => return false,
    };
    let manufacturer = match MANUFACTURERS.iter().find(|m| target_lower.contains(*m)) {
        Some(m) => m,
        None => return false,
    };
    let line = match PRODUCT_LINES.iter().find(|l| target_lower.contains(*l)) {
        Some(l) => l,
        None => return false,
    };

    candidate_lower.contains(year)
        && candidate_lower.contains(manufacturer)
        && candidate_lower.contains(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(product_name: &str, console_name: &str) -> SearchProduct {
        SearchProduct {
            id: "p1".to_string(),
            product_name: product_name.to_string(),
            console_name: console_name.to_string(),
            loose_price: None,
            cib_price: None,
            new_price: None,
            image: None,
        }
    }

    #[test]
    fn similarity_path_accepts_case_variant() {
        // Scenario A: one-letter case difference clears the 0.85 threshold
        let p = product("Wolverine #12", "1992 Skybox Marvel Masterpieces");
        let path = matches_set(
            "1992 SkyBox Marvel Masterpieces",
            &p,
            &MatchConfig::default(),
        );
        assert_eq!(path, Some(MatchPath::Similarity));
    }

    #[test]
    fn keyword_target_rejects_candidate_without_keyword() {
        // Scenario B: year/brand overlap is not enough for a keyword subset
        let p = product("Iron Man #5", "Marvel 2020 Masterpieces");
        let path = matches_set(
            "2020 Marvel Masterpieces What If",
            &p,
            &MatchConfig::default(),
        );
        assert_eq!(path, None);
    }

    #[test]
    fn keyword_target_accepts_full_keyword_match() {
        let p = product(
            "Spider-Man What If #22",
            "2020 Marvel Masterpieces What If",
        );
        let path = matches_set(
            "2020 Marvel Masterpieces What If",
            &p,
            &MatchConfig::default(),
        );
        assert_eq!(path, Some(MatchPath::Keyword));
    }

    #[test]
    fn keyword_target_requires_matching_year() {
        let p = product("Storm What If #3", "2019 Marvel Masterpieces What If");
        let path = matches_set(
            "2020 Marvel Masterpieces What If",
            &p,
            &MatchConfig::default(),
        );
        assert_eq!(path, None);
    }

    #[test]
    fn keyword_path_never_falls_through_to_similarity() {
        // Console name nearly identical to the target, but the keyword is
        // missing from the candidate entirely.
        let p = product("Gambit #44", "1994 Fleer Ultra Autograph");
        let path = matches_set("1994 Fleer Ultra Autographs", &p, &MatchConfig::default());
        // "autograph" present on both sides, year matches: accepted
        assert_eq!(path, Some(MatchPath::Keyword));

        let p2 = product("Gambit #44", "1994 Fleer Ultrb");
        let path2 = matches_set("1994 Fleer Ultra Autographs", &p2, &MatchConfig::default());
        assert_eq!(path2, None);
    }

    #[test]
    fn word_overlap_accepts_reordered_names() {
        let p = product("Beast #33", "Masterpieces Marvel 1992 Series (SkyBox)");
        let cfg = MatchConfig::default();
        // Similarity on the reordered string is low, but every significant
        // word of the target appears in the candidate.
        let path = matches_set("1992 SkyBox Marvel Masterpieces", &p, &cfg);
        assert_eq!(path, Some(MatchPath::WordOverlap));
    }

    #[test]
    fn structured_pattern_needs_all_three_tokens() {
        let p = product("Cyclops #1", "Trading Cards 1992 SkyBox Marvel: Masterpieces!");
        let cfg = MatchConfig {
            similarity_threshold: 1.0,
        };
        // Similarity path disabled by the threshold and too few shared
        // words for the overlap path; the structured path must carry it.
        let path = matches_set("1992 skybox x-men masterpieces limited gold edition", &p, &cfg);
        assert_eq!(path, Some(MatchPath::StructuredPattern));
    }

    #[test]
    fn unrelated_product_rejected_by_all_paths() {
        let p = product("Charizard #4", "Pokemon Base Set");
        let path = matches_set(
            "1992 SkyBox Marvel Masterpieces",
            &p,
            &MatchConfig::default(),
        );
        assert_eq!(path, None);
    }

    #[test]
    fn filter_matching_keeps_order() {
        let products = vec![
            product("Wolverine #12", "1992 Skybox Marvel Masterpieces"),
            product("Charizard #4", "Pokemon Base Set"),
            product("Colossus #64", "1992 SkyBox Marvel Masterpieces"),
        ];
        let accepted = filter_matching(
            "1992 SkyBox Marvel Masterpieces",
            &products,
            &MatchConfig::default(),
        );
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].product_name, "Wolverine #12");
        assert_eq!(accepted[1].product_name, "Colossus #64");
    }

    #[test]
    fn threshold_is_configurable() {
        let p = product("Wolverine #12", "1992 Skybx Marvel Mstrpieces");
        let strict = MatchConfig {
            similarity_threshold: 0.95,
        };
        let loose = MatchConfig {
            similarity_threshold: 0.7,
        };
        let target = "1992 SkyBox Marvel Masterpieces";
        assert_ne!(
            matches_set(target, &p, &strict),
            Some(MatchPath::Similarity)
        );
        assert_eq!(matches_set(target, &p, &loose), Some(MatchPath::Similarity));
    }
}
