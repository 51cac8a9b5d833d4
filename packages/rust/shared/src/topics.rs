//! The controlled topic taxonomy and label normalization.
//!
//! Review documents spell topic headers in an all-caps form
//! (`AUDITING AND FINANCIAL MANAGEMENT`) while exports use the canonical
//! names (`Auditing & Financial Mgmt`). [`normalize_topic`] maps between
//! the two and passes unknown labels through untouched.

/// Canonical topic labels, in the order exports list them.
pub const CANONICAL_TOPICS: [&str; 33] = [
    "Agriculture and Food",
    "Auditing & Financial Mgmt",
    "Budget & Spending",
    "Business Regulation & Consumer Protection",
    "CORONAVIRUS OVERSIGHT",
    "Economic Development",
    "Education",
    "Employment",
    "Energy",
    "Equal Opportunity",
    "Financial Markets & Institutions",
    "GAO Mission & Operations",
    "Government Operations",
    "Health Care",
    "Homeland Security",
    "Housing",
    "Human Capital",
    "Information Management",
    "Information Security",
    "Information Technology",
    "International Affairs",
    "Justice & Law Enforcement",
    "National Defense",
    "Natural Resources & Environment",
    "Retirement Security",
    "Science & Technology",
    "Space",
    "Tax Policy & Administration",
    "Technology Assessment Products",
    "Telecommunications",
    "Transportation",
    "Veterans",
    "Worker & Family Assistance",
];

/// Source-document spellings mapped to their canonical label.
const TOPIC_ALIASES: &[(&str, &str)] = &[
    ("AGRICULTURE AND FOOD", "Agriculture and Food"),
    ("AUDITING AND FINANCIAL MANAGEMENT", "Auditing & Financial Mgmt"),
    ("BUDGET AND SPENDING", "Budget & Spending"),
    (
        "BUSINESS REGULATION AND CONSUMER PROTECTION",
        "Business Regulation & Consumer Protection",
    ),
    ("ECONOMIC DEVELOPMENT", "Economic Development"),
    ("EDUCATION", "Education"),
    ("EMPLOYMENT", "Employment"),
    ("ENERGY", "Energy"),
    ("EQUAL OPPORTUNITY", "Equal Opportunity"),
    (
        "FINANCIAL MARKETS AND INSTITUTIONS",
        "Financial Markets & Institutions",
    ),
    ("GOVERNMENT OPERATIONS", "Government Operations"),
    ("HEALTH CARE", "Health Care"),
    ("HOMELAND SECURITY", "Homeland Security"),
    ("HOUSING", "Housing"),
    ("HUMAN CAPITAL", "Human Capital"),
    ("INFORMATION MANAGEMENT", "Information Management"),
    ("INFORMATION SECURITY", "Information Security"),
    ("INFORMATION TECHNOLOGY", "Information Technology"),
    ("INTERNATIONAL AFFAIRS", "International Affairs"),
    ("JUSTICE AND LAW ENFORCEMENT", "Justice & Law Enforcement"),
    ("NATIONAL DEFENSE", "National Defense"),
    (
        "NATURAL RESOURCES AND ENVIRONMENT",
        "Natural Resources & Environment",
    ),
    ("RETIREMENT SECURITY", "Retirement Security"),
    ("SCIENCE AND TECHNOLOGY", "Science & Technology"),
    ("SPACE", "Space"),
    ("TAX POLICY AND ADMINISTRATION", "Tax Policy & Administration"),
    ("TELECOMMUNICATIONS", "Telecommunications"),
    ("TRANSPORTATION", "Transportation"),
    ("VETERANS", "Veterans"),
    ("WORKER AND FAMILY ASSISTANCE", "Worker & Family Assistance"),
];

/// Normalize a raw topic label to its canonical form.
///
/// Lookup order: alias table (on the uppercased, trimmed label), then an
/// exact match against a canonical label. Anything else is returned trimmed
/// but otherwise unchanged so that unrecognized topics are never lost.
pub fn normalize_topic(raw: &str) -> String {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();

    if let Some((_, canonical)) = TOPIC_ALIASES.iter().find(|(alias, _)| *alias == upper) {
        return (*canonical).to_string();
    }

    if let Some(canonical) = CANONICAL_TOPICS.iter().find(|c| **c == trimmed) {
        return (*canonical).to_string();
    }

    trimmed.to_string()
}

/// Whether `label` is one of the canonical taxonomy labels.
pub fn is_canonical(label: &str) -> bool {
    CANONICAL_TOPICS.contains(&label)
}

/// Position of `label` in the canonical taxonomy order.
pub fn canonical_index(label: &str) -> Option<usize> {
    CANONICAL_TOPICS.iter().position(|c| *c == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_maps_to_canonical() {
        assert_eq!(
            normalize_topic("AUDITING AND FINANCIAL MANAGEMENT"),
            "Auditing & Financial Mgmt"
        );
        assert_eq!(normalize_topic("  education "), "Education");
    }

    #[test]
    fn canonical_label_passes_exact_match() {
        assert_eq!(
            normalize_topic("Technology Assessment Products"),
            "Technology Assessment Products"
        );
        assert_eq!(normalize_topic("CORONAVIRUS OVERSIGHT"), "CORONAVIRUS OVERSIGHT");
    }

    #[test]
    fn unknown_label_is_kept() {
        assert_eq!(normalize_topic("LEGAL DECISIONS"), "LEGAL DECISIONS");
        assert!(!is_canonical("LEGAL DECISIONS"));
    }

    #[test]
    fn every_alias_targets_a_canonical_label() {
        for (alias, canonical) in TOPIC_ALIASES {
            assert!(is_canonical(canonical), "{alias} -> {canonical}");
        }
    }

    #[test]
    fn canonical_order_is_stable() {
        assert_eq!(canonical_index("Agriculture and Food"), Some(0));
        assert_eq!(canonical_index("Worker & Family Assistance"), Some(32));
        assert_eq!(canonical_index("Nope"), None);
    }
}
