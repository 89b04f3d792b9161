//! Static hobby catalogue, used to spot which hobbies a reply suggested.

/// Category name → hobbies, in display order.
const CATALOGUE: &[(&str, &[&str])] = &[
    (
        "music",
        &["playing an instrument", "singing", "music production", "joining a choir"],
    ),
    (
        "outdoors",
        &["hiking", "camping", "bird watching", "gardening", "rock climbing"],
    ),
    (
        "creative",
        &["painting", "writing", "photography", "knitting", "pottery", "drawing"],
    ),
    (
        "social",
        &["board game nights", "book clubs", "volunteering", "dance classes"],
    ),
    (
        "solo",
        &["reading", "puzzle solving", "journaling", "meditation", "collecting"],
    ),
    (
        "active",
        &["yoga", "cycling", "swimming", "martial arts", "running"],
    ),
    ("tech", &["coding", "3D printing", "electronics", "video editing"]),
    (
        "crafts",
        &["woodworking", "jewelry making", "sewing", "origami"],
    ),
];

/// The category a hobby belongs to, matched case-insensitively.
pub fn category_of(hobby: &str) -> Option<&'static str> {
    CATALOGUE
        .iter()
        .find(|(_, hobbies)| hobbies.iter().any(|h| h.eq_ignore_ascii_case(hobby)))
        .map(|(category, _)| *category)
}

/// Hobbies from the catalogue mentioned anywhere in `text`.
///
/// Case-insensitive substring match in catalogue order. Hobbies already in
/// `already_suggested` are skipped and no hobby is returned twice.
pub fn find_mentioned_hobbies(text: &str, already_suggested: &[String]) -> Vec<&'static str> {
    let haystack = text.to_lowercase();
    let mut found: Vec<&'static str> = Vec::new();

    for (_, hobbies) in CATALOGUE {
        for &hobby in *hobbies {
            let needle = hobby.to_lowercase();
            if !haystack.contains(&needle) {
                continue;
            }
            let seen = already_suggested
                .iter()
                .any(|s| s.eq_ignore_ascii_case(hobby))
                || found.contains(&hobby);
            if !seen {
                found.push(hobby);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_hobbies_case_insensitively_in_catalogue_order() {
        let text = "Have you thought about POTTERY? Or maybe Hiking on weekends.";
        assert_eq!(find_mentioned_hobbies(text, &[]), vec!["hiking", "pottery"]);
    }

    #[test]
    fn skips_already_suggested() {
        let already = vec!["Hiking".to_string()];
        let text = "Hiking is great, and so is bird watching.";
        assert_eq!(find_mentioned_hobbies(text, &already), vec!["bird watching"]);
    }

    #[test]
    fn multi_word_and_mixed_case_names() {
        let text = "3d printing could be fun";
        assert_eq!(find_mentioned_hobbies(text, &[]), vec!["3D printing"]);
    }

    #[test]
    fn substring_matches_inside_longer_words() {
        // "running" is matched by substring inside "trail-running"
        let found = find_mentioned_hobbies("Try trail-running!", &[]);
        assert_eq!(found, vec!["running"]);
    }

    #[test]
    fn nothing_mentioned() {
        assert!(find_mentioned_hobbies("How was your day?", &[]).is_empty());
    }

    #[test]
    fn category_lookup() {
        assert_eq!(category_of("Origami"), Some("crafts"));
        assert_eq!(category_of("yoga"), Some("active"));
        assert_eq!(category_of("skydiving"), None);
    }

    #[test]
    fn catalogue_has_no_duplicate_hobbies() {
        let mut all: Vec<String> = CATALOGUE
            .iter()
            .flat_map(|(_, hobbies)| hobbies.iter().map(|h| h.to_lowercase()))
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(CATALOGUE.len(), 8);
    }
}
