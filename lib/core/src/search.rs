// Name lookup over the canonical entity set
use crate::Entity;

/// Case-insensitive substring match on `primary_name`
/// Entities without a primary name never match; an empty query matches every
/// named entity. Input order is preserved.
pub fn search_by_name<'a>(entities: &'a [Entity], query: &str) -> Vec<&'a Entity> {
    let needle = query.to_lowercase();
    entities
        .iter()
        .filter(|e| {
            e.primary_name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("t1").with_primary_name("Space Quest"),
            Entity::new("t2").with_primary_name("Space Voyage"),
            Entity::new("t3"),
            Entity::new("t4").with_primary_name("Der Raumschiff ÜBER"),
        ]
    }

    fn ids<'a>(found: &[&'a Entity]) -> Vec<&'a str> {
        found.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_substring_case_insensitive() {
        let all = entities();
        assert_eq!(ids(&search_by_name(&all, "space")), vec!["t1", "t2"]);
        assert_eq!(ids(&search_by_name(&all, "VOYAGE")), vec!["t2"]);
        assert_eq!(ids(&search_by_name(&all, "ce qu")), vec!["t1"]);
        assert_eq!(ids(&search_by_name(&all, "über")), vec!["t4"]);
    }

    #[test]
    fn test_empty_query_matches_named_only() {
        let all = entities();
        assert_eq!(ids(&search_by_name(&all, "")), vec!["t1", "t2", "t4"]);
    }

    #[test]
    fn test_no_match() {
        let all = entities();
        assert!(search_by_name(&all, "ZZZ").is_empty());
        assert!(search_by_name(&[], "space").is_empty());
    }
}
