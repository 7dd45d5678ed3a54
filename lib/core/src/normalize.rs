//! Entity normalization
//!
//! Merges the primary, ratings and alternate-title tables into one canonical
//! entity list. Bad rows are skipped and counted, never fatal.

use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{PipelineConfig, RatingJoin};
use crate::record::{usable_id, AkaRecord, BasicsRecord, RatingRecord, NULL_MARKER};
use crate::Entity;

/// Row counts collected while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub primary_rows: usize,
    pub malformed_primary: usize,
    pub malformed_ratings: usize,
    pub malformed_alternates: usize,
    pub duplicate_ids: usize,
    pub filtered_type: usize,
    pub filtered_restricted: usize,
    pub dropped_unrated: usize,
    pub retained: usize,
    pub retained_unrated: usize,
}

impl NormalizeReport {
    pub fn malformed(&self) -> usize {
        self.malformed_primary + self.malformed_ratings + self.malformed_alternates
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub entities: Vec<Entity>,
    pub report: NormalizeReport,
}

#[derive(Debug, Clone, Copy)]
struct Rating {
    mean: Option<f64>,
    count: Option<u64>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NULL_MARKER)
}

/// Build the canonical entity set.
///
/// Ratings and alternate titles are indexed by id (first row per id wins),
/// then primary rows are streamed in order: rows with an unusable id or an id
/// already seen are skipped, the type and restriction filters are applied,
/// and ratings and the alternate name are attached. Output order follows the
/// surviving primary rows.
pub fn normalize<B, R, A>(basics: B, ratings: R, akas: A, config: &PipelineConfig) -> Normalized
where
    B: IntoIterator<Item = BasicsRecord>,
    R: IntoIterator<Item = RatingRecord>,
    A: IntoIterator<Item = AkaRecord>,
{
    let mut report = NormalizeReport::default();

    let mut rating_index: AHashMap<String, Rating> = AHashMap::new();
    for row in ratings {
        let Some(id) = usable_id(row.id.as_deref()) else {
            report.malformed_ratings += 1;
            continue;
        };
        rating_index.entry(id.to_string()).or_insert(Rating {
            mean: row.average_rating.filter(|r| r.is_finite()),
            count: row.num_votes,
        });
    }

    let mut alternate_index: AHashMap<String, String> = AHashMap::new();
    for row in akas {
        let Some(id) = usable_id(row.title_id.as_deref()) else {
            report.malformed_alternates += 1;
            continue;
        };
        if alternate_index.contains_key(id) {
            continue;
        }
        if let Some(title) = clean(row.title) {
            alternate_index.insert(id.to_string(), title);
        }
    }

    let normalize_config = &config.normalize;
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut entities = Vec::new();

    for row in basics {
        report.primary_rows += 1;

        let Some(id) = usable_id(row.id.as_deref()).map(str::to_string) else {
            report.malformed_primary += 1;
            continue;
        };
        // First row for an id decides, even if that row is later filtered out.
        if !seen.insert(id.clone()) {
            report.duplicate_ids += 1;
            continue;
        }

        if row.title_type.as_deref().map(str::trim) != Some(normalize_config.entity_type.as_str()) {
            report.filtered_type += 1;
            continue;
        }
        if row.is_adult != Some(false) {
            report.filtered_restricted += 1;
            continue;
        }

        let rating = rating_index.get(&id).copied();
        if rating.is_none() && normalize_config.rating_join == RatingJoin::Inner {
            report.dropped_unrated += 1;
            continue;
        }

        let mut entity = Entity::new(id);
        entity.primary_name = clean(row.primary_title);
        entity.original_name = clean(row.original_title);
        entity.release_year = clean(row.start_year);
        entity.categories = clean(row.genres);
        entity.alternate_name = alternate_index.remove(&entity.id);
        match rating {
            Some(rating) => {
                entity.rating_mean = rating.mean;
                entity.rating_count = rating.count;
            }
            None => report.retained_unrated += 1,
        }
        entity.text_content = config.text.compose(&entity);
        entities.push(entity);
    }

    report.retained = entities.len();
    info!(
        "Normalized {} primary rows into {} entities ({} unrated)",
        report.primary_rows, report.retained, report.retained_unrated
    );
    debug!(
        "Skipped rows: {} malformed, {} duplicate ids, {} wrong type, {} restricted, {} unrated",
        report.malformed(),
        report.duplicate_ids,
        report.filtered_type,
        report.filtered_restricted,
        report.dropped_unrated
    );

    Normalized { entities, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NormalizeConfig, TextConfig, TextField};

    fn basics(id: &str, kind: &str, adult: Option<bool>, title: &str) -> BasicsRecord {
        BasicsRecord {
            id: Some(id.to_string()),
            title_type: Some(kind.to_string()),
            primary_title: Some(title.to_string()),
            original_title: Some(title.to_string()),
            is_adult: adult,
            start_year: Some("2001".to_string()),
            genres: None,
        }
    }

    fn rating(id: &str, mean: f64, votes: u64) -> RatingRecord {
        RatingRecord {
            id: Some(id.to_string()),
            average_rating: Some(mean),
            num_votes: Some(votes),
        }
    }

    fn aka(id: &str, title: &str) -> AkaRecord {
        AkaRecord {
            title_id: Some(id.to_string()),
            title: Some(title.to_string()),
        }
    }

    fn ids(normalized: &Normalized) -> Vec<&str> {
        normalized.entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_scenario_filters_type() {
        let out = normalize(
            vec![
                basics("t1", "movie", Some(false), "Space Quest"),
                basics("t2", "movie", Some(false), "Space Voyage"),
                basics("t3", "short", Some(false), "Ad"),
            ],
            vec![rating("t1", 7.5, 100), rating("t2", 8.0, 50)],
            Vec::new(),
            &PipelineConfig::default(),
        );
        assert_eq!(ids(&out), vec!["t1", "t2"]);
        assert_eq!(out.entities[0].rating_mean, Some(7.5));
        assert_eq!(out.entities[1].rating_count, Some(50));
        assert_eq!(out.entities[0].text_content, "Space Quest");
        assert_eq!(out.report.filtered_type, 1);
    }

    #[test]
    fn test_restricted_and_unknown_flag_filtered() {
        let out = normalize(
            vec![
                basics("t1", "movie", Some(true), "Adult"),
                basics("t2", "movie", None, "Unknown"),
                basics("t3", "movie", Some(false), "Kept"),
            ],
            Vec::new(),
            Vec::new(),
            &PipelineConfig::default(),
        );
        assert_eq!(ids(&out), vec!["t3"]);
        assert_eq!(out.report.filtered_restricted, 2);
    }

    #[test]
    fn test_left_join_keeps_unrated() {
        let out = normalize(
            vec![
                basics("t1", "movie", Some(false), "Rated"),
                basics("t2", "movie", Some(false), "Unrated"),
            ],
            vec![rating("t1", 6.0, 10)],
            Vec::new(),
            &PipelineConfig::default(),
        );
        assert_eq!(ids(&out), vec!["t1", "t2"]);
        assert!(out.entities[1].rating_mean.is_none());
        assert!(out.entities[1].rating_count.is_none());
        assert_eq!(out.report.retained_unrated, 1);
    }

    #[test]
    fn test_inner_join_drops_unrated() {
        let config = PipelineConfig {
            normalize: NormalizeConfig {
                rating_join: RatingJoin::Inner,
                ..NormalizeConfig::default()
            },
            ..PipelineConfig::default()
        };
        let out = normalize(
            vec![
                basics("t1", "movie", Some(false), "Rated"),
                basics("t2", "movie", Some(false), "Unrated"),
            ],
            vec![rating("t1", 6.0, 10)],
            Vec::new(),
            &config,
        );
        assert_eq!(ids(&out), vec!["t1"]);
        assert_eq!(out.report.dropped_unrated, 1);
    }

    #[test]
    fn test_first_alternate_name_wins() {
        let out = normalize(
            vec![
                basics("t1", "movie", Some(false), "Space Quest"),
                basics("t2", "movie", Some(false), "Space Voyage"),
            ],
            Vec::new(),
            vec![
                aka("t1", "Weltraum Quest"),
                aka("t1", "Quête Spatiale"),
                aka("t2", "\\N"),
                aka("t2", "Voyage Spatial"),
            ],
            &PipelineConfig::default(),
        );
        assert_eq!(out.entities[0].alternate_name.as_deref(), Some("Weltraum Quest"));
        assert_eq!(out.entities[1].alternate_name.as_deref(), Some("Voyage Spatial"));
    }

    #[test]
    fn test_missing_alternate_is_absent() {
        let out = normalize(
            vec![basics("t1", "movie", Some(false), "Solo")],
            Vec::new(),
            vec![aka("t9", "Other")],
            &PipelineConfig::default(),
        );
        assert!(out.entities[0].alternate_name.is_none());
    }

    #[test]
    fn test_malformed_ids_skipped() {
        let mut no_id = basics("x", "movie", Some(false), "No id");
        no_id.id = None;
        let out = normalize(
            vec![
                no_id,
                basics("", "movie", Some(false), "Empty"),
                basics("\\N", "movie", Some(false), "Null"),
                basics("t1", "movie", Some(false), "Good"),
            ],
            vec![RatingRecord::default(), rating("t1", 5.0, 1)],
            vec![AkaRecord::default()],
            &PipelineConfig::default(),
        );
        assert_eq!(ids(&out), vec!["t1"]);
        assert_eq!(out.report.malformed_primary, 3);
        assert_eq!(out.report.malformed_ratings, 1);
        assert_eq!(out.report.malformed_alternates, 1);
        assert_eq!(out.report.malformed(), 5);
    }

    #[test]
    fn test_duplicate_ids_first_seen_wins() {
        let out = normalize(
            vec![
                basics("t1", "movie", Some(false), "First"),
                basics("t1", "movie", Some(false), "Second"),
                basics("t2", "short", Some(false), "Short first"),
                basics("t2", "movie", Some(false), "Movie second"),
            ],
            vec![rating("t1", 1.0, 1), rating("t1", 9.0, 9)],
            Vec::new(),
            &PipelineConfig::default(),
        );
        assert_eq!(ids(&out), vec!["t1"]);
        assert_eq!(out.entities[0].primary_name.as_deref(), Some("First"));
        assert_eq!(out.entities[0].rating_mean, Some(1.0));
        assert_eq!(out.report.duplicate_ids, 2);
    }

    #[test]
    fn test_text_content_from_configured_fields() {
        let mut row = basics("t1", "movie", Some(false), "Space Quest");
        row.genres = Some("Adventure,Sci-Fi".to_string());
        let config = PipelineConfig {
            text: TextConfig {
                fields: vec![TextField::Categories, TextField::AlternateName],
            },
            ..PipelineConfig::default()
        };
        let out = normalize(vec![row], Vec::new(), vec![aka("t1", "Quest")], &config);
        assert_eq!(out.entities[0].text_content, "Adventure,Sci-Fi Quest");
    }

    #[test]
    fn test_empty_input() {
        let out = normalize(Vec::new(), Vec::new(), Vec::new(), &PipelineConfig::default());
        assert!(out.entities.is_empty());
        assert_eq!(out.report, NormalizeReport::default());
    }
}
