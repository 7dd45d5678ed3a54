// Integration tests for reelsim
use flate2::write::GzEncoder;
use flate2::Compression;
use reelsim_core::{
    normalize, pair_count, parse_top_n, rank, search_by_name, similarity, AkaRecord,
    BasicsRecord, Catalog, Error, PipelineConfig, RatingRecord, RawTables, VectorSpace,
};
use reelsim_storage::{load_catalog, load_snapshot_from_path, save_snapshot_to_path, DatasetPaths};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

fn basics(id: &str, kind: &str, adult: bool, title: &str, genres: Option<&str>) -> BasicsRecord {
    BasicsRecord {
        id: Some(id.to_string()),
        title_type: Some(kind.to_string()),
        primary_title: Some(title.to_string()),
        original_title: Some(title.to_string()),
        is_adult: Some(adult),
        start_year: Some("2000".to_string()),
        genres: genres.map(str::to_string),
    }
}

fn rating(id: &str, mean: f64, votes: u64) -> RatingRecord {
    RatingRecord {
        id: Some(id.to_string()),
        average_rating: Some(mean),
        num_votes: Some(votes),
    }
}

/// A mixed corpus: movies, shorts, adult titles, duplicates, unrated rows.
fn mixed_tables() -> RawTables {
    let words = ["space", "quest", "voyage", "night", "city", "river", "storm", "dream", "ghost", "king"];
    let genres = ["Drama", "Comedy", "Sci-Fi", "Horror"];
    let mut basics_rows = Vec::new();
    let mut ratings = Vec::new();
    let mut akas = Vec::new();
    for i in 0..60usize {
        let id = format!("tt{:04}", i);
        let kind = if i % 7 == 3 { "short" } else { "movie" };
        let adult = i % 11 == 5;
        let title = format!("{} {}", words[i % words.len()], words[(i * 3 + 1) % words.len()]);
        let genre = if i % 5 == 0 { None } else { Some(genres[i % genres.len()]) };
        basics_rows.push(basics(&id, kind, adult, &title, genre));
        if i % 4 != 0 {
            ratings.push(rating(&id, 5.0 + (i % 5) as f64, 10 * i as u64));
        }
        if i % 3 == 0 {
            akas.push(AkaRecord { title_id: Some(id.clone()), title: Some(format!("Alt {}", i)) });
        }
    }
    // A duplicate and an empty-text title.
    basics_rows.push(basics("tt0001", "movie", false, "Duplicate", None));
    let mut empty = basics("tt9999", "movie", false, "", None);
    empty.primary_title = None;
    empty.original_title = None;
    basics_rows.push(empty);

    RawTables { basics: basics_rows, ratings, akas }
}

#[test]
fn test_space_titles_scenario() {
    let raw = RawTables {
        basics: vec![
            basics("t1", "movie", false, "Space Quest", None),
            basics("t2", "movie", false, "Space Voyage", None),
            basics("t3", "short", false, "Ad", None),
        ],
        ratings: vec![rating("t1", 7.5, 100), rating("t2", 8.0, 50)],
        akas: Vec::new(),
    };
    let catalog = Catalog::load(raw, &PipelineConfig::default());

    let ids: Vec<&str> = catalog.entities().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);

    let pairs = catalog.rank_similar_pairs(1);
    assert_eq!(pairs.len(), 1);
    assert_eq!((pairs[0].first.as_str(), pairs[0].second.as_str()), ("t1", "t2"));
    assert!(pairs[0].score > 0.0);

    let names = |q: &str| -> Vec<String> {
        catalog.search_by_name(q).iter().map(|e| e.id.clone()).collect()
    };
    assert_eq!(names("space"), vec!["t1", "t2"]);
    assert_eq!(names(""), vec!["t1", "t2"]);
    assert!(names("ZZZ").is_empty());
}

#[test]
fn test_merge_correctness_and_uniqueness() {
    let raw = mixed_tables();
    let primary_ids: HashSet<String> = raw.basics.iter().filter_map(|b| b.id.clone()).collect();
    let restricted: HashSet<String> = raw
        .basics
        .iter()
        .filter(|b| b.title_type.as_deref() != Some("movie") || b.is_adult != Some(false))
        .filter_map(|b| b.id.clone())
        .collect();

    let out = normalize(raw.basics, raw.ratings, raw.akas, &PipelineConfig::default());
    let mut seen = HashSet::new();
    for entity in &out.entities {
        assert!(primary_ids.contains(&entity.id));
        assert!(!restricted.contains(&entity.id), "{} should be filtered", entity.id);
        assert!(seen.insert(entity.id.clone()), "duplicate id {}", entity.id);
    }
    assert_eq!(out.report.duplicate_ids, 1);
    assert!(out.report.retained_unrated > 0);
    assert_eq!(out.report.retained, out.entities.len());
}

#[test]
fn test_vector_and_similarity_properties() {
    let catalog = Catalog::load(mixed_tables(), &PipelineConfig::default());
    let space = catalog.space();

    for (entity, vector) in catalog.entities().iter().zip(space.vectors()) {
        if entity.text_content.is_empty() {
            assert!(vector.is_zero());
        } else {
            assert!((vector.norm() - 1.0).abs() < 1e-5, "norm of {}", entity.id);
        }
    }

    for i in 0..space.len() {
        for j in i..space.len() {
            let ij = similarity(space, i, j).unwrap();
            assert!((0.0..=1.0).contains(&ij));
            assert_eq!(ij, similarity(space, j, i).unwrap());
        }
    }
}

#[test]
fn test_top_n_contract() {
    let catalog = Catalog::load(mixed_tables(), &PipelineConfig::default());
    let n = catalog.len();

    assert!(catalog.rank_similar_pairs(0).is_empty());

    let all = catalog.rank_similar_pairs(pair_count(n) + 10);
    assert_eq!(all.len(), pair_count(n));
    let unique: HashSet<(&str, &str)> = all.iter().map(|p| (p.first.as_str(), p.second.as_str())).collect();
    assert_eq!(unique.len(), all.len());
    assert!(all.iter().all(|p| p.first != p.second));
    assert!(all.windows(2).all(|w| w[0].score >= w[1].score));

    // A prefix request agrees with the full ranking.
    assert_eq!(catalog.rank_similar_pairs(15), all[..15].to_vec());
    assert_eq!(parse_top_n(-3), Err(Error::InvalidTopN(-3)));
}

#[test]
fn test_pipeline_is_idempotent() {
    let a = Catalog::load(mixed_tables(), &PipelineConfig::default());
    let b = Catalog::load(mixed_tables(), &PipelineConfig::default());
    assert_eq!(a.entities(), b.entities());
    assert_eq!(a.rank_similar_pairs(40), b.rank_similar_pairs(40));
}

#[test]
fn test_empty_corpus() {
    let catalog = Catalog::load(RawTables::default(), &PipelineConfig::default());
    assert!(catalog.is_empty());
    assert!(catalog.rank_similar_pairs(10).is_empty());
    assert!(catalog.search_by_name("").is_empty());
    assert!(rank(&VectorSpace::build(&[]), 3).is_empty());
    assert!(search_by_name(&[], "x").is_empty());
}

#[test]
fn test_concurrent_queries() {
    let catalog = std::sync::Arc::new(Catalog::load(mixed_tables(), &PipelineConfig::default()));
    let expected = catalog.rank_similar_pairs(20);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = catalog.clone();
            std::thread::spawn(move || {
                (catalog.rank_similar_pairs(20), catalog.search_by_name("space").len())
            })
        })
        .collect();
    for handle in handles {
        let (pairs, found) = handle.join().unwrap();
        assert_eq!(pairs, expected);
        assert_eq!(found, catalog.search_by_name("space").len());
    }
}

fn write_gz(path: &Path, content: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn test_files_to_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_gz(
        &dir.path().join("title.basics.tsv.gz"),
        "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres\n\
         t1\tmovie\tSpace Quest\tSpace Quest\t0\t1987\t\\N\t90\tSci-Fi\n\
         t2\tmovie\tSpace Voyage\tSpace Voyage\t0\t1990\t\\N\t95\tSci-Fi,Drama\n\
         t3\tshort\tAd\tAd\t0\t\\N\t\\N\t1\t\\N\n\
         t4\tmovie\tAdult Title\tAdult Title\t1\t2001\t\\N\t80\tDrama\n\
         \\N\tmovie\tNo Id\tNo Id\t0\t2002\t\\N\t80\tDrama\n",
    );
    write_gz(
        &dir.path().join("title.ratings.tsv.gz"),
        "tconst\taverageRating\tnumVotes\nt1\t7.5\t100\n",
    );
    write_gz(
        &dir.path().join("title.akas.tsv.gz"),
        "titleId\tordering\ttitle\tregion\nt2\t1\tVoyage Spatial\tFR\nt2\t2\tRaumreise\tDE\n",
    );

    let catalog = load_catalog(&DatasetPaths::from_dir(dir.path()), &PipelineConfig::default()).unwrap();
    let ids: Vec<&str> = catalog.entities().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
    assert_eq!(catalog.report().malformed_primary, 1);
    assert!(catalog.entity("t2").unwrap().rating_mean.is_none());
    assert_eq!(catalog.entity("t2").unwrap().alternate_name.as_deref(), Some("Voyage Spatial"));

    let path = dir.path().join("entities.snapshot");
    save_snapshot_to_path(&path, catalog.entities()).unwrap();
    let restored = Catalog::from_entities(load_snapshot_from_path(&path, None).unwrap(), &PipelineConfig::default());
    assert_eq!(restored.entities(), catalog.entities());
    assert_eq!(restored.rank_similar_pairs(5), catalog.rank_similar_pairs(5));
}
