use product_recommender::config::{RecommenderConfig, StoreConfig};
use product_recommender::product_recommender::MIN_RANK_SCORE;
use product_recommender::search::{TfidfModel, VectorizerOptions};
use product_recommender::ProductRecommender;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TERMS: &[&str] = &[
    "shrimp", "crackers", "wheat", "flour", "choco", "pie", "cocoa", "sugar", "milk", "corn",
    "salt", "onion", "rice", "soy",
];

struct Fixture {
    _dir: TempDir,
    model_path: PathBuf,
    store: StoreConfig,
}

fn write_model(path: &Path) -> anyhow::Result<()> {
    let vocabulary: HashMap<String, u32> = TERMS
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i as u32))
        .collect();
    let idf = (0..TERMS.len()).map(|i| 1.0 + (i % 4) as f32 * 0.3).collect();
    let model = TfidfModel::new(VectorizerOptions::default(), vocabulary, idf)?;
    model.save(path)?;
    Ok(())
}

fn write_store(path: &Path, rows: &[(&str, &str, &str)]) -> anyhow::Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE products (
            report_no TEXT, product_name TEXT, raw_materials_text TEXT,
            manufacturer TEXT, nutrient_text TEXT
        );",
    )?;
    for (report_no, name, materials) in rows {
        conn.execute(
            "INSERT INTO products VALUES (?1, ?2, ?3, ?4, ?5)",
            params![report_no, name, materials, format!("M-{}", report_no), format!("N-{}", report_no)],
        )?;
    }
    Ok(())
}

fn fixture(rows: &[(&str, &str, &str)]) -> anyhow::Result<Fixture> {
    let dir = TempDir::new()?;
    let model_path = dir.path().join("tfidf_vectorizer.bin");
    let db_path = dir.path().join("products.db");
    write_model(&model_path)?;
    write_store(&db_path, rows)?;
    Ok(Fixture {
        _dir: dir,
        model_path,
        store: StoreConfig::new(db_path, "products"),
    })
}

fn snack_rows() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("A1", "Shrimp Crackers", "wheat flour shrimp"),
        ("A2", "Choco Pie", "flour cocoa sugar"),
    ]
}

#[test]
fn test_shrimp_crackers_scenario_end_to_end() -> anyhow::Result<()> {
    let fx = fixture(&snack_rows())?;
    let recommender = ProductRecommender::initialize(&fx.model_path, &fx.store);
    assert!(recommender.is_ready());

    let results = recommender.search("shrimp flour crackers", 2);
    assert_eq!(results[0].report_no, "A1");
    assert_eq!(results[0].manufacturer, "M-A1");
    assert_eq!(results[0].nutrient_text, "N-A1");
    assert_eq!(results[0].raw_materials_text, "wheat flour shrimp");
    if let Some(second) = results.get(1) {
        assert!(results[0].rank_score > second.rank_score);
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn test_spawn_from_config_loads_off_the_runtime() -> anyhow::Result<()> {
    let fx = fixture(&snack_rows())?;
    let config = RecommenderConfig {
        model_path: fx.model_path.clone(),
        store: fx.store.clone(),
    };
    let recommender = ProductRecommender::spawn_from_config(config).await?;
    assert!(recommender.is_ready());
    assert_eq!(recommender.search("shrimp flour crackers", 1)[0].report_no, "A1");

    let missing = RecommenderConfig {
        model_path: fx.model_path.with_extension("missing"),
        store: fx.store.clone(),
    };
    let degraded = ProductRecommender::spawn_from_config(missing).await?;
    assert!(!degraded.is_ready());
    Ok(())
}

#[test]
fn test_missing_model_disables_search() -> anyhow::Result<()> {
    let fx = fixture(&snack_rows())?;
    let recommender = ProductRecommender::initialize(&fx.model_path.with_extension("missing"), &fx.store);
    assert!(!recommender.is_ready());
    assert_eq!(recommender.catalog().len(), 2);
    assert!(recommender.search("shrimp flour crackers", 5).is_empty());
    Ok(())
}

#[test]
fn test_unreachable_store_disables_search() -> anyhow::Result<()> {
    let fx = fixture(&snack_rows())?;
    let store = StoreConfig::new(fx.store.database_path.with_file_name("elsewhere.db"), "products");
    let recommender = ProductRecommender::initialize(&fx.model_path, &store);
    assert!(!recommender.is_ready());
    assert_eq!(recommender.vocabulary_size(), Some(TERMS.len()));
    assert!(recommender.search("shrimp", 5).is_empty());
    Ok(())
}

#[test]
fn test_empty_store_disables_search() -> anyhow::Result<()> {
    let fx = fixture(&[])?;
    let recommender = ProductRecommender::initialize(&fx.model_path, &fx.store);
    assert!(!recommender.is_ready());
    assert!(recommender.search("shrimp", 5).is_empty());
    Ok(())
}

#[test]
fn test_single_match_is_not_padded() -> anyhow::Result<()> {
    let fx = fixture(&[
        ("B1", "Corn Soup", "corn milk salt"),
        ("B2", "Shrimp Crackers", "shrimp"),
        ("B3", "Rice Cake", "rice soy"),
    ])?;
    let recommender = ProductRecommender::initialize(&fx.model_path, &fx.store);
    let results = recommender.search("shrimp crackers", 3);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].report_no, "B2");
    Ok(())
}

fn random_text(rng: &mut impl Rng, max_terms: usize) -> String {
    let count = rng.gen_range(0..=max_terms);
    (0..count)
        .map(|_| {
            if rng.gen_bool(0.2) {
                "unknownword"
            } else {
                TERMS.choose(rng).copied().unwrap_or("salt")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_ranking_invariants_on_random_catalogs() -> anyhow::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    for round in 0..10 {
        let rows: Vec<(String, String, String)> = (0..rng.gen_range(1..25))
            .map(|i| {
                (
                    format!("R{}-{}", round, i),
                    random_text(&mut rng, 2),
                    random_text(&mut rng, 5),
                )
            })
            .collect();
        let borrowed: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
            .collect();
        let fx = fixture(&borrowed)?;
        let recommender = ProductRecommender::initialize(&fx.model_path, &fx.store);
        assert!(recommender.is_ready());

        for _ in 0..20 {
            let query = random_text(&mut rng, 4);
            let top_n = rng.gen_range(1..8);
            let results = recommender.search(&query, top_n);

            assert!(results.len() <= top_n);
            assert!(results.iter().all(|r| r.rank_score >= MIN_RANK_SCORE));
            assert!(results.iter().all(|r| r.rank_score <= 1.0));
            assert!(results.windows(2).all(|w| w[0].rank_score >= w[1].rank_score));

            // Ties keep catalog order.
            let position = |report_no: &str| rows.iter().position(|r| r.0 == report_no);
            for w in results.windows(2) {
                if w[0].rank_score == w[1].rank_score {
                    assert!(position(&w[0].report_no) < position(&w[1].report_no));
                }
            }

            assert_eq!(results, recommender.search(&query, top_n));
        }

        // Querying a record's own search text puts a record with that text on top.
        let catalog = recommender.catalog();
        for (pos, text) in catalog.search_texts().iter().enumerate() {
            let results = recommender.search(text, 3);
            if results.is_empty() {
                continue; // nothing in vocabulary
            }
            assert!(results[0].rank_score > MIN_RANK_SCORE);
            let own = &catalog.records()[pos];
            let own_score = results
                .iter()
                .find(|r| r.report_no == own.report_no)
                .map(|r| r.rank_score)
                .unwrap_or(results[0].rank_score);
            assert!((results[0].rank_score - own_score).abs() < 1e-5);
        }
    }
    Ok(())
}
