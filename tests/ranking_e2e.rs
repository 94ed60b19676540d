//! End-to-end ranking scenarios over a small fixture graph (P1..P5),
//! grounded on spec.md §8's fixture walkthrough.

use std::collections::HashMap;
use std::sync::Arc;

use connector_ranker::graph::{KnowsEdge, Person, PersonId};
use connector_ranker::storage::{GraphStore, OpenStore, SqliteStore};
use connector_ranker::vector::{Embedder, HashEmbedder, InMemoryVectorStore};
use connector_ranker::{RankingEngine, VectorStore};

fn pid(s: &str) -> PersonId {
    PersonId::from(s)
}

fn canon_job(title: &str) -> (Option<String>, Vec<String>, Vec<String>) {
    let lookup = HashMap::new();
    let canon = connector_ranker::canon::canonicalize(title, &lookup);
    let tokens = connector_ranker::canon::tokenize_title(title);
    (Some(canon.snake), canon.tokens, tokens)
}

fn person(id: &str, name: &str, title: &str, skills: &[&str], company: Option<&str>) -> Person {
    let (canon, canon_tokens, raw_tokens) = canon_job(title);
    let mut p = Person::new(id, name)
        .with_skills(skills.iter().copied())
        .with_job_title(title);
    if let Some(c) = company {
        p = p.with_company(c);
    }
    p.title = title.to_string();
    p.job_title_canon = canon;
    p.job_title_canon_tokens = canon_tokens;
    p.job_title_tokens = raw_tokens;
    p
}

async fn fixture_engine() -> (RankingEngine, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let p1 = person("P1", "Alice", "Founder", &[], None);
    let p2 = person("P2", "Bob", "Backend Engineer", &["python", "sql"], None);
    let p3 = person("P3", "Carol", "Infra Engineer", &["go"], None);
    let p4 = person("P4", "Dave", "Software Engineer", &[], Some("google"));
    let p5 = person("P5", "Erin", "Designer", &[], None);
    let p6 = person("P6", "Frank", "Designer", &[], None);

    for p in [&p1, &p2, &p3, &p4, &p5, &p6] {
        store.upsert_person(p).unwrap();
    }

    store.add_knows(&KnowsEdge::new(pid("P1"), pid("P2"))).unwrap();
    store.add_knows(&KnowsEdge::new(pid("P1"), pid("P3"))).unwrap();
    store.add_knows(&KnowsEdge::new(pid("P1"), pid("P4"))).unwrap();
    store.add_knows(&KnowsEdge::new(pid("P2"), pid("P6"))).unwrap();

    let vectors: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());

    let engine = RankingEngine::new(store.clone() as Arc<dyn GraphStore>, vectors, embedder);
    (engine, store)
}

#[tokio::test]
async fn pure_skill_match_ranks_python_holder_above_unrelated_skill() {
    let (engine, _store) = fixture_engine().await;
    let mut params = connector_ranker::rank::RankParams::default();
    params.prefilter = false;
    let ranked = engine.rank_connections(&pid("P1"), "python", params).await.unwrap();

    let p2_rank = ranked.iter().position(|r| r.id == pid("P2")).expect("P2 present");
    let p3_rank = ranked.iter().position(|r| r.id == pid("P3")).expect("P3 present");
    assert!(p2_rank < p3_rank, "P2 (python match) should rank above P3 (go)");

    let p2 = &ranked[p2_rank];
    let p3 = &ranked[p3_rank];
    assert!(p2.components.skill_match > 0.0);
    assert_eq!(p3.components.skill_match, 0.0);
}

#[tokio::test]
async fn company_fuzzy_match_scores_misspelled_company_candidate() {
    let (engine, _store) = fixture_engine().await;
    let ranked = engine
        .rank_connections(&pid("P1"), "at gogle", Default::default())
        .await
        .unwrap();

    let p4 = ranked.iter().find(|r| r.id == pid("P4")).expect("P4 present");
    assert_eq!(p4.components.company_match, 1.0);
}

#[tokio::test]
async fn role_singularization_matches_compound_canonical_token() {
    let (engine, _store) = fixture_engine().await;
    let explain = engine
        .explain_connections(&pid("P1"), "software engineers with python", true)
        .await
        .unwrap();

    assert!(explain.goal_job_tokens.contains("engineer"));
    assert!(explain.goal_job_tokens.contains("software"));

    let ranked = engine
        .rank_connections(&pid("P1"), "software engineers with python", Default::default())
        .await
        .unwrap();
    let p4 = ranked.iter().find(|r| r.id == pid("P4"));
    assert!(p4.is_some(), "software engineer candidate should survive the prefilter");
    assert!(p4.unwrap().components.job_match > 0.0);
}

#[tokio::test]
async fn rescale_preserves_ratios_and_caps_top_score() {
    let (engine, _store) = fixture_engine().await;

    let mut unscaled = connector_ranker::rank::RankParams::default();
    unscaled.prefilter = false;
    unscaled.rescale_top = None;
    let raw = engine.rank_connections(&pid("P1"), "python", unscaled).await.unwrap();

    let mut scaled = connector_ranker::rank::RankParams::default();
    scaled.prefilter = false;
    scaled.rescale_top = Some(0.8);
    let rescaled = engine.rank_connections(&pid("P1"), "python", scaled).await.unwrap();

    assert_eq!(raw.len(), rescaled.len());
    let raw_top = raw[0].score;
    assert!(raw_top > 0.0);
    assert!((rescaled[0].score - 0.8).abs() < 1e-9);

    for (r, s) in raw.iter().zip(rescaled.iter()) {
        assert_eq!(r.id, s.id);
        let expected_ratio = r.score / raw_top;
        let actual_ratio = s.score / 0.8;
        assert!((expected_ratio - actual_ratio).abs() < 1e-6);
    }
}

#[tokio::test]
async fn explain_reports_parsed_goals_and_bounded_sample() {
    let (engine, _store) = fixture_engine().await;
    let explain = engine
        .explain_connections(&pid("P1"), "software engineers with python", true)
        .await
        .unwrap();

    assert!(explain.goal_skills.contains("python"));
    assert!(explain.candidate_count >= 1);
    assert!(explain.sample_candidate_ids.len() <= 10);
}

#[tokio::test]
async fn intro_path_finds_two_hop_connection_and_respects_max_depth() {
    let (engine, _store) = fixture_engine().await;

    let path = engine.intro_path(&pid("P1"), &pid("P6"), 5).await.unwrap();
    let path = path.expect("a path should exist");
    assert_eq!(path, vec![pid("P1"), pid("P2"), pid("P6")]);

    let capped = engine.intro_path(&pid("P1"), &pid("P6"), 1).await.unwrap();
    assert!(capped.is_none());
}

#[tokio::test]
async fn no_connections_ranks_to_empty_list_without_error() {
    let (engine, _store) = fixture_engine().await;
    let ranked = engine
        .rank_connections(&pid("P5"), "anything", Default::default())
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn top_k_zero_yields_empty_results() {
    let (engine, _store) = fixture_engine().await;
    let mut params = connector_ranker::rank::RankParams::default();
    params.top_k = 0;
    let ranked = engine.rank_connections(&pid("P1"), "python", params).await.unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn recompute_populates_similar_edges_and_layer_metrics() {
    let (engine, store) = fixture_engine().await;
    let summary = engine
        .recompute(connector_ranker::engine::RecomputeParams::default())
        .await
        .unwrap();

    assert_eq!(summary.similar_edges, store.list_similar_edges().unwrap().len());
    assert_eq!(summary.similar_job_edges, store.list_similar_job_edges().unwrap().len());
}
