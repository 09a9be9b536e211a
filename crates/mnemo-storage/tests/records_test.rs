use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mnemo_storage::{
    ensure_tables, MemoryBackend, Pagination, SamplingPolicy, Score, ScoreSource, ScoreStore,
    SpanStatusCode, StorageError, TableName, TraceQuery, TraceSpan, TraceStore, WorkflowRunQuery,
    WorkflowSnapshotStore,
};
use serde_json::json;

async fn backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    ensure_tables(backend.as_ref(), &TableName::ALL).await.unwrap();
    backend
}

#[tokio::test]
async fn test_scores_are_append_only() {
    let scores = ScoreStore::new(backend().await);
    let score = Score::new("relevance", "run-1", "msg-1", "message", 0.75)
        .with_id("s1")
        .with_reason("on topic");

    scores.save_score(score.clone()).await.unwrap();
    let again = scores.save_score(score.clone().with_reason("changed")).await;

    assert!(matches!(again, Err(StorageError::AlreadyExists { .. })));
    let stored = scores.get_score_by_id("s1").await.unwrap().unwrap();
    assert_eq!(stored.reason.as_deref(), Some("on topic"));
    assert_eq!(stored, score);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_scores_keep_one_writer() {
    let scores = ScoreStore::new(backend().await);

    for i in 0..200 {
        let id = format!("s{}", i);
        let first = scores.clone();
        let second = scores.clone();
        let a = Score::new("relevance", "run-1", "msg-1", "message", 0.1).with_id(id.clone());
        let b = Score::new("relevance", "run-1", "msg-1", "message", 0.9).with_id(id.clone());

        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { first.save_score(a).await }),
            tokio::spawn(async move { second.save_score(b).await })
        );
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        assert!(ra.is_ok() != rb.is_ok(), "exactly one write of {} must succeed", id);
        let winner = if ra.is_ok() { 0.1 } else { 0.9 };
        let stored = scores.get_score_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.score, winner);
    }
}

#[tokio::test]
async fn test_scores_by_owner_are_newest_first() {
    let scores = ScoreStore::new(backend().await);
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    for i in 0..4 {
        let scorer = if i % 2 == 0 { "relevance" } else { "toxicity" };
        scores
            .save_score(
                Score::new(scorer, "run-1", format!("msg-{}", i), "message", i as f64 / 4.0)
                    .with_id(format!("s{}", i))
                    .with_source(ScoreSource::Test)
                    .with_created_at(base + Duration::seconds(i)),
            )
            .await
            .unwrap();
    }

    let relevance = scores
        .get_scores_by_scorer_id("relevance", Pagination::default())
        .await
        .unwrap();
    let ids: Vec<_> = relevance.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s0"]);

    let run = scores.get_scores_by_run_id("run-1", Pagination::new(0, 3)).await.unwrap();
    assert_eq!(run.total, 4);
    assert!(run.has_more);

    let entity = scores
        .get_scores_by_entity_id("msg-3", "message", Pagination::default())
        .await
        .unwrap();
    assert_eq!(entity.items.len(), 1);
    assert_eq!(entity.items[0].source, ScoreSource::Test);
}

#[tokio::test]
async fn test_sampling_policy_controls_writes() {
    let backend = backend().await;
    let never = ScoreStore::new(backend.clone()).with_sampling(SamplingPolicy::Never);
    let always = ScoreStore::new(backend).with_sampling(SamplingPolicy::Always);

    let dropped = never
        .save_sampled(Score::new("relevance", "run-1", "m1", "message", 1.0).with_id("s1"))
        .await
        .unwrap();
    assert!(dropped.is_none());
    assert!(always.get_score_by_id("s1").await.unwrap().is_none());

    let kept = always
        .save_sampled(Score::new("relevance", "run-1", "m1", "message", 1.0).with_id("s2"))
        .await
        .unwrap();
    assert!(kept.is_some());
}

#[tokio::test]
async fn test_trace_queries() {
    let traces = TraceStore::new(backend().await);
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    traces
        .batch_insert_spans(vec![
            TraceSpan::new("trace-1", "agent.run")
                .with_id("a")
                .with_run_id("run-1")
                .with_scope("planner")
                .with_created_at(base),
            TraceSpan::new("trace-1", "llm.call")
                .with_id("b")
                .with_parent("a")
                .with_run_id("run-1")
                .with_created_at(base + Duration::seconds(1))
                .finish(SpanStatusCode::Ok, None),
            TraceSpan::new("trace-2", "agent.run")
                .with_id("c")
                .with_created_at(base + Duration::seconds(2)),
        ])
        .await
        .unwrap();

    let agent_runs = traces.get_traces(TraceQuery::new().name_prefix("agent.")).await.unwrap();
    let ids: Vec<_> = agent_runs.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);

    let run = traces.get_traces(TraceQuery::new().run_id("run-1").page(0, 1)).await.unwrap();
    assert_eq!(run.total, 2);
    assert_eq!(run.items[0].id, "b");
    assert!(run.has_more);

    let scoped = traces.get_traces(TraceQuery::new().scope("planner")).await.unwrap();
    assert_eq!(scoped.total, 1);

    let span = traces.get_span("b").await.unwrap().unwrap();
    assert_eq!(span.parent_span_id.as_deref(), Some("a"));
    assert_eq!(span.status.map(|s| s.code), Some(SpanStatusCode::Ok));
}

#[tokio::test]
async fn test_spans_are_never_overwritten() {
    let traces = TraceStore::new(backend().await);
    traces
        .batch_insert_spans(vec![TraceSpan::new("trace-1", "first").with_id("a")])
        .await
        .unwrap();

    let result = traces
        .batch_insert_spans(vec![
            TraceSpan::new("trace-1", "fresh").with_id("z"),
            TraceSpan::new("trace-1", "second").with_id("a"),
        ])
        .await;

    assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
    assert_eq!(traces.get_span("a").await.unwrap().unwrap().name, "first");
    assert!(traces.get_span("z").await.unwrap().is_none());
}

#[tokio::test]
async fn test_workflow_snapshot_upsert_keeps_created_at() {
    let workflows = WorkflowSnapshotStore::new(backend().await);

    let first = workflows
        .persist_snapshot("onboarding", "run-1", Some("alice"), json!({"step": 1}))
        .await
        .unwrap();
    let second = workflows
        .persist_snapshot("onboarding", "run-1", None, json!({"step": 2}))
        .await
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.resource_id.as_deref(), Some("alice"));

    let loaded = workflows.load_snapshot("onboarding", "run-1").await.unwrap().unwrap();
    assert_eq!(loaded.snapshot, json!({"step": 2}));
    assert!(workflows.load_snapshot("onboarding", "run-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_workflow_runs() {
    let workflows = WorkflowSnapshotStore::new(backend().await);
    workflows.persist_snapshot("onboarding", "run-1", None, json!({})).await.unwrap();
    workflows.persist_snapshot("billing", "run-2", None, json!({})).await.unwrap();
    workflows.persist_snapshot("onboarding", "run-3", None, json!({})).await.unwrap();

    let runs = workflows
        .list_runs(WorkflowRunQuery::new().workflow_name("onboarding"))
        .await
        .unwrap();
    let ids: Vec<_> = runs.items.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(ids, vec!["run-3", "run-1"]);

    let all = workflows.list_runs(WorkflowRunQuery::new().page(0, 2)).await.unwrap();
    assert_eq!(all.total, 3);
    assert!(all.has_more);
}
