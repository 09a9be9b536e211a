use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::Result;
use crate::models::Score;
use crate::pagination::{Page, Pagination};
use crate::record::{from_record, to_record, Filter};
use crate::sampling::SamplingPolicy;
use crate::schema::TableName;

use super::decode_all;

/// Append-only evaluation scores
#[derive(Clone)]
pub struct ScoreStore {
    backend: Arc<dyn StorageBackend>,
    sampling: SamplingPolicy,
}

impl ScoreStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            sampling: SamplingPolicy::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn sampling(&self) -> SamplingPolicy {
        self.sampling
    }

    /// Write a score; an id that already exists is rejected
    pub async fn save_score(&self, score: Score) -> Result<Score> {
        self.backend.insert_new(TableName::Scores, to_record(&score)?).await?;
        tracing::debug!(score_id = %score.id, scorer_id = %score.scorer_id, "Saved score");
        Ok(score)
    }

    /// Write a score only if the sampling policy keeps it
    pub async fn save_sampled(&self, score: Score) -> Result<Option<Score>> {
        if !self.sampling.should_sample() {
            tracing::trace!(score_id = %score.id, "Score dropped by sampling policy");
            return Ok(None);
        }
        self.save_score(score).await.map(Some)
    }

    pub async fn get_score_by_id(&self, id: &str) -> Result<Option<Score>> {
        self.backend
            .load(TableName::Scores, &Filter::by("id", id))
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn get_scores_by_scorer_id(&self, scorer_id: &str, pagination: Pagination) -> Result<Page<Score>> {
        self.page(Filter::by("scorerId", scorer_id), pagination).await
    }

    pub async fn get_scores_by_run_id(&self, run_id: &str, pagination: Pagination) -> Result<Page<Score>> {
        self.page(Filter::by("runId", run_id), pagination).await
    }

    pub async fn get_scores_by_entity_id(
        &self,
        entity_id: &str,
        entity_type: &str,
        pagination: Pagination,
    ) -> Result<Page<Score>> {
        let filter = Filter::by("entityId", entity_id).eq("entityType", entity_type);
        self.page(filter, pagination).await
    }

    async fn page(&self, filter: Filter, pagination: Pagination) -> Result<Page<Score>> {
        pagination.validate()?;

        let mut scores: Vec<Score> = decode_all(self.backend.select(TableName::Scores, &filter).await?)?;
        scores.reverse();
        scores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Page::paginate(scores, pagination)
    }
}
