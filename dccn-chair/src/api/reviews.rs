//! Review statistics, the chair review feed and reviewer edits

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use serde::Serialize;

use dccn_common::filters::FilterParams;
use dccn_common::model::{DecisionKind, Review, ReviewUpdate, SubmissionStatus};
use dccn_common::stats::{self, qualify_score, Quality, ReviewStats, StatusPartition};
use dccn_common::{ConferenceSnapshot, Error, SubmissionView};

use super::extract::{Json, Path, Query};
use super::{snapshot, ActingUser, Chair, PageQuery};
use crate::pagination::Page;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ReviewStatsResponse {
    #[serde(flatten)]
    pub stats: ReviewStats,
    pub status: StatusPartition,
}

/// GET /api/conferences/:conf_id/reviews/stats
pub async fn review_stats(State(state): State<AppState>, chair: Chair) -> ApiResult<Json<ReviewStatsResponse>> {
    let snapshot = snapshot(&state, &chair).await?;
    Ok(Json(ReviewStatsResponse {
        stats: ReviewStats::compute(&snapshot.submissions),
        status: StatusPartition::compute(&snapshot.submissions),
    }))
}

#[derive(Debug, Serialize)]
pub struct ReviewItem {
    pub review_id: i64,
    pub reviewer_user_id: i64,
    pub reviewer_name: String,
    pub average_score: f64,
    pub quality: Quality,
    pub submitted: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DecisionItem {
    pub decision_type_id: Option<i64>,
    pub decision: Option<DecisionKind>,
    pub description: Option<String>,
    pub committed: bool,
}

#[derive(Debug, Serialize)]
pub struct DecisionChoice {
    pub id: i64,
    pub decision: DecisionKind,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub title: String,
    pub status: SubmissionStatus,
    pub authors: String,
    pub score: f64,
    pub quality: Quality,
    pub num_missing_reviews: i64,
    pub warnings: Vec<String>,
    pub reviews: Vec<ReviewItem>,
    pub decision: Option<DecisionItem>,
    pub decision_types: Vec<DecisionChoice>,
}

impl FeedItem {
    fn new(sub: &SubmissionView, snapshot: &ConferenceSnapshot, stats: &ReviewStats) -> Self {
        let min_words = sub.min_words_in_review();
        let reviews = sub
            .reviews()
            .iter()
            .map(|rv| {
                let average = rv.review.average_score();
                ReviewItem {
                    review_id: rv.review.id,
                    reviewer_user_id: rv.reviewer.user_id,
                    reviewer_name: snapshot
                        .user(rv.reviewer.user_id)
                        .map(|u| u.full_name())
                        .unwrap_or_default(),
                    average_score: average,
                    quality: qualify_score(average, stats),
                    submitted: rv.review.submitted,
                    warnings: rv.review.warnings(min_words),
                }
            })
            .collect();

        let decision = sub.decision().map(|d| DecisionItem {
            decision_type_id: d.decision.decision_type_id,
            decision: d.kind(),
            description: d.decision_type.as_ref().map(|dt| dt.description.clone()),
            committed: d.decision.committed,
        });

        let decision_types = snapshot
            .decision_types_for(sub)
            .into_iter()
            .map(|dt| DecisionChoice {
                id: dt.id,
                decision: dt.decision,
                description: dt.description.clone(),
            })
            .collect();

        let score = sub.score();
        FeedItem {
            id: sub.id(),
            title: sub.submission.title.clone(),
            status: sub.status(),
            authors: sub.authors_display(),
            score,
            quality: qualify_score(score, stats),
            num_missing_reviews: sub.count_missing_reviews(),
            warnings: sub.review_warnings(),
            reviews,
            decision,
            decision_types,
        }
    }
}

/// GET /api/conferences/:conf_id/reviews
///
/// Submissions past SUBMIT that match the filters, best reviewed first.
pub async fn review_feed(
    State(state): State<AppState>,
    chair: Chair,
    Query(params): Query<FilterParams>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Page<FeedItem>>> {
    let filter = params.submission_filter()?;
    let snapshot = snapshot(&state, &chair).await?;
    let stats = ReviewStats::compute(&snapshot.submissions);

    let mut subs: Vec<&SubmissionView> = filter
        .apply(&snapshot.submissions)
        .into_iter()
        .filter(|s| s.status() != SubmissionStatus::Submitted)
        .collect();
    stats::sort_review_feed(&mut subs);

    let items = subs
        .into_iter()
        .map(|s| FeedItem::new(s, &snapshot, &stats))
        .collect();
    Ok(Json(Page::from_items(items, page.page)))
}

/// GET /api/conferences/:conf_id/reviews/:sub_id
///
/// Single feed entry; papers never sent to review are not in the feed.
pub async fn review_feed_item(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, sub_id)): Path<(i64, i64)>,
) -> ApiResult<Json<FeedItem>> {
    let snapshot = snapshot(&state, &chair).await?;
    let stats = ReviewStats::compute(&snapshot.submissions);
    let sub = snapshot
        .submission(sub_id)
        .filter(|s| s.status() != SubmissionStatus::Submitted)
        .ok_or_else(|| Error::not_found("reviewed submission", sub_id))?;
    Ok(Json(FeedItem::new(sub, &snapshot, &stats)))
}

/// PUT /api/reviews/:review_id
///
/// Reviewer edit; the acting user must own the review.
pub async fn update_review(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(review_id): Path<i64>,
    Json(update): Json<ReviewUpdate>,
) -> ApiResult<Json<Review>> {
    Ok(Json(state.workflow.update_review(review_id, user_id, &update).await?))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conferences/:conf_id/reviews", get(review_feed))
        .route("/api/conferences/:conf_id/reviews/stats", get(review_stats))
        .route("/api/conferences/:conf_id/reviews/:sub_id", get(review_feed_item))
        .route("/api/reviews/:review_id", put(update_review))
}
