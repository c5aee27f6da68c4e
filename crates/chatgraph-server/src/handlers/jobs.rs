//! Scheduler job status.

use axum::extract::State;
use axum::Json;

use crate::schema::JobsResponse;
use crate::state::AppState;

/// All submitted jobs in submission order.
///
/// `GET /jobs`
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(JobsResponse {
        jobs: state.scheduler.jobs(),
    })
}
