use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::job::{CreateJob, Job, JobError, JobFilter, UpdateJob},
};
use deployment::Deployment;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, extract::ValidJson, middleware::load_job_middleware,
};

pub async fn get_jobs(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Job>>>, ApiError> {
    let Query(filter) = query.map_err(|err| ApiError::Validation(err.body_text()))?;
    let jobs = Job::find_all(&deployment.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(jobs)))
}

pub async fn get_job(
    Extension(job): Extension<Job>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn create_job(
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<CreateJob>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let job = Job::create(&tx, &payload, Uuid::new_v4()).await?;
    tx.commit().await?;

    tracing::info!(job_id = %job.id, job_name = %job.job_name, "Created job");
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn update_job(
    Extension(existing): Extension<Job>,
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<UpdateJob>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let job = Job::update(&tx, existing.id, &payload).await?;
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success(job)))
}

pub async fn delete_job(
    Extension(existing): Extension<Job>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let deleted = Job::delete(&tx, existing.id).await?;
    if deleted == 0 {
        return Err(JobError::JobNotFound.into());
    }
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Job deleted",
    )))
}

pub async fn calculate_job_payments(
    Extension(existing): Extension<Job>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Job>>, ApiError> {
    let job = deployment
        .job_payments()
        .calculate_payments(&deployment.db().pool, existing.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(job)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let job_router = Router::new()
        .route("/", get(get_job).patch(update_job).delete(delete_job))
        .route("/payments", get(calculate_job_payments))
        .layer(from_fn_with_state(deployment.clone(), load_job_middleware));

    let inner = Router::new()
        .route("/", get(get_jobs).post(create_job))
        .nest("/{job_id}", job_router);

    Router::new().nest("/jobs", inner)
}
