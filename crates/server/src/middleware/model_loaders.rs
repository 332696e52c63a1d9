use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{job::Job, member::Member, rank::Rank};
use deployment::Deployment;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

fn parse_id(model_name: &'static str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!(model = model_name, raw, "Rejected malformed id");
        ApiError::InvalidId(model_name)
    })
}

async fn fetch_model<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, ApiError>
where
    E: Display + Into<ApiError>,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} {model_id} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(error.into())
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<Response, ApiError>
where
    M: Clone + Send + Sync + 'static,
    E: Display + Into<ApiError>,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_rank_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(rank_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let rank_id = parse_id("rank", &rank_id)?;
    load_request_extension(
        request,
        next,
        "Rank",
        rank_id,
        Rank::find_by_id(&deployment.db().pool, rank_id),
    )
    .await
}

pub async fn load_member_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(member_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let member_id = parse_id("member", &member_id)?;
    load_request_extension(
        request,
        next,
        "Member",
        member_id,
        Member::find_by_id(&deployment.db().pool, member_id),
    )
    .await
}

pub async fn load_job_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(job_id): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let job_id = parse_id("job", &job_id)?;
    load_request_extension(
        request,
        next,
        "Job",
        job_id,
        Job::find_by_id(&deployment.db().pool, job_id),
    )
    .await
}
