use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::rank::{CreateRank, Rank, RankDeletion, RankFilter, UpdateRank},
};
use deployment::Deployment;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, extract::ValidJson, middleware::load_rank_middleware,
};

pub async fn get_ranks(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<RankFilter>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Rank>>>, ApiError> {
    let Query(filter) = query.map_err(|err| ApiError::Validation(err.body_text()))?;
    let ranks = Rank::find_filtered(&deployment.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(ranks)))
}

pub async fn get_rank(
    Extension(rank): Extension<Rank>,
) -> Result<ResponseJson<ApiResponse<Rank>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(rank)))
}

pub async fn create_rank(
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<CreateRank>,
) -> Result<ResponseJson<ApiResponse<Rank>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let rank = Rank::create(&tx, &payload, Uuid::new_v4()).await?;
    tx.commit().await?;

    tracing::info!(rank_id = %rank.id, name = %rank.name, "Created rank");
    Ok(ResponseJson(ApiResponse::success(rank)))
}

pub async fn update_rank(
    Extension(existing): Extension<Rank>,
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<UpdateRank>,
) -> Result<ResponseJson<ApiResponse<Rank>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let rank = Rank::update(&tx, existing.id, &payload).await?;
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success(rank)))
}

pub async fn delete_rank(
    Extension(existing): Extension<Rank>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<RankDeletion>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let deletion = Rank::delete(&tx, existing.id).await?;
    tx.commit().await?;

    let message = format!(
        "Rank deleted, {} member(s) moved to the default rank",
        deletion.reassigned_members
    );
    Ok(ResponseJson(ApiResponse::success_with_message(
        deletion, message,
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let rank_router = Router::new()
        .route(
            "/",
            get(get_rank).patch(update_rank).delete(delete_rank),
        )
        .layer(from_fn_with_state(deployment.clone(), load_rank_middleware));

    let inner = Router::new()
        .route("/", get(get_ranks).post(create_rank))
        .nest("/{rank_id}", rank_router);

    Router::new().nest("/ranks", inner)
}
