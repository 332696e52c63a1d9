use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::member::{CreateMember, Member, MemberDeletion, MemberFilter, UpdateMember},
};
use deployment::Deployment;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, extract::ValidJson, middleware::load_member_middleware,
};

pub async fn get_members(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<MemberFilter>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    let Query(filter) = query.map_err(|err| ApiError::Validation(err.body_text()))?;
    let members = Member::find_all(&deployment.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn get_member(
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn create_member(
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<CreateMember>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let member = Member::create(&tx, &payload, Uuid::new_v4()).await?;
    tx.commit().await?;

    tracing::info!(member_id = %member.id, rank = %member.rank.name, "Created member");
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn update_member(
    Extension(existing): Extension<Member>,
    State(deployment): State<DeploymentImpl>,
    ValidJson(payload): ValidJson<UpdateMember>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let member = Member::update(&tx, existing.id, &payload).await?;
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn delete_member(
    Extension(existing): Extension<Member>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<MemberDeletion>>, ApiError> {
    let tx = deployment.db().pool.begin().await?;
    let deletion = Member::delete(&tx, existing.id).await?;
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        deletion,
        "Member deleted",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let member_router = Router::new()
        .route(
            "/",
            get(get_member).patch(update_member).delete(delete_member),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_member_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_members).post(create_member))
        .nest("/{member_id}", member_router);

    Router::new().nest("/members", inner)
}
