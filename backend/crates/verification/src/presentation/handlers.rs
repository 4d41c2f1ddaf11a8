//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use kernel::id::{ItemId, VerificationRequestId};
use std::sync::Arc;

use crate::application::config::VerificationConfig;
use crate::application::decide::{DecideInput, DecideUseCase};
use crate::application::history::{ItemHistoryUseCase, RequestTimelineUseCase};
use crate::application::request_verification::{
    RequestVerificationInput, RequestVerificationUseCase,
};
use crate::application::review::ReviewByTokenUseCase;
use crate::application::withdraw::WithdrawPendingUseCase;
use crate::domain::repository::{
    ItemRepository, ItemStores, Notifier, UserDirectory, VerificationLogRepository,
    VerificationRequestRepository,
};
use crate::domain::services::{Clock, TokenIssuer};
use crate::domain::value_objects::{Decision, ItemKind};
use crate::error::{VerificationError, VerificationResult};
use crate::presentation::dto::{
    CreateRequestBody, DecisionBody, DecisionResponse, HistoryResponse, RequestCreatedResponse,
    RequestSummary, ReviewResponse, TimelineResponse, WithdrawResponse,
};
use crate::presentation::middleware::{ClientInfo, CurrentUser};

/// Shared state for verification handlers
pub struct VerificationAppState<R, I, U, N> {
    pub repo: Arc<R>,
    pub items: Arc<ItemStores<I>>,
    pub users: Arc<U>,
    pub notifier: Arc<N>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub config: Arc<VerificationConfig>,
}

impl<R, I, U, N> Clone for VerificationAppState<R, I, U, N> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            items: self.items.clone(),
            users: self.users.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

/// POST /requests
pub async fn create_request<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateRequestBody>,
) -> VerificationResult<(StatusCode, Json<RequestCreatedResponse>)>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = RequestVerificationUseCase::new(
        state.repo.clone(),
        state.items.clone(),
        state.users.clone(),
        state.notifier.clone(),
        state.clock.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let request = use_case
        .execute(RequestVerificationInput {
            requester_id: user.user_id,
            item_kind: body.item_kind.parse()?,
            item_id: parse_item_id(&body.item_id)?,
            verifier_email: body.verifier_email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestCreatedResponse::from(&request)),
    ))
}

/// GET /requests/{id}/timeline
pub async fn request_timeline<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> VerificationResult<Json<TimelineResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let verification_id = id
        .trim()
        .parse::<VerificationRequestId>()
        .map_err(|_| VerificationError::RequestNotFound)?;

    let entries = RequestTimelineUseCase::new(state.repo.clone())
        .execute(user.user_id, verification_id)
        .await?;

    Ok(Json(TimelineResponse {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}

/// GET /items/{kind}/{id}/history
pub async fn item_history<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    Extension(user): Extension<CurrentUser>,
    Path((kind, id)): Path<(String, String)>,
) -> VerificationResult<Json<HistoryResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let kind: ItemKind = kind.parse()?;
    let item_id = parse_item_id(&id)?;

    let requests = ItemHistoryUseCase::new(state.repo.clone(), state.items.clone())
        .execute(user.user_id, kind, item_id)
        .await?;

    let now = state.clock.now();
    Ok(Json(HistoryResponse {
        requests: requests
            .iter()
            .map(|r| RequestSummary::from_entity(r, now))
            .collect(),
    }))
}

/// POST /items/{kind}/{id}/withdraw
pub async fn withdraw_pending<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    Extension(user): Extension<CurrentUser>,
    Path((kind, id)): Path<(String, String)>,
) -> VerificationResult<Json<WithdrawResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let kind: ItemKind = kind.parse()?;
    let item_id = parse_item_id(&id)?;

    let withdrawn = WithdrawPendingUseCase::new(
        state.repo.clone(),
        state.items.clone(),
        state.users.clone(),
        state.clock.clone(),
    )
    .execute(user.user_id, kind, item_id)
    .await?;

    Ok(Json(WithdrawResponse { withdrawn }))
}

/// GET /token/{token}
pub async fn review_by_token<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    ClientInfo(client): ClientInfo,
    Path(token): Path<String>,
) -> VerificationResult<Json<ReviewResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = ReviewByTokenUseCase::new(
        state.repo.clone(),
        state.items.clone(),
        state.users.clone(),
        state.clock.clone(),
    );

    let output = use_case.execute(&token, &client).await?;
    Ok(Json(output.into()))
}

/// POST /token/{token}/approve
pub async fn approve<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    ClientInfo(client): ClientInfo,
    Path(token): Path<String>,
    Json(body): Json<DecisionBody>,
) -> VerificationResult<Json<DecisionResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    decide(state, client, token, Decision::Approve, body).await
}

/// POST /token/{token}/reject
pub async fn reject<R, I, U, N>(
    State(state): State<VerificationAppState<R, I, U, N>>,
    ClientInfo(client): ClientInfo,
    Path(token): Path<String>,
    Json(body): Json<DecisionBody>,
) -> VerificationResult<Json<DecisionResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    decide(state, client, token, Decision::Reject, body).await
}

async fn decide<R, I, U, N>(
    state: VerificationAppState<R, I, U, N>,
    client: platform::client::ClientContext,
    token: String,
    decision: Decision,
    body: DecisionBody,
) -> VerificationResult<Json<DecisionResponse>>
where
    R: VerificationRequestRepository + VerificationLogRepository + Send + Sync + 'static,
    I: ItemRepository + Send + Sync + 'static,
    U: UserDirectory + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let use_case = DecideUseCase::new(
        state.repo.clone(),
        state.items.clone(),
        state.users.clone(),
        state.notifier.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(
            DecideInput {
                token,
                decision,
                actor_email: body.actor_email,
                comment: body.comment,
            },
            &client,
        )
        .await?;

    Ok(Json(DecisionResponse {
        id: output.verification_id,
        status: output.status,
    }))
}

/// A malformed item id cannot name an item the caller owns
fn parse_item_id(raw: &str) -> VerificationResult<ItemId> {
    raw.trim()
        .parse::<ItemId>()
        .map_err(|_| VerificationError::InvalidArgument("itemId must be a UUID".to_string()))
}
