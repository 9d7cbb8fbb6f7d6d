//! REST handlers.
//!
//! Reads go straight to the store snapshot; the admin patch writes through
//! the counting service so it shares the guild lock with the engine.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::{
    ChannelState, HistoryPoint, MemberRecord, Metric, Mutation, SettingKey, Visibility,
    aggregate_members, rank_channel, rank_servers,
};
use tracing::info;

use super::ApiState;
use super::error::ApiError;
use super::fields::project;
use crate::error::CountingError;

/// Default and maximum page sizes of `/servers/:id/users`.
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct ServerRow {
    pub id: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    pub id: String,
    pub count: i64,
    pub previous_user: Option<PreviousUser>,
}

#[derive(Debug, Serialize)]
pub struct PreviousUser {
    pub id: String,
    pub counts: u64,
    pub fails: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub id: String,
    pub counts: u64,
    pub fails: u64,
    pub cf_ratio: u64,
}

impl MemberRow {
    fn new(id: &str, record: &MemberRecord) -> Self {
        Self {
            id: id.to_string(),
            counts: record.counts,
            fails: record.fails,
            cf_ratio: record.cf_ratio(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberPage {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub users: Vec<MemberRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldsQuery {
    pub fields: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MembersQuery {
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Body of `PATCH /servers/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerPatch {
    pub channel_id: Option<String>,
    pub count: Option<i64>,
    pub settings: Option<SettingsPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub one_by_one: Option<bool>,
    pub reset_on_fail: Option<bool>,
    pub talking: Option<bool>,
    pub no_deletion: Option<bool>,
    pub pin_milestones: Option<bool>,
    pub unlisted: Option<bool>,
    pub visibility: Option<String>,
}

impl ServerPatch {
    /// Validate the body and turn it into a mutation batch.
    ///
    /// `visibility` is applied after `unlisted` so it wins when both are given.
    pub fn mutations(&self) -> Result<Vec<Mutation>, ApiError> {
        let mut mutations = Vec::new();
        if let Some(channel) = &self.channel_id {
            mutations.push(Mutation::SetChannel(Some(channel.clone())));
        }
        if let Some(count) = self.count {
            if count < 0 {
                return Err(ApiError::Unprocessable(format!(
                    "count must not be negative, got {}",
                    count
                )));
            }
            mutations.push(Mutation::SetCount(count));
        }
        if let Some(settings) = &self.settings {
            let toggles = [
                (SettingKey::OneByOne, settings.one_by_one),
                (SettingKey::ResetOnFail, settings.reset_on_fail),
                (SettingKey::Talking, settings.talking),
                (SettingKey::NoDeletion, settings.no_deletion),
                (SettingKey::PinMilestones, settings.pin_milestones),
                (SettingKey::Unlisted, settings.unlisted),
            ];
            for (key, value) in toggles {
                if let Some(value) = value {
                    mutations.push(Mutation::SetSetting(key, value));
                }
            }
            if let Some(visibility) = &settings.visibility {
                let visibility: Visibility = visibility
                    .parse()
                    .map_err(|e: tally_core::CoreError| ApiError::Unprocessable(e.to_string()))?;
                mutations.push(Mutation::SetVisibility(visibility));
            }
        }
        Ok(mutations)
    }
}

fn summary(id: &str, state: &ChannelState) -> ServerSummary {
    let previous_user = state.previous_poster_id.as_deref().map(|member| {
        let record = state.member(member);
        PreviousUser {
            id: member.to_string(),
            counts: record.counts,
            fails: record.fails,
        }
    });
    ServerSummary {
        id: id.to_string(),
        count: state.count,
        previous_user,
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn parse_param<T: std::str::FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    raw.map(|raw| {
        raw.parse()
            .map_err(|_| ApiError::Unprocessable(format!("invalid {}: {}", name, raw)))
    })
    .transpose()
}

async fn enabled_guild(state: &ApiState, id: &str) -> Result<ChannelState, ApiError> {
    let guild = state.service.store().get(id).await?;
    if !guild.is_enabled() {
        return Err(ApiError::guild_not_found(id));
    }
    Ok(guild)
}

/// `GET /servers`
pub async fn list_servers(State(state): State<ApiState>) -> Result<Json<Vec<ServerRow>>, ApiError> {
    let snapshot = state.service.store().snapshot().await?;
    let ranking = rank_servers(
        snapshot
            .iter()
            .filter(|(_, guild)| guild.is_enabled())
            .map(|(id, guild)| (id.as_str(), guild)),
        usize::MAX,
    );
    let rows = ranking
        .entries
        .into_iter()
        .map(|entry| ServerRow {
            id: entry.subject_id,
            count: entry.value,
        })
        .collect();
    Ok(Json(rows))
}

/// `GET /servers/:id`
pub async fn show_server(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<FieldsQuery>,
) -> Result<Json<Value>, ApiError> {
    let guild = enabled_guild(&state, &id).await?;
    let body = to_value(&summary(&id, &guild))?;
    Ok(Json(project(body, query.fields.as_deref())?))
}

/// `GET /servers/:id/users`
pub async fn list_members(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<MemberPage>, ApiError> {
    let metric = match query.sort.as_deref() {
        Some(sort) => sort
            .parse::<Metric>()
            .map_err(|e| ApiError::Unprocessable(e.to_string()))?,
        None => Metric::default(),
    };
    let page = parse_param::<usize>("page", query.page.as_deref())?.unwrap_or(1).max(1);
    let limit = parse_param::<usize>("limit", query.limit.as_deref())?.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::Unprocessable(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let guild = enabled_guild(&state, &id).await?;
    let ranking = rank_channel(&guild, metric, usize::MAX);
    let users = ranking
        .page(page, limit)
        .iter()
        .map(|entry| MemberRow::new(&entry.subject_id, &guild.member(&entry.subject_id)))
        .collect();
    Ok(Json(MemberPage {
        page,
        limit,
        total: guild.members.len(),
        users,
    }))
}

/// `GET /servers/:id/users/:user_id`
pub async fn show_member(
    State(state): State<ApiState>,
    Path((id, member)): Path<(String, String)>,
    Query(query): Query<FieldsQuery>,
) -> Result<Json<Value>, ApiError> {
    let guild = enabled_guild(&state, &id).await?;
    let record = guild
        .members
        .get(&member)
        .ok_or_else(|| ApiError::member_not_found(&member))?;
    let body = serde_json::json!({
        "server": {"id": id, "count": guild.count},
        "user": {"id": member},
        "counts": record.counts,
        "fails": record.fails,
        "cfRatio": record.cf_ratio(),
    });
    Ok(Json(project(body, query.fields.as_deref())?))
}

/// `GET /users/:id`
pub async fn show_user(
    State(state): State<ApiState>,
    Path(member): Path<String>,
    Query(query): Query<FieldsQuery>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.service.store().snapshot().await?;
    let merged = aggregate_members(snapshot.iter().map(|(_, guild)| guild));
    let (_, record) = merged
        .iter()
        .find(|(id, _)| *id == member)
        .ok_or_else(|| ApiError::member_not_found(&member))?;
    let body = to_value(&MemberRow::new(&member, record))?;
    Ok(Json(project(body, query.fields.as_deref())?))
}

/// `GET /servers/:id/history`
pub async fn history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let since = parse_param::<i64>("since", query.since.as_deref())?;
    let until = parse_param::<i64>("until", query.until.as_deref())?;
    let guild = enabled_guild(&state, &id).await?;
    let points = guild
        .history
        .into_iter()
        .filter(|point| since.is_none_or(|since| point.time >= since))
        .filter(|point| until.is_none_or(|until| point.time <= until))
        .collect();
    Ok(Json(points))
}

/// `PATCH /servers/:id`, routed only when the admin API is enabled.
///
/// A body carrying `channelId` may enable a guild; anything else needs the
/// guild to be enabled already.
pub async fn patch_server(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<ServerPatch>, JsonRejection>,
) -> Result<Json<ServerSummary>, ApiError> {
    let Json(patch) = body.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let mutations = patch.mutations()?;
    let changes = mutations.len();
    let enables = patch.channel_id.is_some();

    let updated = state
        .service
        .modify(&id, move |current| {
            if !current.is_enabled() && !enables {
                return Err(CountingError::NotEnabled);
            }
            Ok(mutations)
        })
        .await
        .map_err(|e| match e {
            CountingError::NotEnabled => ApiError::guild_not_found(&id),
            other => ApiError::from(other),
        })?;
    info!(guild = %id, changes, "Guild patched through admin API");
    Ok(Json(summary(&id, &updated)))
}
