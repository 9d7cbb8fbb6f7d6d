//! Guild repository for database queries.

use crate::db::DbError;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tally_core::{ChannelState, HistoryPoint, MemberRecord, Mutation, SettingKey, Settings, Visibility};

type GuildRow = (
    String,
    Option<String>,
    i64,
    Option<String>,
    Option<String>,
    bool,
    bool,
    bool,
    bool,
    bool,
    String,
);

const SELECT_GUILD: &str = r#"
    SELECT id, channel_id, count, previous_poster_id, previous_message_id,
           one_by_one, reset_on_fail, talking, no_deletion, pin_milestones, visibility
    FROM guilds
"#;

/// Repository for guild state.
pub struct GuildRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GuildRepository<'a> {
    /// Create a new guild repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load one guild, `None` if it has no row.
    pub async fn load(&self, guild: &str) -> Result<Option<ChannelState>, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, GuildRow>(&format!("{} WHERE id = ?", SELECT_GUILD))
            .bind(guild)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut state = row_to_state(row)?;

        let members = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT member_id, counts, fails
            FROM members
            WHERE guild_id = ?
            ORDER BY member_id
            "#,
        )
        .bind(guild)
        .fetch_all(&mut *tx)
        .await?;

        for (member_id, counts, fails) in members {
            let record = member_record(guild, counts, fails)?;
            state.members.insert(member_id, record);
        }

        state.history = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT time, count
            FROM count_history
            WHERE guild_id = ?
            ORDER BY id
            "#,
        )
        .bind(guild)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(time, count)| HistoryPoint { time, count })
        .collect();

        tx.commit().await?;
        Ok(Some(state))
    }

    /// Load every guild in one read transaction, ordered by guild id.
    pub async fn load_all(&self) -> Result<Vec<(String, ChannelState)>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, GuildRow>(&format!("{} ORDER BY id", SELECT_GUILD))
            .fetch_all(&mut *tx)
            .await?;

        let mut guilds = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.0.clone();
            index.insert(id.clone(), guilds.len());
            guilds.push((id, row_to_state(row)?));
        }

        let members = sqlx::query_as::<_, (String, String, i64, i64)>(
            r#"
            SELECT guild_id, member_id, counts, fails
            FROM members
            ORDER BY guild_id, member_id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        for (guild, member_id, counts, fails) in members {
            if let Some(&slot) = index.get(&guild) {
                let record = member_record(&guild, counts, fails)?;
                guilds[slot].1.members.insert(member_id, record);
            }
        }

        let history = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT guild_id, time, count
            FROM count_history
            ORDER BY guild_id, id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        for (guild, time, count) in history {
            if let Some(&slot) = index.get(&guild) {
                guilds[slot].1.history.push(HistoryPoint { time, count });
            }
        }

        tx.commit().await?;
        Ok(guilds)
    }

    /// Every stored guild id.
    pub async fn ids(&self) -> Result<Vec<String>, DbError> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM guilds ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(ids)
    }

    /// Apply a batch of mutations in one transaction, creating the row if needed.
    pub async fn apply(&self, guild: &str, mutations: &[Mutation]) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO guilds (id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(guild)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for mutation in mutations {
            apply_one(&mut *tx, guild, mutation).await?;
        }

        sqlx::query("UPDATE guilds SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(guild)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a guild with its members and history. Returns whether a row existed.
    pub async fn delete(&self, guild: &str) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM members WHERE guild_id = ?")
            .bind(guild)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM count_history WHERE guild_id = ?")
            .bind(guild)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM guilds WHERE id = ?")
            .bind(guild)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn apply_one(conn: &mut SqliteConnection, guild: &str, mutation: &Mutation) -> Result<(), DbError> {
    match mutation {
        Mutation::SetChannel(channel) => {
            sqlx::query("UPDATE guilds SET channel_id = ? WHERE id = ?")
                .bind(channel.as_deref())
                .bind(guild)
                .execute(&mut *conn)
                .await?;
        }
        Mutation::SetCount(count) => {
            sqlx::query("UPDATE guilds SET count = ? WHERE id = ?")
                .bind((*count).max(0))
                .bind(guild)
                .execute(&mut *conn)
                .await?;
        }
        Mutation::ResetCount => {
            sqlx::query("UPDATE guilds SET count = 0 WHERE id = ?")
                .bind(guild)
                .execute(&mut *conn)
                .await?;
        }
        Mutation::SetPreviousPoster(poster) => {
            sqlx::query("UPDATE guilds SET previous_poster_id = ? WHERE id = ?")
                .bind(poster.as_deref())
                .bind(guild)
                .execute(&mut *conn)
                .await?;
        }
        Mutation::SetPreviousMessage(message) => {
            sqlx::query("UPDATE guilds SET previous_message_id = ? WHERE id = ?")
                .bind(message.as_deref())
                .bind(guild)
                .execute(&mut *conn)
                .await?;
        }
        Mutation::SetSetting(key, value) => match setting_column(*key) {
            Some(column) => {
                let sql = format!("UPDATE guilds SET {} = ? WHERE id = ?", column);
                sqlx::query(&sql)
                    .bind(*value)
                    .bind(guild)
                    .execute(&mut *conn)
                    .await?;
            }
            None => set_visibility(conn, guild, Visibility::from_unlisted(*value)).await?,
        },
        Mutation::SetVisibility(visibility) => {
            set_visibility(conn, guild, *visibility).await?;
        }
        Mutation::IncrementCounts(member) => {
            sqlx::query(
                r#"
                INSERT INTO members (guild_id, member_id, counts, fails)
                VALUES (?, ?, 1, 0)
                ON CONFLICT(guild_id, member_id) DO UPDATE SET counts = counts + 1
                "#,
            )
            .bind(guild)
            .bind(member)
            .execute(&mut *conn)
            .await?;
        }
        Mutation::IncrementFails(member) => {
            sqlx::query(
                r#"
                INSERT INTO members (guild_id, member_id, counts, fails)
                VALUES (?, ?, 0, 1)
                ON CONFLICT(guild_id, member_id) DO UPDATE SET fails = fails + 1
                "#,
            )
            .bind(guild)
            .bind(member)
            .execute(&mut *conn)
            .await?;
        }
        Mutation::PushHistory(point) => {
            sqlx::query("INSERT INTO count_history (guild_id, time, count) VALUES (?, ?, ?)")
                .bind(guild)
                .bind(point.time)
                .bind(point.count)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

/// Column backing a boolean setting; `unlisted` lives in `visibility`.
fn setting_column(key: SettingKey) -> Option<&'static str> {
    match key {
        SettingKey::OneByOne => Some("one_by_one"),
        SettingKey::ResetOnFail => Some("reset_on_fail"),
        SettingKey::Talking => Some("talking"),
        SettingKey::NoDeletion => Some("no_deletion"),
        SettingKey::PinMilestones => Some("pin_milestones"),
        SettingKey::Unlisted => None,
    }
}

async fn set_visibility(
    conn: &mut SqliteConnection,
    guild: &str,
    visibility: Visibility,
) -> Result<(), DbError> {
    sqlx::query("UPDATE guilds SET visibility = ? WHERE id = ?")
        .bind(visibility.as_str())
        .bind(guild)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn row_to_state(row: GuildRow) -> Result<ChannelState, DbError> {
    let (
        id,
        channel_id,
        count,
        previous_poster_id,
        previous_message_id,
        one_by_one,
        reset_on_fail,
        talking,
        no_deletion,
        pin_milestones,
        visibility,
    ) = row;

    let visibility = visibility.parse::<Visibility>().map_err(|e| DbError::Corrupt {
        guild: id.clone(),
        reason: e.to_string(),
    })?;

    Ok(ChannelState {
        channel_id,
        count: count.max(0),
        previous_poster_id,
        previous_message_id,
        members: Default::default(),
        history: Vec::new(),
        settings: Settings {
            one_by_one,
            reset_on_fail,
            talking,
            no_deletion,
            pin_milestones,
            visibility,
        },
    })
}

fn member_record(guild: &str, counts: i64, fails: i64) -> Result<MemberRecord, DbError> {
    match (u64::try_from(counts), u64::try_from(fails)) {
        (Ok(counts), Ok(fails)) => Ok(MemberRecord::new(counts, fails)),
        _ => Err(DbError::Corrupt {
            guild: guild.to_string(),
            reason: format!("negative member counters ({}, {})", counts, fails),
        }),
    }
}
