//! Row → model conversions. A column that does not parse is a store error.

use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use messagely_db::models::{MessageViewRow, ProfileRow, UserRow};
use messagely_db::timestamp;
use messagely_types::models::{ReceivedMessage, SentMessage, UserDetail, UserSummary};

use crate::error::Result;

pub(crate) fn summary(row: ProfileRow) -> UserSummary {
    UserSummary {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }
}

pub(crate) fn detail(row: UserRow) -> Result<UserDetail> {
    let join_at = parse_time(&row.join_at, "join_at", &row.username)?;
    let last_login_at = parse_time(&row.last_login_at, "last_login_at", &row.username)?;

    Ok(UserDetail {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
        join_at,
        last_login_at,
    })
}

pub(crate) fn sent(row: MessageViewRow) -> Result<SentMessage> {
    let (id, sent_at, read_at) = message_meta(&row)?;
    Ok(SentMessage {
        id,
        to_user: summary(row.counterpart),
        body: row.body,
        sent_at,
        read_at,
    })
}

pub(crate) fn received(row: MessageViewRow) -> Result<ReceivedMessage> {
    let (id, sent_at, read_at) = message_meta(&row)?;
    Ok(ReceivedMessage {
        id,
        from_user: summary(row.counterpart),
        body: row.body,
        sent_at,
        read_at,
    })
}

fn message_meta(row: &MessageViewRow) -> Result<(Uuid, DateTime<Utc>, Option<DateTime<Utc>>)> {
    let id = row
        .id
        .parse::<Uuid>()
        .with_context(|| format!("Corrupt message id '{}'", row.id))?;
    let sent_at = parse_time(&row.sent_at, "sent_at", &row.id)?;
    let read_at = row
        .read_at
        .as_deref()
        .map(|raw| parse_time(raw, "read_at", &row.id))
        .transpose()?;

    Ok((id, sent_at, read_at))
}

fn parse_time(raw: &str, column: &str, key: &str) -> Result<DateTime<Utc>> {
    let ts = timestamp::parse(raw).with_context(|| format!("Corrupt {} on '{}'", column, key))?;
    Ok(ts)
}
