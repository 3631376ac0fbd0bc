/// Database row types — these map directly to SQLite rows.
/// Timestamps stay as stored text; callers parse them with `timestamp::parse`.

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: String,
    pub last_login_at: String,
}

pub struct ProfileRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// A message joined with the profile of the other party
/// (the recipient for outbound views, the sender for inbound views).
pub struct MessageViewRow {
    pub id: String,
    pub counterpart: ProfileRow,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}
