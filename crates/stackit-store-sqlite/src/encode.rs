//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microseconds, `Z`) so that
//! lexical order equals chronological order. Tags and vote mappings are
//! compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use stackit_core::{
  principal::{Role, User},
  votable::{Answer, Question},
  vote::Votes,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::User => "user",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode {
    column: "role",
    value:  s.to_owned(),
  })
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_votes(votes: &Votes) -> Result<String> {
  Ok(serde_json::to_string(votes)?)
}

pub fn decode_votes(s: &str) -> Result<Votes> { Ok(serde_json::from_str(s)?) }

pub fn decode_u64(v: i64) -> u64 { u64::try_from(v).unwrap_or_default() }

// ─── Raw row types ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, username, email, password_hash, \
                                role, banned, created_at, updated_at";

/// A `users` row as read from SQLite, before decoding.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub banned:        bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      banned:        row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      banned:        self.banned,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const QUESTION_COLUMNS: &str = "question_id, author_id, title, \
                                    description, tags, votes, version, \
                                    created_at, updated_at";

/// A `questions` row as read from SQLite, before decoding.
pub struct RawQuestion {
  pub question_id: String,
  pub author_id:   String,
  pub title:       String,
  pub description: String,
  pub tags:        String,
  pub votes:       String,
  pub version:     i64,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawQuestion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id: row.get(0)?,
      author_id:   row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      tags:        row.get(4)?,
      votes:       row.get(5)?,
      version:     row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      question_id: decode_uuid(&self.question_id)?,
      title:       self.title,
      description: self.description,
      tags:        decode_tags(&self.tags)?,
      author:      decode_uuid(&self.author_id)?,
      votes:       decode_votes(&self.votes)?,
      version:     decode_u64(self.version),
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const ANSWER_COLUMNS: &str = "answer_id, question_id, author_id, content, \
                                  votes, version, created_at";

/// An `answers` row as read from SQLite, before decoding.
pub struct RawAnswer {
  pub answer_id:   String,
  pub question_id: String,
  pub author_id:   String,
  pub content:     String,
  pub votes:       String,
  pub version:     i64,
  pub created_at:  String,
}

impl RawAnswer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      answer_id:   row.get(0)?,
      question_id: row.get(1)?,
      author_id:   row.get(2)?,
      content:     row.get(3)?,
      votes:       row.get(4)?,
      version:     row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_answer(self) -> Result<Answer> {
    Ok(Answer {
      answer_id:   decode_uuid(&self.answer_id)?,
      question_id: decode_uuid(&self.question_id)?,
      content:     self.content,
      author:      decode_uuid(&self.author_id)?,
      votes:       decode_votes(&self.votes)?,
      version:     decode_u64(self.version),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
