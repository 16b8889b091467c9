//! [`SqliteStore`], the SQLite implementation of [`ForumStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use stackit_core::{
  principal::{NewUser, Role, User, UserPatch},
  store::{Conflict, ForumStore, Stats, WriteOutcome},
  votable::{
    Answer, NewAnswer, NewQuestion, Question, QuestionPatch, QuestionThread,
    VoteSnapshot, VoteTarget,
  },
  vote::Votes,
};

use crate::{
  Result,
  encode::{
    ANSWER_COLUMNS, QUESTION_COLUMNS, RawAnswer, RawQuestion, RawUser,
    USER_COLUMNS, decode_uuid, decode_u64, decode_votes, encode_dt,
    encode_role, encode_tags, encode_uuid, encode_votes,
  },
  schema::SCHEMA,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The table and primary-key column holding a vote target.
fn vote_table(target: VoteTarget) -> (&'static str, &'static str) {
  match target {
    VoteTarget::Question(_) => ("questions", "question_id"),
    VoteTarget::Answer(_) => ("answers", "answer_id"),
  }
}

/// The constraint message if `err` is a UNIQUE violation.
fn unique_violation(err: &rusqlite::Error) -> Option<String> {
  match err {
    rusqlite::Error::SqliteFailure(e, msg)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      Some(msg.clone().unwrap_or_default())
    }
    _ => None,
  }
}

/// Map a `UNIQUE constraint failed: users.<col>` message to the field name.
fn duplicate_field(msg: &str) -> &'static str {
  if msg.contains("users.email") {
    "email"
  } else {
    "username"
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A StackIt store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn answers_for(&self, question_id: Uuid) -> Result<Vec<Answer>> {
    let id_str = encode_uuid(question_id);

    let raws: Vec<RawAnswer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANSWER_COLUMNS} FROM answers
           WHERE question_id = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAnswer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnswer::into_answer).collect()
  }
}

// ─── ForumStore impl ─────────────────────────────────────────────────────────

impl ForumStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<WriteOutcome<User>> {
    let now = Utc::now();
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      role:          Role::User,
      banned:        false,
      created_at:    now,
      updated_at:    now,
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let hash     = user.password_hash.clone();
    let role_str = encode_role(user.role).to_owned();
    let at_str   = encode_dt(now);

    let duplicate: Option<String> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (
             user_id, username, email, password_hash,
             role, banned, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
          rusqlite::params![id_str, username, email, hash, role_str, at_str],
        );
        match inserted {
          Ok(_) => Ok(None),
          Err(e) => match unique_violation(&e) {
            Some(msg) => Ok(Some(msg)),
            None => Err(e.into()),
          },
        }
      })
      .await?;

    Ok(match duplicate {
      None => WriteOutcome::Written(user),
      Some(msg) => WriteOutcome::Conflict(Conflict::Duplicate {
        field: duplicate_field(&msg),
      }),
    })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn get_users<'a>(&'a self, ids: &'a [Uuid]) -> Result<Vec<User>> {
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"
        ))?;
        let mut rows = Vec::with_capacity(id_strs.len());
        for id in &id_strs {
          if let Some(raw) = stmt
            .query_row(rusqlite::params![id], RawUser::from_row)
            .optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> Result<WriteOutcome<User>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let outcome: WriteOutcome<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current = tx
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?;
        let Some(mut raw) = current else {
          return Ok(WriteOutcome::NotFound);
        };

        if let Some(username) = patch.username {
          raw.username = username;
        }
        if let Some(email) = patch.email {
          raw.email = email;
        }
        if let Some(role) = patch.role {
          raw.role = encode_role(role).to_owned();
        }
        if let Some(banned) = patch.banned {
          raw.banned = banned;
        }
        raw.updated_at = at_str;

        let updated = tx.execute(
          "UPDATE users
           SET username = ?2, email = ?3, role = ?4, banned = ?5, updated_at = ?6
           WHERE user_id = ?1",
          rusqlite::params![
            raw.user_id,
            raw.username,
            raw.email,
            raw.role,
            raw.banned,
            raw.updated_at,
          ],
        );
        if let Err(e) = updated {
          return match unique_violation(&e) {
            Some(msg) => Ok(WriteOutcome::Conflict(Conflict::Duplicate {
              field: duplicate_field(&msg),
            })),
            None => Err(e.into()),
          };
        }

        tx.commit()?;
        Ok(WriteOutcome::Written(raw))
      })
      .await?;

    Ok(match outcome {
      WriteOutcome::Written(raw) => WriteOutcome::Written(raw.into_user()?),
      WriteOutcome::NotFound => WriteOutcome::NotFound,
      WriteOutcome::Conflict(c) => WriteOutcome::Conflict(c),
    })
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn create_question(
    &self,
    author: Uuid,
    input: NewQuestion,
  ) -> Result<Question> {
    let now = Utc::now();
    let question = Question {
      question_id: Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      tags:        input.tags,
      author,
      votes:       Votes::new(),
      version:     0,
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = encode_uuid(question.question_id);
    let author_str  = encode_uuid(author);
    let title       = question.title.clone();
    let description = question.description.clone();
    let tags_str    = encode_tags(&question.tags)?;
    let votes_str   = encode_votes(&question.votes)?;
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO questions (
             question_id, author_id, title, description, tags,
             votes, version, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
          rusqlite::params![
            id_str,
            author_str,
            title,
            description,
            tags_str,
            votes_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawQuestion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {QUESTION_COLUMNS} FROM questions WHERE question_id = ?1"
              ),
              rusqlite::params![id_str],
              RawQuestion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawQuestion::into_question).transpose()
  }

  async fn get_thread(&self, id: Uuid) -> Result<Option<QuestionThread>> {
    let question = match self.get_question(id).await? {
      Some(q) => q,
      None => return Ok(None),
    };
    let answers = self.answers_for(id).await?;
    Ok(Some(QuestionThread { question, answers }))
  }

  async fn list_questions(&self) -> Result<Vec<Question>> {
    let raws: Vec<RawQuestion> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_COLUMNS} FROM questions
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawQuestion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  async fn update_question(
    &self,
    id: Uuid,
    patch: QuestionPatch,
  ) -> Result<Option<Question>> {
    let Some(mut question) = self.get_question(id).await? else {
      return Ok(None);
    };

    if let Some(title) = patch.title {
      question.title = title;
    }
    if let Some(description) = patch.description {
      question.description = description;
    }
    if let Some(tags) = patch.tags {
      question.tags = tags;
    }
    question.updated_at = Utc::now();

    let id_str      = encode_uuid(id);
    let title       = question.title.clone();
    let description = question.description.clone();
    let tags_str    = encode_tags(&question.tags)?;
    let at_str      = encode_dt(question.updated_at);

    // Only the editable columns are written, so a concurrent vote write to
    // the same row is never lost.
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE questions
           SET title = ?2, description = ?3, tags = ?4, updated_at = ?5
           WHERE question_id = ?1",
          rusqlite::params![id_str, title, description, tags_str, at_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    Ok(Some(question))
  }

  async fn delete_question(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM questions WHERE question_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(question_id = %id, "deleted question and its answers");
    }
    Ok(deleted > 0)
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn create_answer(
    &self,
    author: Uuid,
    input: NewAnswer,
  ) -> Result<WriteOutcome<Answer>> {
    let answer = Answer {
      answer_id:   Uuid::new_v4(),
      question_id: input.question_id,
      content:     input.content,
      author,
      votes:       Votes::new(),
      version:     0,
      created_at:  Utc::now(),
    };

    let id_str       = encode_uuid(answer.answer_id);
    let question_str = encode_uuid(answer.question_id);
    let author_str   = encode_uuid(author);
    let content      = answer.content.clone();
    let votes_str    = encode_votes(&answer.votes)?;
    let at_str       = encode_dt(answer.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM questions WHERE question_id = ?1",
            rusqlite::params![question_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO answers (
             answer_id, question_id, author_id, content,
             votes, version, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
          rusqlite::params![
            id_str,
            question_str,
            author_str,
            content,
            votes_str,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if inserted {
      WriteOutcome::Written(answer)
    } else {
      WriteOutcome::NotFound
    })
  }

  async fn get_answer(&self, id: Uuid) -> Result<Option<Answer>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAnswer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE answer_id = ?1"),
              rusqlite::params![id_str],
              RawAnswer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAnswer::into_answer).transpose()
  }

  async fn update_answer(&self, id: Uuid, content: String) -> Result<Option<Answer>> {
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE answers SET content = ?2 WHERE answer_id = ?1",
          rusqlite::params![id_str, content],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_answer(id).await
  }

  async fn delete_answer(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM answers WHERE answer_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn vote_snapshot(&self, target: VoteTarget) -> Result<Option<VoteSnapshot>> {
    let (table, id_col) = vote_table(target);
    let id_str = encode_uuid(target.id());

    let raw: Option<(String, String, i64)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT author_id, votes, version FROM {table} WHERE {id_col} = ?1"
              ),
              rusqlite::params![id_str],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(author, votes, version)| -> Result<VoteSnapshot> {
        Ok(VoteSnapshot {
          target,
          author: decode_uuid(&author)?,
          votes: decode_votes(&votes)?,
          version: decode_u64(version),
        })
      })
      .transpose()
  }

  async fn save_votes<'a>(
    &'a self,
    target: VoteTarget,
    expected_version: u64,
    votes: &'a Votes,
  ) -> Result<WriteOutcome<u64>> {
    let (table, id_col) = vote_table(target);
    let id_str    = encode_uuid(target.id());
    let votes_str = encode_votes(votes)?;
    let expected  = expected_version as i64;

    let current: Option<Option<i64>> = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          &format!(
            "UPDATE {table} SET votes = ?2, version = version + 1
             WHERE {id_col} = ?1 AND version = ?3"
          ),
          rusqlite::params![id_str, votes_str, expected],
        )?;
        if updated == 1 {
          return Ok(None);
        }

        let current: Option<i64> = conn
          .query_row(
            &format!("SELECT version FROM {table} WHERE {id_col} = ?1"),
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        Ok(Some(current))
      })
      .await?;

    Ok(match current {
      None => WriteOutcome::Written(expected_version + 1),
      Some(None) => WriteOutcome::NotFound,
      Some(Some(current)) => {
        tracing::debug!(
          %target,
          expected_version,
          current,
          "vote write refused: version moved"
        );
        WriteOutcome::Conflict(Conflict::Version {
          current: decode_u64(current),
        })
      }
    })
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<Stats> {
    let (users, questions): (i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM users), (SELECT COUNT(*) FROM questions)",
          [],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(Stats {
      user_count:     decode_u64(users),
      question_count: decode_u64(questions),
    })
  }
}
