//! Shape checks on request bodies, applied before anything reaches the store.
//!
//! Each check collects every violation rather than stopping at the first, so
//! a client can fix a form in one round trip. Lengths are in characters.

use crate::error::{Error, Result};

const NAME_LEN: (usize, usize) = (2, 50);
const PASSWORD_MIN: usize = 6;
const TITLE_LEN: (usize, usize) = (10, 200);
const DESCRIPTION_MIN: usize = 20;
const TAG_LEN: (usize, usize) = (2, 20);
const MAX_TAGS: usize = 5;
const ANSWER_MIN: usize = 10;

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
  fn min(&mut self, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
      self.0.push(format!("{field} must be at least {min} characters"));
    }
  }

  fn between(&mut self, field: &str, value: &str, (min, max): (usize, usize)) {
    let len = value.chars().count();
    if len < min || len > max {
      self
        .0
        .push(format!("{field} must be between {min} and {max} characters"));
    }
  }

  fn email(&mut self, value: &str) {
    let well_formed = value
      .split_once('@')
      .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
      && !value.contains(char::is_whitespace);
    if !well_formed {
      self.0.push("email must be a valid email address".into());
    }
  }

  fn tags(&mut self, tags: &[String]) {
    if tags.len() > MAX_TAGS {
      self.0.push(format!("at most {MAX_TAGS} tags are allowed"));
    }
    for tag in tags {
      self.between("tag", tag, TAG_LEN);
    }
  }

  fn finish(self) -> Result<()> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(self.0))
    }
  }
}

pub fn registration(name: &str, email: &str, password: &str) -> Result<()> {
  let mut v = Violations::default();
  v.between("name", name, NAME_LEN);
  v.email(email);
  v.min("password", password, PASSWORD_MIN);
  v.finish()
}

pub fn login(email: &str, password: &str) -> Result<()> {
  let mut v = Violations::default();
  v.email(email);
  if password.is_empty() {
    v.0.push("password is required".into());
  }
  v.finish()
}

pub fn question(
  title: Option<&str>,
  description: Option<&str>,
  tags: Option<&[String]>,
) -> Result<()> {
  let mut v = Violations::default();
  if let Some(title) = title {
    v.between("title", title, TITLE_LEN);
  }
  if let Some(description) = description {
    v.min("description", description, DESCRIPTION_MIN);
  }
  if let Some(tags) = tags {
    v.tags(tags);
  }
  v.finish()
}

/// Admin edits to an account; only the fields being changed are checked.
pub fn user_patch(username: Option<&str>, email: Option<&str>) -> Result<()> {
  let mut v = Violations::default();
  if let Some(username) = username {
    v.between("username", username, NAME_LEN);
  }
  if let Some(email) = email {
    v.email(email);
  }
  v.finish()
}

pub fn answer(content: &str) -> Result<()> {
  let mut v = Violations::default();
  v.min("content", content, ANSWER_MIN);
  v.finish()
}
