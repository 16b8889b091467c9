//! Integration tests for `SqliteStore` against an in-memory database.

use stackit_core::{
  ledger::apply_vote,
  principal::{NewUser, Role, UserPatch},
  store::{Conflict, ForumStore, WriteOutcome},
  votable::{NewAnswer, NewQuestion, QuestionPatch, Votable, VoteTarget},
  vote::{VoteType, Votes},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(name: &str) -> NewUser {
  NewUser {
    username:      name.into(),
    email:         format!("{name}@example.com"),
    password_hash: "$argon2id$v=19$placeholder".into(),
  }
}

fn new_question(title: &str) -> NewQuestion {
  NewQuestion {
    title:       title.into(),
    description: "A description long enough to be realistic.".into(),
    tags:        vec!["rust".into(), "sqlite".into()],
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;

  let WriteOutcome::Written(user) = s.create_user(new_user("ada")).await.unwrap()
  else {
    panic!("expected user to be written");
  };
  assert_eq!(user.role, Role::User);
  assert!(!user.banned);

  let by_id = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.email, "ada@example.com");

  let by_email = s.find_user_by_email("ada@example.com").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, user.user_id);
  assert_eq!(by_email.password_hash, user.password_hash);
}

#[tokio::test]
async fn missing_user_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.find_user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
  let s = store().await;
  s.create_user(new_user("ada")).await.unwrap();

  let mut clash = new_user("grace");
  clash.email = "ada@example.com".into();
  let outcome = s.create_user(clash).await.unwrap();
  assert!(
    matches!(
      outcome,
      WriteOutcome::Conflict(Conflict::Duplicate { field: "email" })
    ),
    "{outcome:?}"
  );
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
  let s = store().await;
  s.create_user(new_user("ada")).await.unwrap();

  let mut clash = new_user("ada");
  clash.email = "other@example.com".into();
  let outcome = s.create_user(clash).await.unwrap();
  assert!(
    matches!(
      outcome,
      WriteOutcome::Conflict(Conflict::Duplicate { field: "username" })
    ),
    "{outcome:?}"
  );
}

#[tokio::test]
async fn update_user_applies_only_given_fields() {
  let s = store().await;
  let WriteOutcome::Written(user) = s.create_user(new_user("ada")).await.unwrap()
  else {
    panic!("expected user to be written");
  };

  let patch = UserPatch {
    banned: Some(true),
    role: Some(Role::Admin),
    ..UserPatch::default()
  };
  let WriteOutcome::Written(updated) =
    s.update_user(user.user_id, patch).await.unwrap()
  else {
    panic!("expected update to be written");
  };
  assert!(updated.banned);
  assert_eq!(updated.role, Role::Admin);
  assert_eq!(updated.username, "ada");
  assert!(updated.updated_at >= user.updated_at);

  let reread = s.get_user(user.user_id).await.unwrap().unwrap();
  assert!(reread.banned);
  assert_eq!(reread.role, Role::Admin);
}

#[tokio::test]
async fn update_user_conflicts_and_missing() {
  let s = store().await;
  s.create_user(new_user("ada")).await.unwrap();
  let WriteOutcome::Written(grace) =
    s.create_user(new_user("grace")).await.unwrap()
  else {
    panic!("expected user to be written");
  };

  let patch = UserPatch {
    email: Some("ada@example.com".into()),
    ..UserPatch::default()
  };
  assert_eq!(
    s.update_user(grace.user_id, patch).await.unwrap(),
    WriteOutcome::Conflict(Conflict::Duplicate { field: "email" })
  );
  assert_eq!(
    s.update_user(Uuid::new_v4(), UserPatch::default()).await.unwrap(),
    WriteOutcome::NotFound
  );
}

#[tokio::test]
async fn delete_user() {
  let s = store().await;
  let WriteOutcome::Written(user) = s.create_user(new_user("ada")).await.unwrap()
  else {
    panic!("expected user to be written");
  };

  assert!(s.delete_user(user.user_id).await.unwrap());
  assert!(!s.delete_user(user.user_id).await.unwrap());
  assert!(s.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_users_keeps_order_and_skips_missing() {
  let s = store().await;
  let mut ids = Vec::new();
  for name in ["ada", "grace"] {
    let WriteOutcome::Written(user) = s.create_user(new_user(name)).await.unwrap()
    else {
      panic!("expected user to be written");
    };
    ids.push(user.user_id);
  }

  let wanted = [ids[1], Uuid::new_v4(), ids[0]];
  let users = s.get_users(&wanted).await.unwrap();
  let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
  assert_eq!(names, ["grace", "ada"]);

  assert!(s.get_users(&[]).await.unwrap().is_empty());
}

// ─── Questions & answers ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_question_starts_with_no_votes() {
  let s = store().await;
  let author = Uuid::new_v4();

  let q = s.create_question(author, new_question("First question")).await.unwrap();
  assert_eq!(q.author, author);
  assert!(q.votes.is_empty());
  assert_eq!(q.version, 0);

  let fetched = s.get_question(q.question_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "First question");
  assert_eq!(fetched.tags, vec!["rust".to_string(), "sqlite".to_string()]);
  assert_eq!(fetched.score(), 0);
}

#[tokio::test]
async fn list_questions_newest_first() {
  let s = store().await;
  let author = Uuid::new_v4();
  let a = s.create_question(author, new_question("older")).await.unwrap();
  let b = s.create_question(author, new_question("newer")).await.unwrap();

  let listed = s.list_questions().await.unwrap();
  let ids: Vec<Uuid> = listed.iter().map(|q| q.question_id).collect();
  assert_eq!(ids, vec![b.question_id, a.question_id]);
}

#[tokio::test]
async fn update_question_patch() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Original title"))
    .await
    .unwrap();

  let patch = QuestionPatch {
    title: Some("Edited title".into()),
    ..QuestionPatch::default()
  };
  let updated = s.update_question(q.question_id, patch).await.unwrap().unwrap();
  assert_eq!(updated.title, "Edited title");
  assert_eq!(updated.description, q.description);

  assert!(
    s.update_question(Uuid::new_v4(), QuestionPatch::default())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn thread_contains_answers_in_order() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Threaded"))
    .await
    .unwrap();

  let mut expected = Vec::new();
  for content in ["first answer here", "second answer here"] {
    let outcome = s
      .create_answer(Uuid::new_v4(), NewAnswer {
        question_id: q.question_id,
        content:     content.into(),
      })
      .await
      .unwrap();
    let WriteOutcome::Written(answer) = outcome else {
      panic!("expected answer to be written");
    };
    expected.push(answer.answer_id);
  }

  let thread = s.get_thread(q.question_id).await.unwrap().unwrap();
  let ids: Vec<Uuid> = thread.answers.iter().map(|a| a.answer_id).collect();
  assert_eq!(ids, expected);
}

#[tokio::test]
async fn answer_to_missing_question_is_not_found() {
  let s = store().await;
  let outcome = s
    .create_answer(Uuid::new_v4(), NewAnswer {
      question_id: Uuid::new_v4(),
      content:     "answer to nothing".into(),
    })
    .await
    .unwrap();
  assert_eq!(outcome, WriteOutcome::NotFound);
}

#[tokio::test]
async fn update_and_delete_answer() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Question"))
    .await
    .unwrap();
  let WriteOutcome::Written(answer) = s
    .create_answer(Uuid::new_v4(), NewAnswer {
      question_id: q.question_id,
      content:     "original content".into(),
    })
    .await
    .unwrap()
  else {
    panic!("expected answer to be written");
  };

  let updated = s
    .update_answer(answer.answer_id, "edited content".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.content, "edited content");

  assert!(s.delete_answer(answer.answer_id).await.unwrap());
  assert!(s.get_answer(answer.answer_id).await.unwrap().is_none());
  assert!(!s.delete_answer(answer.answer_id).await.unwrap());
}

#[tokio::test]
async fn deleting_a_question_cascades_to_answers() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Doomed"))
    .await
    .unwrap();
  let WriteOutcome::Written(answer) = s
    .create_answer(Uuid::new_v4(), NewAnswer {
      question_id: q.question_id,
      content:     "answer that goes too".into(),
    })
    .await
    .unwrap()
  else {
    panic!("expected answer to be written");
  };

  assert!(s.delete_question(q.question_id).await.unwrap());
  assert!(s.get_question(q.question_id).await.unwrap().is_none());
  assert!(s.get_answer(answer.answer_id).await.unwrap().is_none());
  assert!(
    s.vote_snapshot(VoteTarget::Answer(answer.answer_id))
      .await
      .unwrap()
      .is_none()
  );
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_votes_bumps_version() {
  let s = store().await;
  let author = Uuid::new_v4();
  let voter = Uuid::new_v4();
  let q = s.create_question(author, new_question("Votable")).await.unwrap();
  let target = VoteTarget::Question(q.question_id);

  let snap = s.vote_snapshot(target).await.unwrap().unwrap();
  assert_eq!(snap.author, author);
  assert_eq!(snap.version, 0);

  let votes = apply_vote(&snap.votes, voter, VoteType::Upvote);
  let outcome = s.save_votes(target, snap.version, &votes).await.unwrap();
  assert_eq!(outcome, WriteOutcome::Written(1));

  let reread = s.get_question(q.question_id).await.unwrap().unwrap();
  assert_eq!(reread.votes.get(voter), Some(VoteType::Upvote));
  assert_eq!(reread.version, 1);
  assert_eq!(reread.score(), 1);
}

#[tokio::test]
async fn stale_vote_write_is_refused() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Contended"))
    .await
    .unwrap();
  let target = VoteTarget::Question(q.question_id);
  let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

  // Both read version 0.
  let snap_a = s.vote_snapshot(target).await.unwrap().unwrap();
  let snap_b = s.vote_snapshot(target).await.unwrap().unwrap();

  let votes_a = apply_vote(&snap_a.votes, alice, VoteType::Upvote);
  assert_eq!(
    s.save_votes(target, snap_a.version, &votes_a).await.unwrap(),
    WriteOutcome::Written(1)
  );

  let votes_b = apply_vote(&snap_b.votes, bob, VoteType::Downvote);
  assert_eq!(
    s.save_votes(target, snap_b.version, &votes_b).await.unwrap(),
    WriteOutcome::Conflict(Conflict::Version { current: 1 })
  );

  // Alice's vote survived.
  let reread = s.vote_snapshot(target).await.unwrap().unwrap();
  assert_eq!(reread.votes.get(alice), Some(VoteType::Upvote));
  assert_eq!(reread.votes.get(bob), None);
}

#[tokio::test]
async fn answer_votes_are_tracked_separately() {
  let s = store().await;
  let q = s
    .create_question(Uuid::new_v4(), new_question("Parent"))
    .await
    .unwrap();
  let WriteOutcome::Written(answer) = s
    .create_answer(Uuid::new_v4(), NewAnswer {
      question_id: q.question_id,
      content:     "an answer with votes".into(),
    })
    .await
    .unwrap()
  else {
    panic!("expected answer to be written");
  };

  let target = VoteTarget::Answer(answer.answer_id);
  let votes = apply_vote(&Votes::new(), Uuid::new_v4(), VoteType::Downvote);
  assert_eq!(
    s.save_votes(target, 0, &votes).await.unwrap(),
    WriteOutcome::Written(1)
  );

  let answer = s.get_answer(answer.answer_id).await.unwrap().unwrap();
  assert_eq!(answer.score(), -1);
  let question = s.get_question(q.question_id).await.unwrap().unwrap();
  assert!(question.votes.is_empty());
  assert_eq!(question.version, 0);
}

#[tokio::test]
async fn save_votes_on_missing_target() {
  let s = store().await;
  let outcome = s
    .save_votes(VoteTarget::Question(Uuid::new_v4()), 0, &Votes::new())
    .await
    .unwrap();
  assert_eq!(outcome, WriteOutcome::NotFound);
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_count_users_and_questions() {
  let s = store().await;
  s.create_user(new_user("ada")).await.unwrap();
  s.create_user(new_user("grace")).await.unwrap();
  s.create_question(Uuid::new_v4(), new_question("One")).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.user_count, 2);
  assert_eq!(stats.question_count, 1);
}
