// tests/quiz_flow.rs

use chrono::{DateTime, Duration, TimeZone, Utc};
use quiz_core::{
    Amount, Answer, BonusOutcome, PortError, Question, QuizDefinition, QuizError, QuizGame, QuizStatus,
    Responses, Reward, BONUS_GOLD_CATEGORY, BONUS_POINTS_CATEGORY,
};
use quiz_service::adapters::{InMemoryStore, ManualClock};
use quiz_service::scheduler::sync_statuses;
use quiz_service::QuizService;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

struct TestApp {
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    service: QuizService,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap()
}

/// Helper that wires the service to the in-memory adapters and a fixed clock.
fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = QuizService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
    );
    TestApp { store, clock, service }
}

fn tagged_question(text: &str, tag: &str) -> Question {
    let mut question = Question::new(
        text,
        vec![Answer::new("right", true), Answer::new("wrong", false)],
    );
    question.tags.insert(tag.to_string());
    question
}

/// Creates an active 4-question quiz over the "routing" tag with a stocked pool.
async fn seed_quiz(app: &TestApp, pool_size: usize) -> QuizDefinition {
    let mut quiz = QuizDefinition::new(
        "Routing basics",
        start_time() - Duration::days(1),
        start_time() + Duration::days(60),
    );
    quiz.question_count = 4;
    quiz.tags.insert("routing".to_string());
    quiz.activate();
    app.service.create_quiz(&quiz).await.expect("Failed to create quiz");

    for i in 0..pool_size {
        app.store
            .add_question(QuizGame::QPOOL_CATEGORY, tagged_question(&format!("Routing {}", i), "routing"))
            .await;
    }
    // Noise that must never be assigned.
    app.store
        .add_question(QuizGame::QPOOL_CATEGORY, tagged_question("Cooking", "kitchen"))
        .await;
    app.store
        .add_question("other-game", tagged_question("Routing elsewhere", "routing"))
        .await;
    quiz
}

/// Answers the first `right` assigned questions correctly and the rest wrongly.
fn answer(questions: &[Question], right: usize) -> Responses {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let pick = if i < right { &q.answers[0] } else { &q.answers[1] };
            (q.id, [pick.id].into_iter().collect::<BTreeSet<_>>())
        })
        .collect()
}

#[tokio::test]
async fn full_lifecycle_awards_first_and_highscore_bonuses() {
    // Arrange
    let app = spawn_app();
    let quiz = seed_quiz(&app, 10).await;
    let player = Uuid::new_v4();

    // Act: first play, 3 of 4 right
    let (quiz, mut session) = app.service.open_session(player, quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    app.service.start(&mut session).await.unwrap();
    app.clock.advance(Duration::seconds(90));
    assert_eq!(app.service.time_remaining(&quiz, &session), Some(210));

    let responses = answer(&session.questions, 3);
    let first = app.service.submit(&quiz, &mut session, &responses).await.unwrap();

    // Assert
    assert_eq!(first.reward, Reward::new(75, 22));
    assert_eq!(first.bonus, BonusOutcome::FirstSubmission(Reward::new(75, 22)));
    assert!(session.is_played());
    assert!(!app.service.can_replay(&quiz, &session));
    assert_eq!(app.service.days_until_replay(&quiz, &session), 7);

    // Act: replay after the cooldown, all right
    app.clock.advance(Duration::days(7));
    assert!(app.service.can_replay(&quiz, &session));
    let (quiz, mut session) = app.service.open_session(player, quiz.id).await.unwrap();
    app.service.start(&mut session).await.unwrap();
    let responses = answer(&session.questions, 4);
    let second = app.service.submit(&quiz, &mut session, &responses).await.unwrap();

    // Assert
    assert_eq!(second.reward, Reward::new(100, 30));
    assert_eq!(second.bonus, BonusOutcome::NewHighscore(Reward::new(25, 8)));
    assert_eq!(app.store.total_credited(player, BONUS_POINTS_CATEGORY).await, 100);
    assert_eq!(app.store.total_credited(player, BONUS_GOLD_CATEGORY).await, 30);

    let credits = app.store.credits().await;
    assert_eq!(credits.len(), 4);
    assert!(credits.iter().all(|c| c.source.as_deref() == Some(QuizGame::QPOOL_CATEGORY)));
    assert_eq!(credits[2].amount, Amount::Points(25));

    let notices = app.store.notices().await;
    assert_eq!(notices.len(), 2);
    assert_eq!(
        notices[1].render(),
        "received 25 points and 8 gold bonus for beating their highscore at quiz Routing basics"
    );

    let stored = app.service.open_session(player, quiz.id).await.unwrap().1;
    assert_eq!(stored.attempts.len(), 2);
    assert_eq!(stored.attempts.best().unwrap().points, 100);
}

#[tokio::test]
async fn worse_attempt_is_recorded_without_bonus() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 4).await;
    let player = Uuid::new_v4();

    let (quiz, mut session) = app.service.open_session(player, quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    let questions = session.questions.clone();

    app.service.start(&mut session).await.unwrap();
    app.service.submit(&quiz, &mut session, &answer(&questions, 4)).await.unwrap();

    app.clock.advance(Duration::days(8));
    app.service.start(&mut session).await.unwrap();
    let worse = app.service.submit(&quiz, &mut session, &answer(&questions, 1)).await.unwrap();

    assert_eq!(worse.reward, Reward::new(25, 7));
    assert_eq!(worse.bonus, BonusOutcome::NotBeaten);
    assert_eq!(session.attempts.last().unwrap().points, 25);
    assert_eq!(app.store.credits().await.len(), 2);
    assert_eq!(app.store.notices().await.len(), 1);
}

#[tokio::test]
async fn assignment_happens_once_and_respects_the_filter() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 10).await;
    let player = Uuid::new_v4();

    let (quiz, mut session) = app.service.open_session(player, quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    let first: Vec<_> = session.questions.iter().map(|q| q.id).collect();
    assert_eq!(first.len(), 4);
    assert!(session
        .questions
        .iter()
        .all(|q| q.tags.contains("routing") && q.text.starts_with("Routing ")));

    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    let (_, reloaded) = app.service.open_session(player, quiz.id).await.unwrap();
    let again: Vec<_> = reloaded.questions.iter().map(|q| q.id).collect();
    assert_eq!(first, again);
}

#[tokio::test]
async fn small_pool_assigns_what_is_available() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 2).await;

    let (quiz, mut session) = app.service.open_session(Uuid::new_v4(), quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();

    assert_eq!(session.questions.len(), 2);
}

#[tokio::test]
async fn unknown_question_aborts_submission() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 4).await;
    let player = Uuid::new_v4();

    let (quiz, mut session) = app.service.open_session(player, quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    app.service.start(&mut session).await.unwrap();

    let mut responses = answer(&session.questions, 4);
    responses.insert(Uuid::new_v4(), BTreeSet::new());
    let result = app.service.submit(&quiz, &mut session, &responses).await;

    assert!(matches!(result, Err(QuizError::QuestionNotFound(_))));
    assert!(session.is_running());
    assert!(session.attempts.is_empty());
    assert!(app.store.credits().await.is_empty());
}

#[tokio::test]
async fn session_cannot_be_graded_against_another_quiz() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 4).await;
    let mut other = QuizDefinition::new(
        "Switching basics",
        start_time() - Duration::days(1),
        start_time() + Duration::days(60),
    );
    other.points_reward = 1000;
    other.activate();
    app.service.create_quiz(&other).await.unwrap();

    let (quiz, mut session) = app.service.open_session(Uuid::new_v4(), quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    app.service.start(&mut session).await.unwrap();

    let responses = answer(&session.questions, 4);
    let result = app.service.submit(&other, &mut session, &responses).await;

    assert!(matches!(result, Err(QuizError::InvalidDefinition(_))));
    assert!(session.is_running());
    assert!(session.attempts.is_empty());
    assert!(app.store.credits().await.is_empty());
    assert!(app.store.notices().await.is_empty());
}

#[tokio::test]
async fn late_submission_is_still_graded() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 4).await;

    let (quiz, mut session) = app.service.open_session(Uuid::new_v4(), quiz.id).await.unwrap();
    app.service.assign_questions(&quiz, &mut session).await.unwrap();
    app.service.start(&mut session).await.unwrap();
    app.clock.advance(Duration::seconds(400));

    assert_eq!(app.service.time_remaining(&quiz, &session), Some(-100));
    let responses = answer(&session.questions, 2);
    let late = app.service.submit(&quiz, &mut session, &responses).await.unwrap();
    assert_eq!(late.reward, Reward::new(50, 15));
}

#[tokio::test]
async fn empty_submission_scores_zero() {
    let app = spawn_app();
    let quiz = seed_quiz(&app, 4).await;

    let (quiz, mut session) = app.service.open_session(Uuid::new_v4(), quiz.id).await.unwrap();
    app.service.start(&mut session).await.unwrap();
    let result = app.service.submit(&quiz, &mut session, &Responses::new()).await.unwrap();

    assert_eq!(result.reward, Reward::new(0, 0));
    assert_eq!(result.bonus, BonusOutcome::FirstSubmission(Reward::new(0, 0)));
}

#[tokio::test]
async fn invalid_quiz_is_rejected_and_unknown_quiz_is_not_found() {
    let app = spawn_app();
    let mut quiz = QuizDefinition::new("Broken", start_time(), start_time());
    quiz.question_count = 3;

    let err = app.service.create_quiz(&quiz).await.unwrap_err();
    assert!(matches!(err, QuizError::InvalidDefinition(_)));

    let err = app.service.open_session(Uuid::new_v4(), quiz.id).await.unwrap_err();
    assert!(matches!(err, QuizError::Port(PortError::NotFound(_))));
}

#[tokio::test]
async fn player_views_group_sessions() {
    let app = spawn_app();
    let open = seed_quiz(&app, 4).await;
    let mut old = QuizDefinition::new(
        "Old news",
        start_time() - Duration::days(30),
        start_time() - Duration::days(2),
    );
    old.expire();
    app.service.create_quiz(&old).await.unwrap();
    let player = Uuid::new_v4();

    app.service.open_session(player, open.id).await.unwrap();
    let (old, mut old_session) = app.service.open_session(player, old.id).await.unwrap();
    app.service.start(&mut old_session).await.unwrap();
    app.service.submit(&old, &mut old_session, &Responses::new()).await.unwrap();

    let qp = app.service.load_player(player).await.unwrap();
    assert_eq!(qp.quizzes.len(), 2);
    assert_eq!(qp.active_quizzes()[0].quiz.id, open.id);
    assert_eq!(qp.expired_quizzes()[0].quiz.id, old.id);
    assert_eq!(qp.played_quizzes()[0].quiz.id, old.id);
}

#[tokio::test]
async fn scheduler_follows_the_window() {
    let app = spawn_app();
    let mut upcoming = QuizDefinition::new(
        "Next week",
        start_time() + Duration::days(7),
        start_time() + Duration::days(14),
    );
    upcoming.activate();
    app.service.create_quiz(&upcoming).await.unwrap();
    let running = QuizDefinition::new("Now", start_time() - Duration::days(1), start_time() + Duration::days(1));
    app.service.create_quiz(&running).await.unwrap();

    assert_eq!(sync_statuses(&app.service).await.unwrap(), 2);
    assert_eq!(sync_statuses(&app.service).await.unwrap(), 0);

    let statuses = |quizzes: Vec<QuizDefinition>| quizzes.into_iter().map(|q| (q.name, q.status)).collect::<Vec<_>>();
    assert_eq!(
        statuses(app.service.list_quizzes().await.unwrap()),
        vec![
            ("Now".to_string(), QuizStatus::Active),
            ("Next week".to_string(), QuizStatus::Pending),
        ]
    );

    app.clock.set(start_time() + Duration::days(15));
    assert_eq!(sync_statuses(&app.service).await.unwrap(), 2);
    assert!(app.service.list_quizzes().await.unwrap().iter().all(|q| q.is_expired()));
}
