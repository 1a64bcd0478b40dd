//! Grading flows and per-student serialization through the worker pool

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use taskjudge::{
    Config, Engine, ExecutionRequest, WorkerPool,
    db::{InMemorySolutionRepository, SolutionRepository},
    models::{Language, SubmissionMode, TaskTarget},
    services::GradingService,
};

use common::*;

fn service(engine: Engine) -> (GradingService, Arc<InMemorySolutionRepository>) {
    let repo = Arc::new(InMemorySolutionRepository::new());
    let service = GradingService::new(WorkerPool::new(Arc::new(engine), 4), repo.clone());
    (service, repo)
}

#[tokio::test]
async fn test_task_solutions_are_averaged_on_close() {
    let tmp = TempDir::new().unwrap();
    let config = Config::rooted_at(tmp.path());
    let engine = engine_with(&config, vec![ShellStrategy::new(Language::Python, "cat Solution.py")]);
    let (service, repo) = service(engine);

    let mut task = task(6, TaskTarget::Test(4), SubmissionMode::Editor);
    let test = test_of(4, &[7, 9]);

    for exercise_id in [7, 9] {
        let graded = service
            .submit(ExecutionRequest {
                task: task.clone(),
                user: student(10),
                test: Some(test.clone()),
                exercise: Some(exercise(exercise_id, Language::Python)),
                payload: Some(editor(&format!("answer_{}", exercise_id))),
                timeout_seconds: None,
            })
            .await
            .unwrap();
        assert!(graded.outcome.success, "{}", graded.outcome.message);
        assert_eq!(graded.outcome.result_lines, vec![format!("answer_{}", exercise_id)]);
    }

    let solution = repo.find_solution(6, 10).await.unwrap().unwrap();
    assert_eq!(solution.path, tmp.path().join("solutions/6/3/10"));
    assert!(repo.find_solution_test(solution.id).await.unwrap().is_some());

    let parts = repo.list_solution_exercises(solution.id).await.unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].path, tmp.path().join("solutions/6/3/10/7"));
    assert_eq!(parts[1].path, tmp.path().join("solutions/6/3/10/9"));

    service.rate_exercise(&task, 10, 7, 3.0).await.unwrap();
    service.rate_exercise(&task, 10, 9, 4.0).await.unwrap();

    let closed = service.close_task(&mut task).await.unwrap();
    assert!(task.is_rated);
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].rate, 3.5);
    assert_eq!(repo.find_solution(6, 10).await.unwrap().unwrap().rate, 3.5);

    // Closed tasks take no further submissions
    let late = service
        .submit(ExecutionRequest {
            task: task.clone(),
            user: student(10),
            test: Some(test),
            exercise: Some(exercise(7, Language::Python)),
            payload: Some(editor("too late")),
            timeout_seconds: None,
        })
        .await
        .unwrap();
    assert_eq!(late.outcome.error_code.as_deref(), Some("TASK_CLOSED"));
    assert!(late.solution.is_none());
}

#[tokio::test]
async fn exercises_of_one_test_run_side_by_side() {
    let tmp = TempDir::new().unwrap();
    let config = Config::rooted_at(tmp.path());
    let engine = engine_with(
        &config,
        vec![ShellStrategy::new(Language::Python, "sleep 0.3; cat Solution.py")],
    );
    let (service, repo) = service(engine);

    let task = task(6, TaskTarget::Test(4), SubmissionMode::Editor);
    let test = test_of(4, &[7, 9]);
    let request = |exercise_id: i64| ExecutionRequest {
        task: task.clone(),
        user: student(10),
        test: Some(test.clone()),
        exercise: Some(exercise(exercise_id, Language::Python)),
        payload: Some(editor(&format!("answer_{}", exercise_id))),
        timeout_seconds: Some(10),
    };

    let (seven, nine) = tokio::join!(service.submit(request(7)), service.submit(request(9)));
    let (seven, nine) = (seven.unwrap(), nine.unwrap());

    assert!(seven.outcome.success, "{}", seven.outcome.message);
    assert!(nine.outcome.success, "{}", nine.outcome.message);
    assert_eq!(seven.outcome.result_lines, vec!["answer_7"]);
    assert_eq!(nine.outcome.result_lines, vec!["answer_9"]);

    let solution = repo.find_solution(6, 10).await.unwrap().unwrap();
    let mut exercise_ids: Vec<i64> = repo
        .list_solution_exercises(solution.id)
        .await
        .unwrap()
        .iter()
        .map(|part| part.exercise_id)
        .collect();
    exercise_ids.sort();
    assert_eq!(exercise_ids, vec![7, 9]);
}

#[tokio::test]
async fn same_student_submissions_never_interleave() {
    let tmp = TempDir::new().unwrap();
    let config = Config::rooted_at(tmp.path());
    // Copies the solution, waits, then checks nobody rewrote it meanwhile
    let engine = engine_with(
        &config,
        vec![ShellStrategy::new(
            Language::Python,
            "cp Solution.py seen.txt; sleep 0.2; cmp -s Solution.py seen.txt && cat Solution.py",
        )],
    );
    let pool = WorkerPool::new(Arc::new(engine), 4);
    let task = task(5, TaskTarget::Exercise(7), SubmissionMode::Editor);

    let handles: Vec<_> = (0..5)
        .map(|n| {
            pool.submit(ExecutionRequest {
                task: task.clone(),
                user: student(10),
                test: None,
                exercise: Some(exercise(7, Language::Python)),
                payload: Some(editor(&format!("revision {}", n))),
                timeout_seconds: Some(10),
            })
        })
        .collect();

    let outcomes = futures::future::join_all(handles).await;
    let outcomes: Vec<_> = outcomes.into_iter().map(|r| r.unwrap()).collect();

    // Only the newest submission survives; the rest were superseded
    let last = outcomes.last().unwrap();
    assert!(last.success, "{}", last.message);
    assert_eq!(last.result_lines, vec!["revision 4"]);
    for earlier in &outcomes[..4] {
        if earlier.success {
            assert_eq!(earlier.result_lines.len(), 1);
        } else {
            assert_eq!(earlier.error_code.as_deref(), Some("CANCELLED"));
        }
    }

    let dir = tmp.path().join("solutions/5/3/10");
    assert_eq!(std::fs::read_to_string(dir.join("Solution.py")).unwrap(), "revision 4");
    assert_eq!(std::fs::read_to_string(dir.join("result.txt")).unwrap(), "revision 4");
}

#[tokio::test]
async fn different_students_run_in_parallel() {
    let tmp = TempDir::new().unwrap();
    let config = Config::rooted_at(tmp.path());
    let engine = engine_with(
        &config,
        vec![ShellStrategy::new(Language::Python, "sleep 0.5; cat Solution.py")],
    );
    let pool = WorkerPool::new(Arc::new(engine), 4);
    let task = task(5, TaskTarget::Exercise(7), SubmissionMode::Editor);

    let started = std::time::Instant::now();
    let handles: Vec<_> = (1..=4)
        .map(|user_id| {
            pool.submit(ExecutionRequest {
                task: task.clone(),
                user: student(user_id),
                test: None,
                exercise: Some(exercise(7, Language::Python)),
                payload: Some(editor(&format!("user {}", user_id))),
                timeout_seconds: Some(10),
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.result_lines, vec![format!("user {}", i + 1)]);
    }
    assert!(started.elapsed() < std::time::Duration::from_millis(1900));
}
