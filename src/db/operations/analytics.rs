use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Executor, Sqlite};

/// Counters added to a student's rollup for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollupDelta {
    pub study_time: i64,
    pub courses_accessed: i64,
    pub quizzes_completed: i64,
    pub assignments_submitted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub study_time: i64,
    pub courses_accessed: i64,
    pub quizzes_completed: i64,
    pub assignments_submitted: i64,
}

/// Adds `delta` to the (student, date) row, creating it on first use.
pub async fn add_to_rollup<'e, E>(
    executor: E,
    student_id: i64,
    date: NaiveDate,
    delta: RollupDelta,
) -> Result<DailyRollup, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailyRollup>(
        r#"
        INSERT INTO dashboard_analytics (
            student_id, date, study_time, courses_accessed, quizzes_completed, assignments_submitted
        )
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (student_id, date) DO UPDATE SET
            study_time = study_time + EXCLUDED.study_time,
            courses_accessed = courses_accessed + EXCLUDED.courses_accessed,
            quizzes_completed = quizzes_completed + EXCLUDED.quizzes_completed,
            assignments_submitted = assignments_submitted + EXCLUDED.assignments_submitted
        RETURNING date, study_time, courses_accessed, quizzes_completed, assignments_submitted
        "#,
    )
    .bind(student_id)
    .bind(date)
    .bind(delta.study_time)
    .bind(delta.courses_accessed)
    .bind(delta.quizzes_completed)
    .bind(delta.assignments_submitted)
    .fetch_one(executor)
    .await
}

/// Rollups with `from <= date <= to`, oldest first.
pub async fn rollups_between<'e, E>(
    executor: E,
    student_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyRollup>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailyRollup>(
        r#"
        SELECT date, study_time, courses_accessed, quizzes_completed, assignments_submitted
        FROM dashboard_analytics
        WHERE student_id = ? AND date >= ? AND date <= ?
        ORDER BY date
        "#,
    )
    .bind(student_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}
