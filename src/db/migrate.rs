use sqlx::SqlitePool;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init_schema",
    include_str!("../../sql/001_init_schema.sql"),
)];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrationError> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await?;

    let mut applied_count = 0;

    for &(name, sql) in MIGRATIONS {
        if applied.iter().any(|done| done == name) {
            tracing::debug!(migration = name, "Already applied, skipping");
            continue;
        }

        tracing::info!(migration = name, "Applying migration...");

        let mut tx = pool.begin().await?;
        for statement in split_sql_statements(sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|source| MigrationError::Migration {
                    name: name.to_string(),
                    source,
                })?;
        }

        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES (?)"#)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        applied_count += 1;
        tracing::info!(migration = name, "Migration applied successfully");
    }

    if applied_count > 0 {
        tracing::info!(count = applied_count, "Database migrations completed");
    } else {
        tracing::info!("Database is up to date, no migrations needed");
    }

    Ok(())
}

/// Splits a migration script on top-level `;`, skipping `--` comment lines.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    let body = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for ch in body.chars() {
        match ch {
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration '{name}' failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_outside_quotes() {
        let sql = "-- header; ignored\nCREATE TABLE a (x TEXT DEFAULT ';');\nINSERT INTO a VALUES ('b;c');";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE a (x TEXT DEFAULT ';')");
        assert_eq!(statements[1], "INSERT INTO a VALUES ('b;c')");
    }

    #[test]
    fn schema_script_has_every_table() {
        let statements = split_sql_statements(MIGRATIONS[0].1);
        for table in [
            "students",
            "courses",
            "enrollments",
            "assignments",
            "assignment_submissions",
            "quizzes",
            "quiz_attempts",
            "certificates",
            "notifications",
            "dashboard_analytics",
        ] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {table} (");
            assert!(
                statements.iter().any(|s| s.starts_with(&needle)),
                "missing table {table}"
            );
        }
    }
}
