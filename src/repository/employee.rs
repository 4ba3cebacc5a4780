use sqlx::PgPool;
use std::fmt;

use crate::models::employee::{Employee, EmployeeDraft};

/// Typed failures surfaced by the employee store. The store never recovers;
/// every condition propagates to the caller as-is.
#[derive(Debug)]
pub enum RepositoryError {
    /// No row matched the requested primary key.
    NotFound(i32),
    /// More than one row matched a primary-key lookup (invariant violation).
    AmbiguousResult(i32),
    /// An insert payload lacked a required value.
    MissingRequiredField(&'static str),
    /// An insert collided with an existing primary key.
    DuplicateKey(i32),
    /// The underlying query round trip could not complete.
    Storage(sqlx::Error),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::NotFound(id) => write!(f, "no employee with id {}", id),
            RepositoryError::AmbiguousResult(id) => {
                write!(f, "more than one employee with id {}", id)
            }
            RepositoryError::MissingRequiredField(field) => {
                write!(f, "missing required field `{}`", field)
            }
            RepositoryError::DuplicateKey(id) => write!(f, "employee id {} already exists", id),
            RepositoryError::Storage(err) => write!(f, "storage error: {}", err),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Storage(err)
    }
}

const EMPLOYEE_COLUMNS: &str = "id, name, image, gender, hire_date, mail_address, \
     zip_code, address, telephone, salary, characteristics, dependents_count";

/// Projection plus a trailing clause, e.g. a WHERE filter or ordering.
fn select_employees(clause: &str) -> String {
    format!("SELECT {} FROM employees {}", EMPLOYEE_COLUMNS, clause)
}

/// Wraps a search fragment in LIKE wildcards on both sides. An empty fragment
/// becomes `%%`, which matches every row. Wildcard characters inside the
/// fragment are passed through to the pattern matcher unescaped.
fn like_pattern(fragment: &str) -> String {
    format!("%{}%", fragment)
}

/// Next-id policy: one past the current maximum, starting at 1 when the table
/// is empty (MAX over an empty set comes back as NULL).
fn next_id_after(max: Option<i32>) -> i32 {
    max.map_or(1, |id| id + 1)
}

fn required_id(draft: &EmployeeDraft) -> Result<i32, RepositoryError> {
    draft.id.ok_or(RepositoryError::MissingRequiredField("id"))
}

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Data-access facade over the `employees` table. Owns SQL construction and
/// row mapping; execution goes through the injected pool. Holds no mutable
/// state between calls, so a clone per handler is cheap and safe.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        EmployeeRepository { pool }
    }

    /// Every employee, ordered ascending by hire date. An empty table yields
    /// an empty list, not an error.
    pub async fn find_all(&self) -> Result<Vec<Employee>, RepositoryError> {
        let sql = select_employees("ORDER BY hire_date");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    /// Exact primary-key lookup. Zero rows is `NotFound`; more than one row
    /// means the uniqueness invariant is broken and surfaces as
    /// `AmbiguousResult` rather than silently picking a winner.
    pub async fn find_by_id(&self, id: i32) -> Result<Employee, RepositoryError> {
        let sql = select_employees("WHERE id = $1 LIMIT 2");
        let mut rows = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        match rows.len() {
            0 => Err(RepositoryError::NotFound(id)),
            1 => Ok(rows.remove(0)),
            _ => Err(RepositoryError::AmbiguousResult(id)),
        }
    }

    /// Substring search on the name column, ordered ascending by hire date.
    /// The fragment is bound as a single parameter with `%` markers added on
    /// both sides, so an empty fragment matches everything. LIKE
    /// metacharacters supplied by the caller are not escaped.
    pub async fn find_by_name(&self, fragment: &str) -> Result<Vec<Employee>, RepositoryError> {
        let sql = select_employees("WHERE name LIKE $1 ORDER BY hire_date");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    /// Patch operation: rewrites only `dependents_count` for the given id.
    /// Matching zero rows is still success; the caller cannot tell a no-op
    /// from an applied update.
    pub async fn update_dependents_count(
        &self,
        id: i32,
        dependents_count: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE employees SET dependents_count = $1 WHERE id = $2")
            .bind(dependents_count)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Writes a full new row. The draft must already carry the id obtained
    /// from `next_id`; the insert does not allocate one itself. A primary-key
    /// collision comes back as `DuplicateKey`.
    pub async fn insert(&self, draft: &EmployeeDraft) -> Result<(), RepositoryError> {
        let id = required_id(draft)?;
        let sql = format!(
            "INSERT INTO employees ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            EMPLOYEE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.image)
            .bind(&draft.gender)
            .bind(draft.hire_date)
            .bind(&draft.mail_address)
            .bind(&draft.zip_code)
            .bind(&draft.address)
            .bind(&draft.telephone)
            .bind(draft.salary)
            .bind(&draft.characteristics)
            .bind(draft.dependents_count)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepositoryError::DuplicateKey(id)
                } else {
                    RepositoryError::Storage(err)
                }
            })?;
        Ok(())
    }

    /// One past the current maximum id, or 1 when the table is empty. Note
    /// that next_id followed by insert is not atomic; two concurrent inserts
    /// can race and the loser gets `DuplicateKey` from the primary-key
    /// constraint.
    pub async fn next_id(&self) -> Result<i32, RepositoryError> {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(next_id_after(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(id: Option<i32>) -> EmployeeDraft {
        EmployeeDraft {
            id,
            name: "Alice".to_string(),
            image: None,
            gender: "female".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
            mail_address: "alice@example.com".to_string(),
            zip_code: "100-0001".to_string(),
            address: "Tokyo".to_string(),
            telephone: "03-1234-5678".to_string(),
            salary: 300_000,
            characteristics: None,
            dependents_count: 0,
        }
    }

    #[test]
    fn like_pattern_wraps_both_sides() {
        assert_eq!(like_pattern("Ali"), "%Ali%");
    }

    #[test]
    fn empty_fragment_matches_everything() {
        // "%%" is the match-all pattern.
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn caller_wildcards_pass_through_unescaped() {
        assert_eq!(like_pattern("a%b_c"), "%a%b_c%");
    }

    #[test]
    fn next_id_starts_at_one_on_empty_table() {
        assert_eq!(next_id_after(None), 1);
    }

    #[test]
    fn next_id_is_one_past_the_maximum() {
        assert_eq!(next_id_after(Some(2)), 3);
        assert_eq!(next_id_after(Some(41)), 42);
    }

    #[test]
    fn insert_requires_a_preallocated_id() {
        match required_id(&draft(None)) {
            Err(RepositoryError::MissingRequiredField("id")) => {}
            other => panic!("expected MissingRequiredField, got {:?}", other),
        }
        assert_eq!(required_id(&draft(Some(7))).unwrap(), 7);
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn storage_errors_keep_their_source() {
        let err = RepositoryError::from(sqlx::Error::PoolTimedOut);
        match err {
            RepositoryError::Storage(_) => {}
            other => panic!("expected Storage, got {:?}", other),
        }
    }

    #[test]
    fn list_and_search_order_by_hire_date() {
        let list = select_employees("ORDER BY hire_date");
        assert!(list.ends_with("ORDER BY hire_date"));
        let search = select_employees("WHERE name LIKE $1 ORDER BY hire_date");
        assert!(search.ends_with("ORDER BY hire_date"));
    }

    #[test]
    fn projection_names_every_column() {
        let sql = select_employees("ORDER BY hire_date");
        for column in [
            "id",
            "name",
            "image",
            "gender",
            "hire_date",
            "mail_address",
            "zip_code",
            "address",
            "telephone",
            "salary",
            "characteristics",
            "dependents_count",
        ] {
            assert!(sql.contains(column), "projection is missing {}", column);
        }
    }
}
