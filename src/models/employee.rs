use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// One personnel record as stored in the `employees` table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub gender: String,
    pub hire_date: NaiveDate,
    pub mail_address: String,
    pub zip_code: String,
    pub address: String,
    pub telephone: String,
    pub salary: i32,
    pub characteristics: Option<String>,
    pub dependents_count: i32,
}

// Every expected column must be present in the row; a missing column is a
// mapping failure (ColumnNotFound), never a silent default.
impl FromRow<'_, PgRow> for Employee {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Employee {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            gender: row.try_get("gender")?,
            hire_date: row.try_get("hire_date")?,
            mail_address: row.try_get("mail_address")?,
            zip_code: row.try_get("zip_code")?,
            address: row.try_get("address")?,
            telephone: row.try_get("telephone")?,
            salary: row.try_get("salary")?,
            characteristics: row.try_get("characteristics")?,
            dependents_count: row.try_get("dependents_count")?,
        })
    }
}

/// Insert payload for the repository. `id` is set by the caller from
/// `EmployeeRepository::next_id` before the insert; a draft without one is
/// rejected as a missing required field.
#[derive(Deserialize, Debug, Clone)]
pub struct EmployeeDraft {
    pub id: Option<i32>,
    pub name: String,
    pub image: Option<String>,
    pub gender: String,
    pub hire_date: NaiveDate,
    pub mail_address: String,
    pub zip_code: String,
    pub address: String,
    pub telephone: String,
    pub salary: i32,
    pub characteristics: Option<String>,
    pub dependents_count: i32,
}
