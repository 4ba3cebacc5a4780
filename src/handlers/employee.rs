use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;
use crate::models::employee::EmployeeDraft;
use crate::repository::EmployeeRepository;

#[derive(Deserialize, Validate)]
pub struct NewEmployee {
    #[validate(length(min = 1))]
    name: String,
    image: Option<String>,
    #[validate(custom = "validate_gender")]
    gender: String,
    hire_date: NaiveDate,
    #[validate(email)]
    mail_address: String,
    #[validate(length(min = 1))]
    zip_code: String,
    #[validate(length(min = 1))]
    address: String,
    #[validate(length(min = 1))]
    telephone: String,
    #[validate(range(min = 0))]
    salary: i32,
    characteristics: Option<String>,
    #[validate(range(min = 0))]
    dependents_count: i32,
}

#[derive(Deserialize)]
pub struct EmployeeQueryParams {
    name: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct DependentsUpdate {
    #[validate(range(min = 0))]
    dependents_count: i32,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: i32,
}

fn validate_gender(gender: &str) -> Result<(), validator::ValidationError> {
    if gender != "male" && gender != "female" {
        return Err(validator::ValidationError::new(
            "Gender must be either 'male' or 'female'",
        ));
    }
    Ok(())
}

fn map_validation_error(err: validator::ValidationErrors) -> AppError {
    AppError::BadRequest(err.to_string())
}

pub async fn list_employees(
    repo: web::Data<EmployeeRepository>,
    query: web::Query<EmployeeQueryParams>,
) -> Result<HttpResponse, AppError> {
    let employees = match &query.name {
        Some(fragment) => repo.find_by_name(fragment).await?,
        None => repo.find_all().await?,
    };
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn show_employee(
    repo: web::Data<EmployeeRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let employee = repo.find_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn create_employee(
    repo: web::Data<EmployeeRepository>,
    new_employee: web::Json<NewEmployee>,
) -> Result<HttpResponse, AppError> {
    new_employee.validate().map_err(map_validation_error)?;

    let new_employee = new_employee.into_inner();
    // Two-step allocation: the draft carries the id the store handed out.
    // A concurrent insert racing for the same id loses with a 409.
    let id = repo.next_id().await?;
    let draft = EmployeeDraft {
        id: Some(id),
        name: new_employee.name,
        image: new_employee.image,
        gender: new_employee.gender,
        hire_date: new_employee.hire_date,
        mail_address: new_employee.mail_address,
        zip_code: new_employee.zip_code,
        address: new_employee.address,
        telephone: new_employee.telephone,
        salary: new_employee.salary,
        characteristics: new_employee.characteristics,
        dependents_count: new_employee.dependents_count,
    };
    repo.insert(&draft).await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

pub async fn update_dependents(
    repo: web::Data<EmployeeRepository>,
    id: web::Path<i32>,
    update: web::Json<DependentsUpdate>,
) -> Result<HttpResponse, AppError> {
    update.validate().map_err(map_validation_error)?;

    // A zero-row match reports success as well; the store does not
    // distinguish it from an applied update.
    repo.update_dependents_count(id.into_inner(), update.dependents_count)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Dependents count updated",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_accepts_only_known_tokens() {
        assert!(validate_gender("male").is_ok());
        assert!(validate_gender("female").is_ok());
        assert!(validate_gender("other").is_err());
        assert!(validate_gender("").is_err());
    }

    #[test]
    fn new_employee_payload_validates() {
        let payload: NewEmployee = serde_json::from_str(
            r#"{
                "name": "Alice",
                "gender": "female",
                "hire_date": "2020-01-10",
                "mail_address": "alice@example.com",
                "zip_code": "100-0001",
                "address": "Tokyo",
                "telephone": "03-1234-5678",
                "salary": 300000,
                "dependents_count": 1
            }"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn negative_salary_is_rejected() {
        let payload: NewEmployee = serde_json::from_str(
            r#"{
                "name": "Alice",
                "gender": "female",
                "hire_date": "2020-01-10",
                "mail_address": "alice@example.com",
                "zip_code": "100-0001",
                "address": "Tokyo",
                "telephone": "03-1234-5678",
                "salary": -1,
                "dependents_count": 0
            }"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn malformed_mail_address_is_rejected() {
        let payload: NewEmployee = serde_json::from_str(
            r#"{
                "name": "Bob",
                "gender": "male",
                "hire_date": "2021-04-01",
                "mail_address": "not-an-address",
                "zip_code": "150-0002",
                "address": "Shibuya",
                "telephone": "03-0000-0000",
                "salary": 250000,
                "dependents_count": 0
            }"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
