//! Form input collection.
//!
//! Turns submitted form values into an [`EmployeeRecord`] snapshot and renders
//! the sidebar controls for a snapshot.

use crate::types::employee::{Bounded, EmployeeRecord};
use crate::types::schema::{Control, FieldSpec, FIELDS};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::HashMap;
use std::fmt::Write;
use std::str::FromStr;
use thiserror::Error;

/// A submitted value the control would not have produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FormError {
    pub field: &'static str,
    pub message: String,
}

/// Raw submitted value, falling back to the control default when absent
fn raw(form: &HashMap<String, String>, name: &'static str) -> String {
    match form.get(name) {
        Some(value) => value.trim().to_string(),
        None => crate::types::schema::field(name)
            .map(|f| f.control.default_value())
            .unwrap_or_default(),
    }
}

fn int<const MIN: i64, const MAX: i64>(
    form: &HashMap<String, String>,
    name: &'static str,
) -> Result<Bounded<MIN, MAX>, FormError> {
    let value = raw(form, name);
    let parsed: i64 = value.parse().map_err(|_| FormError {
        field: name,
        message: format!("'{}' is not a whole number", value),
    })?;
    Bounded::new(parsed).map_err(|e| FormError {
        field: name,
        message: e.to_string(),
    })
}

fn choice<T>(form: &HashMap<String, String>, name: &'static str) -> Result<T, FormError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw(form, name).parse().map_err(|e: T::Err| FormError {
        field: name,
        message: e.to_string(),
    })
}

/// Assemble a record from submitted form values.
///
/// Every field is populated: missing values take the control default.
pub fn collect(form: &HashMap<String, String>) -> Result<EmployeeRecord, FormError> {
    Ok(EmployeeRecord {
        age: int(form, "Age")?,
        gender: choice(form, "Gender")?,
        education_background: choice(form, "EducationBackground")?,
        marital_status: choice(form, "MaritalStatus")?,
        emp_department: choice(form, "EmpDepartment")?,
        emp_job_role: choice(form, "EmpJobRole")?,
        business_travel_frequency: choice(form, "BusinessTravelFrequency")?,
        distance_from_home: int(form, "DistanceFromHome")?,
        emp_education_level: int(form, "EmpEducationLevel")?,
        emp_environment_satisfaction: int(form, "EmpEnvironmentSatisfaction")?,
        emp_hourly_rate: int(form, "EmpHourlyRate")?,
        emp_job_involvement: int(form, "EmpJobInvolvement")?,
        emp_job_level: int(form, "EmpJobLevel")?,
        emp_job_satisfaction: int(form, "EmpJobSatisfaction")?,
        num_companies_worked: int(form, "NumCompaniesWorked")?,
        over_time: choice(form, "OverTime")?,
        emp_last_salary_hike_percent: int(form, "EmpLastSalaryHikePercent")?,
        emp_relationship_satisfaction: int(form, "EmpRelationshipSatisfaction")?,
        total_work_experience_in_years: int(form, "TotalWorkExperienceInYears")?,
        training_times_last_year: int(form, "TrainingTimesLastYear")?,
        emp_work_life_balance: int(form, "EmpWorkLifeBalance")?,
        experience_years_at_this_company: int(form, "ExperienceYearsAtThisCompany")?,
        experience_years_in_current_role: int(form, "ExperienceYearsInCurrentRole")?,
        years_since_last_promotion: int(form, "YearsSinceLastPromotion")?,
        years_with_curr_manager: int(form, "YearsWithCurrManager")?,
        attrition: choice(form, "Attrition")?,
    })
}

/// Current value of each control, in column order
pub type FormValues = Vec<(&'static str, String)>;

/// Control values for a validated record
pub fn record_values(record: &EmployeeRecord) -> FormValues {
    record
        .columns()
        .iter()
        .map(|(name, value)| (*name, value.to_string()))
        .collect()
}

/// Control values exactly as submitted, so a rejected form keeps its input
pub fn submitted_values(form: &HashMap<String, String>) -> FormValues {
    FIELDS.iter().map(|f| (f.name, raw(form, f.name))).collect()
}

fn render_control(html: &mut String, spec: &FieldSpec, current: &str) {
    let name = encode_double_quoted_attribute(spec.name);
    let value = encode_double_quoted_attribute(current);
    let _ = write!(
        html,
        "<label for=\"{name}\">{}</label>",
        encode_text(spec.label)
    );

    match spec.control {
        Control::Number { min, max, step } => {
            let _ = write!(
                html,
                "<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{value}\" required>"
            );
        }
        Control::Slider { min, max, step } => {
            let _ = write!(
                html,
                "<input type=\"range\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{value}\" oninput=\"this.nextElementSibling.value=this.value\"><output>{}</output>",
                encode_text(current)
            );
        }
        Control::Select { options } => {
            let _ = write!(html, "<select id=\"{name}\" name=\"{name}\">");
            for option in options {
                let selected = if *option == current { " selected" } else { "" };
                let _ = write!(
                    html,
                    "<option value=\"{}\"{}>{}</option>",
                    encode_double_quoted_attribute(option),
                    selected,
                    encode_text(option)
                );
            }
            html.push_str("</select>");
        }
    }
}

/// Render the sidebar form for the given control values.
///
/// The predict button is disabled when `predict_enabled` is false.
pub fn render_sidebar(values: &[(&'static str, String)], predict_enabled: bool) -> String {
    let mut html = String::from("<form class=\"sidebar\" method=\"post\" action=\"/predict\">");
    html.push_str("<h2>Employee Attributes</h2>");

    for spec in FIELDS.iter() {
        let current = values
            .iter()
            .find(|(name, _)| *name == spec.name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();
        html.push_str("<div class=\"field\">");
        render_control(&mut html, spec, current);
        html.push_str("</div>");
    }

    let disabled = if predict_enabled { "" } else { " disabled" };
    let _ = write!(html, "<button type=\"submit\"{}>Predict</button>", disabled);
    html.push_str("</form>");
    html
}
