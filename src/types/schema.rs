//! Form control table for the employee record.
//!
//! One entry per column, in the order the model expects. The form renders
//! controls from this table and [`EmployeeRecord::columns`] yields values in
//! the same order.
//!
//! [`EmployeeRecord::columns`]: super::employee::EmployeeRecord::columns

use super::employee::{
    Department, EducationBackground, Gender, JobRole, MaritalStatus, TravelFrequency, YesNo,
};
use serde::Serialize;

/// Kind of input control and its constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Control {
    /// Numeric spinner
    Number { min: i64, max: i64, step: i64 },
    /// Bounded slider
    Slider { min: i64, max: i64, step: i64 },
    /// Single choice from a fixed option list
    Select { options: &'static [&'static str] },
}

impl Control {
    /// Value the control shows before the user touches it
    pub fn default_value(&self) -> String {
        match self {
            Control::Number { min, .. } | Control::Slider { min, .. } => min.to_string(),
            Control::Select { options } => options.first().copied().unwrap_or_default().to_string(),
        }
    }
}

/// A labeled field of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Column name, as the model sees it
    pub name: &'static str,
    /// Human readable label
    pub label: &'static str,
    #[serde(flatten)]
    pub control: Control,
}

const fn number(name: &'static str, label: &'static str, min: i64, max: i64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        control: Control::Number { min, max, step: 1 },
    }
}

const fn rating(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        control: Control::Slider {
            min: 1,
            max: 5,
            step: 1,
        },
    }
}

const fn select(
    name: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        control: Control::Select { options },
    }
}

pub const FIELDS: [FieldSpec; 26] = [
    number("Age", "Age", 18, 65),
    select("Gender", "Gender", Gender::OPTIONS),
    select(
        "EducationBackground",
        "Education Background",
        EducationBackground::OPTIONS,
    ),
    select("MaritalStatus", "Marital Status", MaritalStatus::OPTIONS),
    select("EmpDepartment", "Department", Department::OPTIONS),
    select("EmpJobRole", "Job Role", JobRole::OPTIONS),
    select(
        "BusinessTravelFrequency",
        "Business Travel Frequency",
        TravelFrequency::OPTIONS,
    ),
    number("DistanceFromHome", "Distance From Home (km)", 0, 100),
    rating("EmpEducationLevel", "Education Level (1-5)"),
    rating("EmpEnvironmentSatisfaction", "Environment Satisfaction (1-5)"),
    number("EmpHourlyRate", "Hourly Rate", 10, 100),
    rating("EmpJobInvolvement", "Job Involvement (1-5)"),
    rating("EmpJobLevel", "Job Level (1-5)"),
    rating("EmpJobSatisfaction", "Job Satisfaction (1-5)"),
    number("NumCompaniesWorked", "Number of Companies Worked", 0, 10),
    select("OverTime", "Overtime", YesNo::OPTIONS),
    number("EmpLastSalaryHikePercent", "Last Salary Hike Percent", 0, 100),
    rating(
        "EmpRelationshipSatisfaction",
        "Relationship Satisfaction (1-5)",
    ),
    number(
        "TotalWorkExperienceInYears",
        "Total Work Experience (Years)",
        0,
        50,
    ),
    number("TrainingTimesLastYear", "Training Times Last Year", 0, 10),
    rating("EmpWorkLifeBalance", "Work-Life Balance (1-5)"),
    number(
        "ExperienceYearsAtThisCompany",
        "Experience Years At Company",
        0,
        50,
    ),
    number(
        "ExperienceYearsInCurrentRole",
        "Experience Years In Current Role",
        0,
        50,
    ),
    number("YearsSinceLastPromotion", "Years Since Last Promotion", 0, 50),
    number("YearsWithCurrManager", "Years With Current Manager", 0, 50),
    select("Attrition", "Attrition", YesNo::OPTIONS),
];

/// Look up a field by column name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::employee::EmployeeRecord;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_unique() {
        let names: HashSet<_> = FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), EmployeeRecord::FIELD_COUNT);
    }

    #[test]
    fn test_defaults_match_record_default() {
        let record = EmployeeRecord::default();
        for ((name, value), spec) in record.columns().iter().zip(FIELDS.iter()) {
            assert_eq!(*name, spec.name);
            assert_eq!(value.to_string(), spec.control.default_value(), "{}", name);
        }
    }

    #[test]
    fn test_lookup() {
        let age = field("Age").unwrap();
        assert_eq!(
            age.control,
            Control::Number {
                min: 18,
                max: 65,
                step: 1
            }
        );
        assert!(field("Salary").is_none());
    }

    #[test]
    fn test_schema_json() {
        let json = serde_json::to_value(FIELDS[4]).unwrap();
        assert_eq!(json["name"], "EmpDepartment");
        assert_eq!(json["kind"], "select");
        assert_eq!(json["options"][2], "R&D");
    }
}
