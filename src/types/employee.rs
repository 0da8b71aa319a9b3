//! Employee record data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A value fell outside the bounds of its control
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value {value} is outside the range {min}..={max}")]
pub struct OutOfRange {
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

/// Integer constrained to `MIN..=MAX`.
///
/// Values outside the range cannot be constructed, including through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Bounded<const MIN: i64, const MAX: i64>(i64);

impl<const MIN: i64, const MAX: i64> Bounded<MIN, MAX> {
    /// Create a bounded value, rejecting anything outside `MIN..=MAX`
    pub fn new(value: i64) -> Result<Self, OutOfRange> {
        if (MIN..=MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(OutOfRange {
                value,
                min: MIN,
                max: MAX,
            })
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl<const MIN: i64, const MAX: i64> Default for Bounded<MIN, MAX> {
    fn default() -> Self {
        Self(MIN)
    }
}

impl<const MIN: i64, const MAX: i64> TryFrom<i64> for Bounded<MIN, MAX> {
    type Error = OutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MIN: i64, const MAX: i64> From<Bounded<MIN, MAX>> for i64 {
    fn from(value: Bounded<MIN, MAX>) -> Self {
        value.0
    }
}

impl<const MIN: i64, const MAX: i64> fmt::Display for Bounded<MIN, MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-5 rating slider
pub type Rating = Bounded<1, 5>;
pub type Age = Bounded<18, 65>;
pub type Percent = Bounded<0, 100>;
pub type HourlyRate = Bounded<10, 100>;
pub type SmallCount = Bounded<0, 10>;
pub type Years = Bounded<0, 50>;

/// A choice that does not belong to a select box's option list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not one of: {}", .options.join(", "))]
pub struct UnknownOption {
    pub value: String,
    pub options: &'static [&'static str],
}

/// Declares a select-box enum whose variants map to fixed display strings.
///
/// The first variant is the default, matching the first option of the control.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $first:ident => $first_label:literal $(, $variant:ident => $label:literal)* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_label)]
            $first,
            $(
                #[serde(rename = $label)]
                $variant,
            )*
        }

        impl $name {
            /// Option labels in display order
            pub const OPTIONS: &'static [&'static str] = &[$first_label $(, $label)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    Self::$first => $first_label,
                    $(Self::$variant => $label,)*
                }
            }

            /// Zero-based position in [`Self::OPTIONS`]; variants are declared in option order
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_label => Ok(Self::$first),
                    $($label => Ok(Self::$variant),)*
                    other => Err(UnknownOption {
                        value: other.to_string(),
                        options: Self::OPTIONS,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum!(Gender { Male => "Male", Female => "Female" });

choice_enum!(EducationBackground {
    Science => "Science",
    Commerce => "Commerce",
    Arts => "Arts",
    Others => "Others",
});

choice_enum!(MaritalStatus {
    Single => "Single",
    Married => "Married",
    Divorced => "Divorced",
    Widowed => "Widowed",
});

choice_enum!(Department {
    Hr => "HR",
    Finance => "Finance",
    ResearchAndDevelopment => "R&D",
    Sales => "Sales",
    It => "IT",
});

choice_enum!(JobRole {
    Manager => "Manager",
    Executive => "Executive",
    Analyst => "Analyst",
    Technician => "Technician",
    Clerk => "Clerk",
});

choice_enum!(TravelFrequency {
    Rarely => "Rarely",
    Frequently => "Frequently",
    Never => "Never",
});

choice_enum!(
    /// Used for both `OverTime` and `Attrition`
    YesNo { Yes => "Yes", No => "No" }
);

/// A single scalar cell of the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    /// Chosen option and its position in the option list
    Choice { label: &'static str, index: usize },
}

impl FieldValue {
    fn choice(label: &'static str, index: usize) -> Self {
        FieldValue::Choice { label, index }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Choice { label, .. } => f.write_str(label),
        }
    }
}

/// One employee, as collected from the form.
///
/// Field order matches the column order the model was trained on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeRecord {
    pub age: Age,
    pub gender: Gender,
    pub education_background: EducationBackground,
    pub marital_status: MaritalStatus,
    pub emp_department: Department,
    pub emp_job_role: JobRole,
    pub business_travel_frequency: TravelFrequency,
    pub distance_from_home: Percent,
    pub emp_education_level: Rating,
    pub emp_environment_satisfaction: Rating,
    pub emp_hourly_rate: HourlyRate,
    pub emp_job_involvement: Rating,
    pub emp_job_level: Rating,
    pub emp_job_satisfaction: Rating,
    pub num_companies_worked: SmallCount,
    pub over_time: YesNo,
    pub emp_last_salary_hike_percent: Percent,
    pub emp_relationship_satisfaction: Rating,
    pub total_work_experience_in_years: Years,
    pub training_times_last_year: SmallCount,
    pub emp_work_life_balance: Rating,
    pub experience_years_at_this_company: Years,
    pub experience_years_in_current_role: Years,
    pub years_since_last_promotion: Years,
    pub years_with_curr_manager: Years,
    pub attrition: YesNo,
}

impl EmployeeRecord {
    /// Number of columns in a record
    pub const FIELD_COUNT: usize = 26;

    /// Column names paired with values, in schema order
    pub fn columns(&self) -> [(&'static str, FieldValue); Self::FIELD_COUNT] {
        let int = |v: i64| FieldValue::Int(v);
        [
            ("Age", int(self.age.get())),
            ("Gender", FieldValue::choice(self.gender.as_str(), self.gender.index())),
            (
                "EducationBackground",
                FieldValue::choice(
                    self.education_background.as_str(),
                    self.education_background.index(),
                ),
            ),
            (
                "MaritalStatus",
                FieldValue::choice(self.marital_status.as_str(), self.marital_status.index()),
            ),
            (
                "EmpDepartment",
                FieldValue::choice(self.emp_department.as_str(), self.emp_department.index()),
            ),
            (
                "EmpJobRole",
                FieldValue::choice(self.emp_job_role.as_str(), self.emp_job_role.index()),
            ),
            (
                "BusinessTravelFrequency",
                FieldValue::choice(
                    self.business_travel_frequency.as_str(),
                    self.business_travel_frequency.index(),
                ),
            ),
            ("DistanceFromHome", int(self.distance_from_home.get())),
            ("EmpEducationLevel", int(self.emp_education_level.get())),
            (
                "EmpEnvironmentSatisfaction",
                int(self.emp_environment_satisfaction.get()),
            ),
            ("EmpHourlyRate", int(self.emp_hourly_rate.get())),
            ("EmpJobInvolvement", int(self.emp_job_involvement.get())),
            ("EmpJobLevel", int(self.emp_job_level.get())),
            ("EmpJobSatisfaction", int(self.emp_job_satisfaction.get())),
            ("NumCompaniesWorked", int(self.num_companies_worked.get())),
            (
                "OverTime",
                FieldValue::choice(self.over_time.as_str(), self.over_time.index()),
            ),
            (
                "EmpLastSalaryHikePercent",
                int(self.emp_last_salary_hike_percent.get()),
            ),
            (
                "EmpRelationshipSatisfaction",
                int(self.emp_relationship_satisfaction.get()),
            ),
            (
                "TotalWorkExperienceInYears",
                int(self.total_work_experience_in_years.get()),
            ),
            ("TrainingTimesLastYear", int(self.training_times_last_year.get())),
            ("EmpWorkLifeBalance", int(self.emp_work_life_balance.get())),
            (
                "ExperienceYearsAtThisCompany",
                int(self.experience_years_at_this_company.get()),
            ),
            (
                "ExperienceYearsInCurrentRole",
                int(self.experience_years_in_current_role.get()),
            ),
            ("YearsSinceLastPromotion", int(self.years_since_last_promotion.get())),
            ("YearsWithCurrManager", int(self.years_with_curr_manager.get())),
            (
                "Attrition",
                FieldValue::choice(self.attrition.as_str(), self.attrition.index()),
            ),
        ]
    }
}
