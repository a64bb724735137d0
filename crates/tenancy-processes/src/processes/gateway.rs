//! Read contracts for the collaborator systems consulted by business rules.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenure record as exposed by the tenure system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureInformation {
    pub id: Uuid,
    pub tenure_type: TenureType,
    #[serde(default)]
    pub start_of_tenure_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_of_tenure_date: Option<NaiveDate>,
    #[serde(default)]
    pub household_members: Vec<HouseholdMember>,
}

impl TenureInformation {
    /// A tenure stays active until the day its end date is reached.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.end_of_tenure_date.map_or(true, |end| end > today)
    }

    pub fn responsible_members(&self) -> impl Iterator<Item = &HouseholdMember> {
        self.household_members
            .iter()
            .filter(|member| member.is_responsible)
    }

    pub fn member(&self, person_id: &Uuid) -> Option<&HouseholdMember> {
        self.household_members
            .iter()
            .find(|member| &member.id == person_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureType {
    pub code: String,
    pub description: String,
}

impl TenureType {
    pub const SECURE_CODE: &'static str = "SEC";

    pub fn secure() -> Self {
        Self {
            code: Self::SECURE_CODE.to_string(),
            description: "Secure".to_string(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.code.eq_ignore_ascii_case(Self::SECURE_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMember {
    pub id: Uuid,
    pub full_name: String,
    pub is_responsible: bool,
}

/// Person record as exposed by the person system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: Uuid,
    pub first_name: String,
    pub surname: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub tenures: Vec<PersonTenure>,
}

impl PersonRecord {
    /// Age in whole years on `today`, if a date of birth is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let born = self.date_of_birth?;
        let mut years = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonTenure {
    pub id: Uuid,
    pub tenure_type_code: String,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_responsible: bool,
}

impl PersonTenure {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| end > today)
    }
}

/// Lookup of tenures by id.
pub trait TenureGateway: Send + Sync {
    fn tenure_by_id(&self, id: &Uuid) -> Result<Option<TenureInformation>, GatewayError>;
}

/// Lookup of people by id.
pub trait PersonGateway: Send + Sync {
    fn person_by_id(&self, id: &Uuid) -> Result<Option<PersonRecord>, GatewayError>;
}

/// Infrastructure failure while talking to a collaborator system.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{system} system unavailable: {detail}")]
    Unavailable {
        system: &'static str,
        detail: String,
    },
}
