use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pkg::internal::contract::Receipt;
use crate::prelude::{RelayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub company_name: String,
    pub industry: String,
    pub contact_info: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerProfile {
    pub name: String,
    pub contact_info: String,
    pub resume_hash: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub salary: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub job_id: u64,
    pub cover_letter_hash: String,
}

/// Mirrors the contract's `ApplicationStatus` enum ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

impl TryFrom<u8> for ApplicationStatus {
    type Error = RelayError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(ApplicationStatus::Pending),
            1 => Ok(ApplicationStatus::Reviewed),
            2 => Ok(ApplicationStatus::Approved),
            3 => Ok(ApplicationStatus::Rejected),
            other => Err(RelayError::Internal(format!(
                "unknown application status {}",
                other
            ))),
        }
    }
}

impl From<ApplicationStatus> for u8 {
    fn from(status: ApplicationStatus) -> u8 {
        status as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub job_seeker: Address,
    pub status: ApplicationStatus,
    pub application_time: u64,
}

impl ApplicationRecord {
    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.application_time).ok()?, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReceipt {
    pub message: String,
    pub receipt: Receipt,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::{ApplicationRecord, ApplicationStatus};

    #[test]
    fn status_follows_contract_ordering() {
        assert_eq!(ApplicationStatus::try_from(1).unwrap(), ApplicationStatus::Reviewed);
        assert_eq!(u8::from(ApplicationStatus::Rejected), 3);
        assert!(ApplicationStatus::try_from(4).is_err());
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = ApplicationRecord {
            job_seeker: Address::ZERO,
            status: ApplicationStatus::Pending,
            application_time: 1_700_000_000,
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["status"], "Pending");
        assert_eq!(v["applicationTime"], 1_700_000_000u64);
        assert!(v.get("jobSeeker").is_some());
        assert_eq!(record.applied_at().unwrap().timestamp(), 1_700_000_000);
    }
}
