//! Wire shapes accepted at the edge and their conversion into contract
//! arguments. List fields arrive as comma-separated text (or lists), integer
//! fields as numbers (or numeric text).

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::spec::{EmployerProfile, JobApplication, JobPosting, JobSeekerProfile};
use crate::prelude::{RelayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    Text(String),
}

impl Default for ListField {
    fn default() -> Self {
        ListField::Text(String::new())
    }
}

impl From<&str> for ListField {
    fn from(text: &str) -> Self {
        ListField::Text(text.to_string())
    }
}

impl ListField {
    pub fn shape(&self, field: &str) -> Result<Vec<String>> {
        let items = match self {
            ListField::Text(text) => split_list(text),
            ListField::Items(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        };
        if items.is_empty() {
            return Err(RelayError::InvalidInput(format!(
                "{}: Field cannot be empty",
                field
            )));
        }
        Ok(items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegerField {
    Number(u64),
    Text(String),
}

impl From<u64> for IntegerField {
    fn from(n: u64) -> Self {
        IntegerField::Number(n)
    }
}

impl From<&str> for IntegerField {
    fn from(text: &str) -> Self {
        IntegerField::Text(text.to_string())
    }
}

impl IntegerField {
    pub fn shape(&self, field: &str) -> Result<u64> {
        match self {
            IntegerField::Number(n) => Ok(*n),
            IntegerField::Text(text) => parse_integer(field, text),
        }
    }
}

pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Required strings must carry something other than whitespace.
fn not_blank(value: &str) -> core::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Field cannot be empty".into()));
    }
    Ok(())
}

pub fn parse_integer(field: &str, text: &str) -> Result<u64> {
    text.trim().parse::<u64>().map_err(|_| {
        RelayError::InvalidInput(format!(
            "{}: expected a non-negative integer, got {:?}",
            field, text
        ))
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployerInput {
    #[validate(custom(function = "not_blank"))]
    pub company_name: String,
    #[validate(custom(function = "not_blank"))]
    pub industry: String,
    #[validate(custom(function = "not_blank"))]
    pub contact_info: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
}

impl EmployerInput {
    pub fn shape(self) -> Result<EmployerProfile> {
        self.validate()?;
        Ok(EmployerProfile {
            company_name: self.company_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            contact_info: self.contact_info.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerInput {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub contact_info: String,
    #[validate(custom(function = "not_blank"))]
    pub resume_hash: String,
    pub skills: ListField,
}

impl JobSeekerInput {
    pub fn shape(self) -> Result<JobSeekerProfile> {
        self.validate()?;
        Ok(JobSeekerProfile {
            skills: self.skills.shape("skills")?,
            name: self.name.trim().to_string(),
            contact_info: self.contact_info.trim().to_string(),
            resume_hash: self.resume_hash.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostJobInput {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    pub required_skills: ListField,
    #[validate(custom(function = "not_blank"))]
    pub location: String,
    pub salary: IntegerField,
}

impl PostJobInput {
    pub fn shape(self) -> Result<JobPosting> {
        self.validate()?;
        Ok(JobPosting {
            required_skills: self.required_skills.shape("requiredSkills")?,
            salary: self.salary.shape("salary")?,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyJobInput {
    pub job_id: IntegerField,
    #[validate(custom(function = "not_blank"))]
    pub cover_letter_hash: String,
}

impl ApplyJobInput {
    pub fn shape(self) -> Result<JobApplication> {
        self.validate()?;
        Ok(JobApplication {
            job_id: self.job_id.shape("jobId")?,
            cover_letter_hash: self.cover_letter_hash.trim().to_string(),
        })
    }
}
