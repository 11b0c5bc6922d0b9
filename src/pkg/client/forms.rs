use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

use super::{MarketplaceBackend, Operation, Outcome};
use crate::pkg::internal::adaptors::marketplace::shaping::{
    ApplyJobInput, EmployerInput, IntegerField, JobSeekerInput, ListField, PostJobInput,
};
use crate::prelude::{RelayError, Result};

/// How long a flash message or error stays visible.
pub const FLASH_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Tab {
    #[default]
    RegisterJobSeeker,
    RegisterEmployer,
    PostJob,
    ApplyJob,
    JobApplications,
    MyApplications,
    UpdateJobSeeker,
    UpdateEmployer,
}

const SEEKER_FIELDS: &[(&str, &str)] = &[
    ("name", "Full Name"),
    ("contactInfo", "Contact Info (Email/Phone)"),
    ("resumeHash", "Resume IPFS Hash"),
    ("skills", "Skills (comma-separated)"),
];

const EMPLOYER_FIELDS: &[(&str, &str)] = &[
    ("companyName", "Company Name"),
    ("industry", "Industry"),
    ("contactInfo", "Contact Info"),
    ("description", "Company Description"),
];

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::RegisterJobSeeker,
        Tab::RegisterEmployer,
        Tab::PostJob,
        Tab::ApplyJob,
        Tab::JobApplications,
        Tab::MyApplications,
        Tab::UpdateJobSeeker,
        Tab::UpdateEmployer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::RegisterJobSeeker => "Register Job Seeker",
            Tab::RegisterEmployer => "Register Employer",
            Tab::PostJob => "Post Job",
            Tab::ApplyJob => "Apply for Job",
            Tab::JobApplications => "Job Applications",
            Tab::MyApplications => "My Applications",
            Tab::UpdateJobSeeker => "Update Job Seeker",
            Tab::UpdateEmployer => "Update Employer",
        }
    }

    /// Input names with their placeholder text.
    pub fn fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Tab::RegisterJobSeeker | Tab::UpdateJobSeeker => SEEKER_FIELDS,
            Tab::RegisterEmployer | Tab::UpdateEmployer => EMPLOYER_FIELDS,
            Tab::PostJob => &[
                ("title", "Job Title"),
                ("description", "Job Description"),
                ("requiredSkills", "Required Skills (comma-separated)"),
                ("location", "Location"),
                ("salary", "Salary"),
            ],
            Tab::ApplyJob => &[("jobId", "Job ID"), ("coverLetterHash", "Cover Letter IPFS Hash")],
            Tab::JobApplications => &[("jobId", "Job ID")],
            Tab::MyApplications => &[],
        }
    }

    pub fn success_text(self) -> &'static str {
        match self {
            Tab::RegisterJobSeeker => "Job seeker registered successfully!",
            Tab::RegisterEmployer => "Employer registered successfully!",
            Tab::PostJob => "Job posted successfully!",
            Tab::ApplyJob => "Application submitted successfully!",
            Tab::JobApplications | Tab::MyApplications => "Applications fetched successfully",
            Tab::UpdateJobSeeker => "Job seeker profile updated successfully!",
            Tab::UpdateEmployer => "Employer profile updated successfully!",
        }
    }

    pub fn failure_text(self) -> &'static str {
        match self {
            Tab::RegisterJobSeeker => "Error registering job seeker",
            Tab::RegisterEmployer => "Error registering employer",
            Tab::PostJob => "Error posting job",
            Tab::ApplyJob => "Error applying for job",
            Tab::JobApplications => "Error fetching applications",
            Tab::MyApplications => "Error fetching my applications",
            Tab::UpdateJobSeeker => "Error updating job seeker profile",
            Tab::UpdateEmployer => "Error updating employer profile",
        }
    }

    /// Registration, posting and applying start from a blank form after
    /// success; lookups and profile edits keep what was typed.
    pub fn resets_on_success(self) -> bool {
        matches!(
            self,
            Tab::RegisterJobSeeker | Tab::RegisterEmployer | Tab::PostJob | Tab::ApplyJob
        )
    }
}

struct Flash {
    text: String,
    shown_at: Instant,
}

impl Flash {
    fn new(text: String) -> Self {
        Self {
            text,
            shown_at: Instant::now(),
        }
    }

    fn visible(&self) -> Option<&str> {
        (self.shown_at.elapsed() < FLASH_TTL).then_some(self.text.as_str())
    }
}

/// Transient state of the tabbed marketplace forms.
#[derive(Default)]
pub struct FormSession {
    active: Tab,
    values: HashMap<Tab, BTreeMap<&'static str, String>>,
    message: Option<Flash>,
    error: Option<Flash>,
    last: Option<Outcome>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn select(&mut self, tab: Tab) {
        self.active = tab;
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        let tab = self.active;
        let Some(&(name, _)) = tab.fields().iter().find(|(name, _)| *name == field) else {
            return Err(RelayError::InvalidInput(format!(
                "{} has no field {:?}",
                tab.label(),
                field
            )));
        };
        self.values.entry(tab).or_default().insert(name, value.into());
        Ok(())
    }

    pub fn value(&self, field: &str) -> &str {
        self.values
            .get(&self.active)
            .and_then(|v| v.get(field))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().and_then(Flash::visible)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().and_then(Flash::visible)
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last.as_ref()
    }

    pub fn flash_message(&mut self, text: impl Into<String>) {
        self.message = Some(Flash::new(text.into()));
    }

    pub fn flash_error(&mut self, text: impl Into<String>) {
        self.error = Some(Flash::new(text.into()));
    }

    fn operation(&self) -> Operation {
        let text = |field: &str| self.value(field).to_string();
        match self.active {
            Tab::RegisterJobSeeker | Tab::UpdateJobSeeker => {
                let input = JobSeekerInput {
                    name: text("name"),
                    contact_info: text("contactInfo"),
                    resume_hash: text("resumeHash"),
                    skills: ListField::Text(text("skills")),
                };
                if self.active == Tab::RegisterJobSeeker {
                    Operation::RegisterJobSeeker(input)
                } else {
                    Operation::UpdateJobSeeker(input)
                }
            }
            Tab::RegisterEmployer | Tab::UpdateEmployer => {
                let input = EmployerInput {
                    company_name: text("companyName"),
                    industry: text("industry"),
                    contact_info: text("contactInfo"),
                    description: text("description"),
                };
                if self.active == Tab::RegisterEmployer {
                    Operation::RegisterEmployer(input)
                } else {
                    Operation::UpdateEmployer(input)
                }
            }
            Tab::PostJob => Operation::PostJob(PostJobInput {
                title: text("title"),
                description: text("description"),
                required_skills: ListField::Text(text("requiredSkills")),
                location: text("location"),
                salary: IntegerField::Text(text("salary")),
            }),
            Tab::ApplyJob => Operation::ApplyJob(ApplyJobInput {
                job_id: IntegerField::Text(text("jobId")),
                cover_letter_hash: text("coverLetterHash"),
            }),
            Tab::JobApplications => Operation::JobApplications {
                job_id: text("jobId"),
            },
            Tab::MyApplications => Operation::MyApplications,
        }
    }

    /// Submit the active tab through `backend`.
    pub async fn submit(&mut self, backend: &dyn MarketplaceBackend) -> Result<Outcome> {
        let tab = self.active;
        match backend.execute(self.operation()).await {
            Ok(outcome) => {
                if tab.resets_on_success() {
                    self.values.remove(&tab);
                }
                self.flash_message(tab.success_text());
                self.last = Some(outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!("{} failed: {}", tab.label(), e);
                self.flash_error(format!("{}: {}", tab.failure_text(), e));
                Err(e)
            }
        }
    }
}
