use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{SolCall, sol};

use super::{Query, QueryOutput, Transaction};
use crate::pkg::internal::adaptors::marketplace::spec::{ApplicationRecord, ApplicationStatus};
use crate::prelude::{RelayError, Result};

sol! {
    struct ApplicationView {
        address jobSeeker;
        uint8 status;
        uint256 applicationTime;
    }

    interface JobMarketplace {
        function registerEmployer(string companyName, string industry, string contactInfo, string description) external;
        function registerJobSeeker(string name, string contactInfo, string resumeHash, string[] skills) external;
        function postJob(string title, string description, string[] requiredSkills, string location, uint256 salary) external;
        function applyForJob(uint256 jobId, string coverLetterHash) external;
        function getJobApplications(uint256 jobId) external view returns (ApplicationView[] memory);
        function getMyApplications() external view returns (uint256[] memory);
        function updateJobSeekerProfile(string name, string contactInfo, string resumeHash, string[] skills) external;
        function updateEmployerProfile(string companyName, string industry, string contactInfo, string description) external;
    }
}

pub fn encode_transaction(tx: &Transaction) -> Bytes {
    use JobMarketplace::*;

    let data = match tx {
        Transaction::RegisterEmployer(p) => registerEmployerCall {
            companyName: p.company_name.clone(),
            industry: p.industry.clone(),
            contactInfo: p.contact_info.clone(),
            description: p.description.clone(),
        }
        .abi_encode(),
        Transaction::RegisterJobSeeker(p) => registerJobSeekerCall {
            name: p.name.clone(),
            contactInfo: p.contact_info.clone(),
            resumeHash: p.resume_hash.clone(),
            skills: p.skills.clone(),
        }
        .abi_encode(),
        Transaction::PostJob(j) => postJobCall {
            title: j.title.clone(),
            description: j.description.clone(),
            requiredSkills: j.required_skills.clone(),
            location: j.location.clone(),
            salary: U256::from(j.salary),
        }
        .abi_encode(),
        Transaction::ApplyForJob(a) => applyForJobCall {
            jobId: U256::from(a.job_id),
            coverLetterHash: a.cover_letter_hash.clone(),
        }
        .abi_encode(),
        Transaction::UpdateJobSeekerProfile(p) => updateJobSeekerProfileCall {
            name: p.name.clone(),
            contactInfo: p.contact_info.clone(),
            resumeHash: p.resume_hash.clone(),
            skills: p.skills.clone(),
        }
        .abi_encode(),
        Transaction::UpdateEmployerProfile(p) => updateEmployerProfileCall {
            companyName: p.company_name.clone(),
            industry: p.industry.clone(),
            contactInfo: p.contact_info.clone(),
            description: p.description.clone(),
        }
        .abi_encode(),
    };
    Bytes::from(data)
}

pub fn encode_query(query: &Query) -> Bytes {
    let data = match query {
        Query::JobApplications { job_id } => JobMarketplace::getJobApplicationsCall {
            jobId: U256::from(*job_id),
        }
        .abi_encode(),
        Query::MyApplications => JobMarketplace::getMyApplicationsCall {}.abi_encode(),
    };
    Bytes::from(data)
}

pub fn decode_query(query: &Query, data: &[u8]) -> Result<QueryOutput> {
    match query {
        Query::JobApplications { .. } => {
            let views = JobMarketplace::getJobApplicationsCall::abi_decode_returns(data)?;
            let records = views
                .into_iter()
                .map(ApplicationRecord::try_from)
                .collect::<Result<Vec<_>>>()?;
            Ok(QueryOutput::Applications(records))
        }
        Query::MyApplications => {
            let ids = JobMarketplace::getMyApplicationsCall::abi_decode_returns(data)?;
            let ids = ids
                .into_iter()
                .map(to_u64)
                .collect::<Result<Vec<_>>>()?;
            Ok(QueryOutput::JobIds(ids))
        }
    }
}

fn to_u64(value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| RelayError::Internal(format!("value {} does not fit in u64", value)))
}

impl TryFrom<ApplicationView> for ApplicationRecord {
    type Error = RelayError;

    fn try_from(view: ApplicationView) -> Result<Self> {
        Ok(ApplicationRecord {
            job_seeker: view.jobSeeker,
            status: ApplicationStatus::try_from(view.status)?,
            application_time: to_u64(view.applicationTime)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256, keccak256};
    use alloy_sol_types::SolValue;

    use super::*;
    use crate::pkg::internal::adaptors::marketplace::spec::JobPosting;

    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn post_job_uses_the_declared_signature() {
        let data = encode_transaction(&Transaction::PostJob(JobPosting {
            title: "Engineer".into(),
            description: "...".into(),
            required_skills: vec!["go".into(), "rust".into()],
            location: "Remote".into(),
            salary: 90000,
        }));
        assert_eq!(
            data[..4],
            selector("postJob(string,string,string[],string,uint256)")
        );

        let decoded = JobMarketplace::postJobCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.requiredSkills, vec!["go", "rust"]);
        assert_eq!(decoded.salary, U256::from(90000));
    }

    #[test]
    fn queries_use_the_declared_signatures() {
        assert_eq!(
            encode_query(&Query::JobApplications { job_id: 7 })[..4],
            selector("getJobApplications(uint256)")
        );
        assert_eq!(
            encode_query(&Query::MyApplications)[..],
            selector("getMyApplications()")
        );
    }

    #[test]
    fn decodes_application_views() {
        let seeker = Address::repeat_byte(0x11);
        let views = vec![ApplicationView {
            jobSeeker: seeker,
            status: 1,
            applicationTime: U256::from(1_700_000_000u64),
        }];
        let data = (views,).abi_encode_params();
        let out = decode_query(&Query::JobApplications { job_id: 1 }, &data).unwrap();
        assert_eq!(
            out,
            QueryOutput::Applications(vec![ApplicationRecord {
                job_seeker: seeker,
                status: ApplicationStatus::Reviewed,
                application_time: 1_700_000_000,
            }])
        );
    }

    #[test]
    fn decodes_job_ids() {
        let data = (vec![U256::from(1), U256::from(3)],).abi_encode_params();
        let out = decode_query(&Query::MyApplications, &data).unwrap();
        assert_eq!(out, QueryOutput::JobIds(vec![1, 3]));
    }

    #[test]
    fn garbage_output_is_internal() {
        let err = decode_query(&Query::MyApplications, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, RelayError::Internal(_)));
    }
}
