pub mod applicant;
pub mod job_posting;
pub mod period;
