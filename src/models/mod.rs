pub mod loaders;
pub mod outcome;
pub mod shipment;

pub use loaders::{find_latest_extract, load_candidates, CredentialDirectory, CsvCredentialDirectory};
pub use outcome::{DisputeStatus, SessionResult, WorkflowStatus};
pub use shipment::{Candidate, Credential, MappedWorkItem};
