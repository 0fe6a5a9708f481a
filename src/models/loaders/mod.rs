pub mod candidate_loader;
pub mod credential_loader;

pub use candidate_loader::{find_latest_extract, load_candidates};
pub use credential_loader::{CredentialDirectory, CsvCredentialDirectory};
