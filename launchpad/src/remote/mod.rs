//! Remote collaborators: the Bitbucket REST client and the generic
//! create-or-update variable synchronizer built on top of it.

pub mod bitbucket;
pub mod sync;

pub use bitbucket::{
    parse_clone_url, BitbucketClient, Environment, RepositoryCoordinates, VariableCollection,
};
pub use sync::{CreateOutcome, VariablePage, VariableSpec, VariableStore, VariableSync};
