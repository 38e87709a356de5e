//! Customer directory and deletion cascade

pub mod cascade;
pub mod directory;

pub use cascade::{
    CascadeError, CascadeOutcome, CascadeResult, DeletionEvaluation, CANCEL_ON_DELETE_STATUSES,
    DELETION_BLOCKING_STATUSES,
};
pub use directory::{CustomerDirectory, DirectoryError, DirectoryResult};
