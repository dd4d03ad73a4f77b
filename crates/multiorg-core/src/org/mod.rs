//! Org connections, sessions and query results.

pub mod model;
pub mod session;

pub use model::{
    AccountRow, ConnectionName, ConnectionOutcome, ConnectionSet, OrgIdentity, QueryResponse,
    Record,
};
pub use session::{OrgAuthorizer, OrgSession};
