//! Natural-language and ad-hoc SQL over the CRM database.
//!
//! `SqlAssistant` turns questions into SQL; `QueryExecutor` runs SQL that
//! passed the read-only guard. Both produce the JSON bodies printed by the
//! `ask` and `sql` commands.

pub mod assistant;
pub mod executor;
pub mod response;

pub use assistant::{AskResponse, GenerateResponse, SqlAssistant};
pub use executor::{ExecuteMetadata, ExecuteResponse, QueryExecutor};
pub use response::ErrorBody;
