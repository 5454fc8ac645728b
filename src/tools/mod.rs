//! MCP tool implementations.
//!
//! - `descriptors`: tool names, input types and advertised schemas
//! - `router`: dispatch of a call to its operation
//! - `session`: the selected-database value
//! - `identifier`: raw table/database names
//! - `response`: the uniform success/error result

pub mod descriptors;
pub mod identifier;
pub mod response;
pub mod router;
pub mod session;

pub use descriptors::{ToolName, descriptors};
pub use identifier::RawIdentifier;
pub use response::ToolResponse;
pub use router::ToolRouter;
pub use session::SessionState;
