pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use domain::model::{Visitor, VISITORS};
pub use storage::{
    Fault, GatewayError, MemoryVisitorGateway, PgVisitorGateway, VisitorGateway, VisitorSession,
};
