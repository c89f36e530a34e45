pub mod router;
pub mod types;
pub mod views;
pub mod handlers {
    pub mod health;
    pub mod visitors;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
