mod dto;
mod extractors;
mod handlers;
mod response;
mod routes;
mod state;

pub use dto::{ErrorResponse, HealthData, ImageRequest, TextResponse};
pub use response::{normalize, RecognitionResponse};
pub use routes::create_router;
pub use state::AppState;
