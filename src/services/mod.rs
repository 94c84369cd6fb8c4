mod attachment_service;
mod auth_service;
mod post_service;
mod session;

pub use attachment_service::*;
pub use auth_service::*;
pub use post_service::*;
pub use session::*;
