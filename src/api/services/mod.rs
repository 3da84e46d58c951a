pub mod compact;
pub mod redirect;
pub mod response;

pub use compact::{CompactService, compact_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use response::{ErrorBody, error_response};
