pub mod rate_limit;
pub mod short_link;
pub mod tenant;
pub mod visit;

pub use rate_limit::Entity as RateLimitEntity;
pub use short_link::Entity as ShortLinkEntity;
pub use tenant::Entity as TenantEntity;
pub use visit::Entity as VisitEntity;
