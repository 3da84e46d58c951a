//! Service layer for business logic
//!
//! The HTTP handlers and the CLI both go through these services; storage
//! is reached only through the traits in `crate::storage`.

pub mod code_generator;
pub mod creation;
pub mod geoip;
pub mod quota;
pub mod rate_limiter;
pub mod resolution;
pub mod user_agent;
pub mod visit_recorder;

pub use code_generator::{Attempt, CodeGenerator};
pub use creation::{CompactRequest, CreatedLink, CreationService, CreationSettings};
pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use quota::{QuotaDecision, QuotaManager, QuotaReset, TierLimits, tier_limits};
pub use rate_limiter::{RateLimitStatus, RateLimiter};
pub use resolution::{LinkAddress, ResolutionService};
pub use user_agent::{ClientInfo, parse_user_agent};
pub use visit_recorder::{RequestMeta, VisitRecorder};
