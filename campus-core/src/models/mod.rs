pub mod audit;
pub mod bulk;
pub mod challenge;
pub mod course;
pub mod grant;
pub mod lifecycle;
pub mod user;
pub mod wiki;

pub use audit::{AuditAction, AuditRecord};
pub use bulk::{BulkOutcome, BulkRequest, EntityKind};
pub use challenge::{ChallengeToken, IssuedChallenge};
pub use course::Course;
pub use grant::{CourseAccessGrant, GrantAccessRequest};
pub use lifecycle::{plan_transition, LifecycleStatus, TransitionPlan};
pub use user::{AuthContext, BeginLoginRequest, CompleteLoginRequest, Role, User};
pub use wiki::{ArticleLocale, DraftPatch, VersionStatus, WikiArticle, WikiVersion};
