/*!
 * Platform Resources
 * Internal registry for platform-owned resources and transient handle claims
 *
 * Claims let an external collaborator cross-reference every handle still
 * open at checkpoint time against a known owner and flag the unclaimed
 * ones. Enumerating host handles is that collaborator's job.
 */

mod claims;
mod context;
mod kinds;

pub use claims::{Claim, DiagnosticFn};
pub use context::PlatformContext;
pub use kinds::PlatformResourceKind;
