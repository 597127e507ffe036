//! Party number categorization.
//!
//! Tags calling and called numbers with the role inferred from the reference
//! directory. Four matchers run per record, in priority order:
//!
//! 1. **Dial numbers**: contact center routable numbers
//! 2. **Users**: the contact center user the leg belongs to (agent or not)
//! 3. **Queues**: call queue numbers
//! 4. **Phone numbers**: platform numbers, by owner type
//!
//! A number keeps the first role it receives.

mod matchers;
mod service;

pub use matchers::{
    Annotation, DialNumberMatcher, PhoneNumberMatcher, QueueMatcher, RoleMatcher, UserMatcher,
    default_matchers,
};
pub use service::CategorizationService;
