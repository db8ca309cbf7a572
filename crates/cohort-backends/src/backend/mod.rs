//! Launch shapes and the team handle trait

mod traits;
mod types;

pub use traits::{split_range, TeamMember};
pub use types::TeamPolicy;
