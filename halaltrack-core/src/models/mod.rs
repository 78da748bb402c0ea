mod sla;
mod stage;
mod task;
mod user;

pub use sla::*;
pub use stage::*;
pub use task::*;
pub use user::*;
