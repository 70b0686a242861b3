mod deploy;
mod doctor;
mod pipeline;
mod status;
mod step;

pub use deploy::deploy;
pub use doctor::doctor;
pub use status::status;
pub use step::{step_build_push, step_deploy, step_ensure_repo, step_naming};
