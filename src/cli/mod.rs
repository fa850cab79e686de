//! CLI command handling

pub mod ask;
pub mod extract;
pub mod output;
pub mod render;
pub mod replay;
pub mod session;

pub use ask::*;
pub use extract::*;
pub use output::*;
pub use render::*;
pub use replay::*;
pub use session::*;
