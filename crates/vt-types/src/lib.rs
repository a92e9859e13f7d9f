pub mod dataset;
pub mod errors;
pub mod labels;
pub mod split;

pub use dataset::*;
pub use errors::*;
pub use labels::*;
pub use split::*;
