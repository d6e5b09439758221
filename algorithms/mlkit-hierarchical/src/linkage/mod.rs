mod algorithm;
mod hyperparams;
mod policy;

pub use algorithm::*;
pub use hyperparams::*;
pub use policy::*;
