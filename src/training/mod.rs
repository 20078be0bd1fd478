// Mock agent training: episode rewards and hyperparameter metadata
pub mod episodes;
pub mod hyperparameters;

pub use episodes::EpisodeRewardGenerator;
pub use hyperparameters::{HyperparameterField, HYPERPARAMETER_FIELDS};
