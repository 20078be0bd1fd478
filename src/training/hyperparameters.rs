use crate::error::FormField;
use crate::models::Hyperparameters;
use std::ops::RangeInclusive;

/// Descriptor of one hyperparameter input
#[derive(Debug)]
pub struct HyperparameterField {
    pub field: FormField,
    /// Human label, also the term sent for explanations
    pub label: &'static str,
    /// Accepted values on submission
    pub valid: RangeInclusive<f64>,
    // Input widget range, narrower than `valid` for some fields
    pub widget_min: f64,
    pub widget_max: f64,
    pub step: f64,
    pub integer: bool,
}

impl HyperparameterField {
    /// Current value of this field in `hp`
    pub fn value(&self, hp: &Hyperparameters) -> f64 {
        match self.field {
            FormField::Gamma => hp.gamma,
            FormField::Epsilon => hp.epsilon,
            FormField::EpsilonMin => hp.epsilon_min,
            FormField::EpsilonDecay => hp.epsilon_decay,
            FormField::LearningRate => hp.learning_rate,
            FormField::Episodes => hp.episodes as f64,
            FormField::BatchSize => hp.batch_size as f64,
            FormField::Symbol | FormField::StartDate | FormField::EndDate => f64::NAN,
        }
    }
}

pub static HYPERPARAMETER_FIELDS: [HyperparameterField; 7] = [
    HyperparameterField {
        field: FormField::Gamma,
        label: "Discount Factor (Gamma)",
        valid: 0.0..=1.0,
        widget_min: 0.8,
        widget_max: 0.99,
        step: 0.001,
        integer: false,
    },
    HyperparameterField {
        field: FormField::Epsilon,
        label: "Exploration Rate (Epsilon)",
        valid: 0.0..=1.0,
        widget_min: 0.1,
        widget_max: 1.0,
        step: 0.01,
        integer: false,
    },
    HyperparameterField {
        field: FormField::EpsilonMin,
        label: "Min Exploration Rate",
        valid: 0.001..=0.1,
        widget_min: 0.001,
        widget_max: 0.1,
        step: 0.001,
        integer: false,
    },
    HyperparameterField {
        field: FormField::EpsilonDecay,
        label: "Exploration Decay",
        valid: 0.9..=0.999,
        widget_min: 0.9,
        widget_max: 0.999,
        step: 0.001,
        integer: false,
    },
    HyperparameterField {
        field: FormField::LearningRate,
        label: "Learning Rate",
        valid: 0.0001..=0.01,
        widget_min: 0.0001,
        widget_max: 0.01,
        step: 0.0001,
        integer: false,
    },
    HyperparameterField {
        field: FormField::Episodes,
        label: "Training Episodes",
        valid: 10.0..=1000.0,
        widget_min: 10.0,
        widget_max: 1000.0,
        step: 10.0,
        integer: true,
    },
    HyperparameterField {
        field: FormField::BatchSize,
        label: "Batch Size",
        valid: 8.0..=128.0,
        widget_min: 8.0,
        widget_max: 128.0,
        step: 4.0,
        integer: true,
    },
];
