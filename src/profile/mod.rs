pub mod adapter;

pub use adapter::{DependentType, Gender, LivingStatus, MaritalStatus, Religion};
