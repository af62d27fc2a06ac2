//! Alert channel port trait.

use crate::domain::error::CrosswatchError;

pub trait AlertPort {
    fn send(&self, message: &str) -> Result<(), CrosswatchError>;
}
