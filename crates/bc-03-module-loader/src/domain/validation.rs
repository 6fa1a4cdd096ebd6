//! Module contract check.

use super::descriptor::ModuleDescriptor;
use super::errors::ValidationError;

/// Check the required fields of `descriptor` and the disabled list.
pub fn validate_contract(
    descriptor: &ModuleDescriptor,
    disabled: &[String],
) -> Result<(), ValidationError> {
    if descriptor.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if descriptor.version.is_empty() {
        return Err(ValidationError::MissingVersion(descriptor.name.clone()));
    }
    if descriptor.entry.is_none() {
        return Err(ValidationError::MissingEntry(descriptor.name.clone()));
    }
    if disabled.iter().any(|d| d == &descriptor.name) {
        return Err(ValidationError::Disabled(descriptor.name.clone()));
    }
    Ok(())
}
