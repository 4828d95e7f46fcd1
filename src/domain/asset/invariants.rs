use super::entity::{MapAsset, TokenAsset};
use super::naming::{normalize_name, normalize_tag};
use crate::domain::{DomainError, DomainResult};

/// Validates all MapAsset invariants
pub fn validate_map_asset(asset: &MapAsset) -> DomainResult<()> {
    validate_name(&asset.name)?;
    validate_tags(asset)?;
    validate_absolute(&asset.path, "Map path")?;
    validate_absolute(&asset.thumbnail_path, "Thumbnail path")?;
    Ok(())
}

/// Validates all TokenAsset invariants
pub fn validate_token_asset(token: &TokenAsset) -> DomainResult<()> {
    validate_name(&token.name)?;
    validate_absolute(&token.path, "Token path")?;
    Ok(())
}

/// Name must be non-empty and already in its keyed form
fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }

    if normalize_name(name) != name {
        return Err(DomainError::InvariantViolation(format!(
            "Name is not normalized: {:?}",
            name
        )));
    }

    Ok(())
}

fn validate_tags(asset: &MapAsset) -> DomainResult<()> {
    for tag in &asset.tags {
        if tag.is_empty() || normalize_tag(tag) != *tag {
            return Err(DomainError::InvariantViolation(format!(
                "Tag {:?} on {:?} must be lower-case and trimmed",
                tag, asset.name
            )));
        }
    }
    Ok(())
}

fn validate_absolute(path: &std::path::Path, what: &str) -> DomainResult<()> {
    if !path.is_absolute() {
        return Err(DomainError::InvariantViolation(format!(
            "{} must be absolute: {:?}",
            what, path
        )));
    }
    Ok(())
}
