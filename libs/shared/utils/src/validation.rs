use shared_models::ClientError;

/// Trims `value` and rejects it with `message` when nothing is left.
pub fn required_trimmed<'a>(value: &'a str, message: &str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(message.to_string()));
    }
    Ok(trimmed)
}

/// Rejects empty values without trimming (passwords may legitimately contain spaces).
pub fn required(value: &str, message: &str) -> Result<(), ClientError> {
    if value.is_empty() {
        return Err(ClientError::Validation(message.to_string()));
    }
    Ok(())
}
