use crate::error::{RejectionKind, RelayError, RelayResult};

/// Extension of `file_name` including the leading dot, as written. Returns
/// `None` for names without one (`README`, `.profile`).
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&base[idx..]),
    }
}

/// Check `file_name` against `allowed` (dotted, case-sensitive).
pub fn validate_file_type(file_name: &str, allowed: &[String]) -> RelayResult<()> {
    let accepted = file_extension(file_name)
        .map(|ext| allowed.iter().any(|a| a == ext))
        .unwrap_or(false);

    if !accepted {
        return Err(RelayError::upload_rejection(
            RejectionKind::UnsupportedType,
            format!("Unsupported file format, only {} allowed", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_file_size(file_size: u64, max_size: u64) -> RelayResult<()> {
    if file_size > max_size {
        return Err(RelayError::upload_rejection(
            RejectionKind::TooLarge,
            format!(
                "File too large: {} bytes exceeds maximum allowed size {} bytes",
                file_size, max_size
            ),
        ));
    }

    Ok(())
}
