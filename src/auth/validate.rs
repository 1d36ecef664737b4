//! Input format checks for registration and profile updates

/// Upper bound on accepted passwords; keeps hashing cost bounded
pub const MAX_PASSWORD_LENGTH: usize = 1024;

pub const MAX_USERNAME_LENGTH: usize = 50;

pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    // ASCII only, so byte length is the character count
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err("Username can only contain letters, numbers, underscore, and hyphen".to_string());
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!("Username must be at most {} characters", MAX_USERNAME_LENGTH));
    }

    if !username.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err("Username must start with a letter or number".to_string());
    }

    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    if local.is_empty() || domain.contains('@') {
        return Err("Invalid email format".to_string());
    }

    // Domain needs at least one dot with labels on both sides
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!("Password must be at most {} bytes", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username_format("testuser").is_ok());
        assert!(validate_username_format("a_b-c1").is_ok());
        assert!(validate_username_format("a").is_ok());
        assert!(validate_username_format("").is_err());
        assert!(validate_username_format("_abc").is_err());
        assert!(validate_username_format("has space").is_err());
        assert!(validate_username_format(&"x".repeat(50)).is_ok());
        assert!(validate_username_format(&"x".repeat(51)).is_err());
    }

    #[test]
    fn usernames_are_ascii_only() {
        assert!(validate_username_format("用户").is_err());
        assert!(validate_username_format("éclair").is_err());
        assert!(validate_username_format("a١").is_err());
    }

    #[test]
    fn username_length_message_matches_bound() {
        let err = validate_username_format(&"x".repeat(51)).unwrap_err();
        assert_eq!(err, "Username must be at most 50 characters");
    }

    #[test]
    fn emails() {
        assert!(validate_email_format("a@x.com").is_ok());
        assert!(validate_email_format("test@example.com").is_ok());
        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("no-at.com").is_err());
        assert!(validate_email_format("@x.com").is_err());
        assert!(validate_email_format("a@b@x.com").is_err());
        assert!(validate_email_format("a@localhost").is_err());
        assert!(validate_email_format("a@x..com").is_err());
        assert!(validate_email_format("a b@x.com").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("p1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }
}
