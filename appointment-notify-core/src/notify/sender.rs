use lettre::Address;

/// The sender a notification goes out as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

impl Sender {
    /// A blank or malformed address becomes `no_reply_email`; a blank name
    /// becomes the resolved address.
    pub fn resolve(name: &str, email: &str, no_reply_email: &str) -> Self {
        let email = email.trim();
        let email = if is_valid_email(email) {
            email
        } else {
            no_reply_email
        };

        let name = name.trim();
        let name = if name.is_empty() { email } else { name };

        Sender {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.parse::<Address>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_REPLY: &str = "no-reply@localhost";

    #[test]
    fn test_valid_sender_is_kept() {
        let sender = Sender::resolve("Town hall", "hall@example.org", NO_REPLY);
        assert_eq!(sender.name, "Town hall");
        assert_eq!(sender.email, "hall@example.org");
    }

    #[test]
    fn test_blank_sender_falls_back_to_no_reply() {
        let sender = Sender::resolve("", "  ", NO_REPLY);
        assert_eq!(sender.email, NO_REPLY);
        assert_eq!(sender.name, NO_REPLY);
    }

    #[test]
    fn test_malformed_sender_falls_back_to_no_reply() {
        let sender = Sender::resolve("Town hall", "not-an-address", NO_REPLY);
        assert_eq!(sender.email, NO_REPLY);
        assert_eq!(sender.name, "Town hall");
    }

    #[test]
    fn test_blank_name_uses_address() {
        let sender = Sender::resolve(" ", "hall@example.org", NO_REPLY);
        assert_eq!(sender.name, "hall@example.org");
    }
}
