//! Opening line for a session.

/// Greeting for local `hour`. Returning users (`has_history`) get a
/// check-in; first-time users get an introduction.
#[must_use]
pub fn greeting(hour: u32, has_history: bool) -> &'static str {
    match (hour, has_history) {
        (0..=11, true) => "Good morning! How are you feeling today?",
        (0..=11, false) => "Good morning! I'm Samantha. I'm here to listen and understand.",
        (12..=17, true) => "Good afternoon! What's on your mind?",
        (12..=17, false) => "Hello! I'm Samantha, your AI companion. I'm here to listen.",
        (_, true) => "Good evening! How was your day?",
        (_, false) => "Good evening! I'm Samantha. I'm here to be your thoughtful companion.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morning_afternoon_evening() {
        assert_eq!(greeting(8, true), "Good morning! How are you feeling today?");
        assert_eq!(greeting(12, true), "Good afternoon! What's on your mind?");
        assert_eq!(greeting(17, false), "Hello! I'm Samantha, your AI companion. I'm here to listen.");
        assert_eq!(greeting(18, true), "Good evening! How was your day?");
        assert_eq!(greeting(23, false), "Good evening! I'm Samantha. I'm here to be your thoughtful companion.");
    }

    #[test]
    fn first_time_users_get_an_introduction() {
        assert!(greeting(0, false).contains("I'm Samantha"));
        assert!(!greeting(0, true).contains("I'm Samantha"));
    }
}
