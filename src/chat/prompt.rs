//! Opening messages of a conversation.

use crate::session::Session;
use crate::types::Message;

/// System prompt that tells the model when to reach for the auth tools.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant in a demo application that shows AI-guided authentication.

INSTRUCTIONS:
- When a user indicates they want to log in or provides credentials, you MUST call the login tool with those credentials.
- If a user says \"log me in\" or \"I want to sign in\", ask them for their email and password.
- After receiving credentials, ALWAYS use the login tool to authenticate them, not just respond in text.
- Do not proceed with conversations about personal information without successful authentication.

AVAILABLE TOOLS:
- check_auth_status: Check if a user is authenticated.
- login: Submit user credentials for authentication. Call this tool with email and password when provided.
- get_user_info: Get user personal information (only if authenticated).
- logout: Log the user out.

USER EXPERIENCE NOTES:
- Be conversational and helpful in guiding users through the authentication process.
- For this demo, the credentials user@example.com / password123 will always work.";

pub fn system_message() -> Message {
    Message::system(SYSTEM_PROMPT)
}

/// Greeting shown before the first user turn.
pub fn welcome_message(session: Option<&Session>) -> Message {
    let tail = match session {
        Some(s) => format!(
            "I see you're already signed in as {}. Feel free to ask about your account information or any other questions.",
            s.user.name.as_deref().unwrap_or("a user")
        ),
        None => "I can help you sign in to access your personal information. Just let me know if you'd like to log in."
            .to_string(),
    };
    Message::assistant(format!(
        "Hello! I'm your AI assistant for this authentication demo. {}",
        tail
    ))
}
