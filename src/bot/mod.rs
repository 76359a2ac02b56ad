mod handler;
mod telegram;

pub use handler::{
    ChatTransport, HELP_TEXT, MAX_REPLY_CHARS, MessageHandler, PLACEHOLDER_TEXT, Route,
    START_TEXT, error_reply, route, truncate_reply,
};
pub use telegram::{DEFAULT_TELEGRAM_BASE_URL, TelegramClient, Update, poll_once, run_polling};
