pub mod channel_check;
pub mod prompts;
