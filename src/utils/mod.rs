pub mod clock;
pub mod logger;
pub mod pagination;
pub mod redact;
pub mod time;
