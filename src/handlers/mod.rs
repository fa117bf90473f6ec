pub mod api;
pub mod calls;
pub mod media_stream;
pub mod observer;
pub mod tokens;
