pub mod connection_messages;
pub mod local_upload;
pub mod object_events;
pub mod websocket;
