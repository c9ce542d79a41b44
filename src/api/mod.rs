// IPC surface: wire DTOs and the line-delimited JSON server.

pub mod dto;
pub mod server;

pub use dto::GraphDto;
pub use server::ApiServer;
