//! SMTP session and the transport it runs over.

mod config;
mod session;
mod stream;
mod transport;

pub use config::{
    Config, ConfigBuilder, ConnectionKind, DEFAULT_CLIENT_NAME, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_RESPONSE_TIMEOUT, DEFAULT_SEND_TIMEOUT,
};
pub use session::Session;
pub use stream::{
    MAX_LINE_LEN, SmtpStream, connect, connect_tls, create_tls_connector, read_line_from,
};
pub use transport::{TcpTransport, Transport, TransportState};
