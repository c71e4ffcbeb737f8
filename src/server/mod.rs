use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use tracing::{info, warn};

pub mod api;
pub mod routes;

const MAX_REQUEST_BYTES: usize = 1 << 20;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking accept loop. Connections are served one at a time.
pub fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    info!("delivery dispatch server listening on http://{bind_addr}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream) {
                    warn!("request error: {err}");
                }
            }
            Err(err) => warn!("connection failed: {err}"),
        }
    }

    Ok(())
}

fn handle_connection(stream: &mut TcpStream) -> std::io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let raw = read_request(stream)?;
    if raw.is_empty() {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&raw);
    let request_line = request.lines().next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");
    let body = split_body(&request);

    let response = routes::route_request(method, path, body);
    info!(method, path, status = response.status_code, "request handled");
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()
}

/// Reads headers, then keeps reading until `Content-Length` bytes of body arrived.
fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 16_384];
    loop {
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..bytes_read]);
        if raw.len() >= MAX_REQUEST_BYTES {
            break;
        }

        let text = String::from_utf8_lossy(&raw);
        if let Some((header_end, body_start)) = header_bounds(&text) {
            let expected = body_start + content_length(&text[..header_end]);
            if raw.len() >= expected {
                break;
            }
        }
    }
    Ok(raw)
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// End of the header block and start of the body. Accepts CRLF or bare LF
/// line endings.
fn header_bounds(request: &str) -> Option<(usize, usize)> {
    request
        .find("\r\n\r\n")
        .map(|end| (end, end + 4))
        .or_else(|| request.find("\n\n").map(|end| (end, end + 2)))
}

fn split_body(request: &str) -> &str {
    header_bounds(request)
        .map(|(_, body_start)| &request[body_start..])
        .unwrap_or("")
}
