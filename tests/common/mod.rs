//! Minimal in-process HTTP stand-in for an ESP32-CAM device.
//!
//! Serves canned responses per path, records every request in order, and
//! can stall or truncate responses to simulate an unhealthy device.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// How the stub answers one path.
#[derive(Clone)]
pub enum Route {
    /// 200 with the given content type and body.
    Ok(&'static str, Vec<u8>),
    /// Plain status with an empty body.
    Status(u16),
    /// Read the request, sleep, then answer 200. Long enough sleeps make
    /// the client time out.
    Stall(Duration),
    /// Advertise a longer body than is sent, then close the connection.
    Truncated(Vec<u8>),
}

pub struct StubDevice {
    pub addr: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StubDevice {
    pub fn start(routes: HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub device");
        let addr = listener.local_addr().expect("stub addr").to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_requests = requests.clone();
        let thread_shutdown = shutdown.clone();
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming() {
                if thread_shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let Ok(stream) = stream else { continue };
                handle_connection(stream, &routes, &thread_requests);
            }
        });

        Self {
            addr,
            requests,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Requests seen so far, as "METHOD /path" in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl Drop for StubDevice {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Unblock the accept loop.
        let _ = TcpStream::connect(&self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_connection(
    stream: TcpStream,
    routes: &HashMap<String, Route>,
    requests: &Arc<Mutex<Vec<String>>>,
) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.trim().is_empty() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    // Drain headers (and any body) so the client never blocks on writes.
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    }

    requests
        .lock()
        .unwrap()
        .push(format!("{} {}", method, path));

    let mut stream = stream;
    match routes.get(&path) {
        Some(Route::Ok(content_type, body)) => {
            write_response(&mut stream, 200, content_type, body, body.len());
        }
        Some(Route::Status(code)) => {
            write_response(&mut stream, *code, "text/plain", b"", 0);
        }
        Some(Route::Stall(pause)) => {
            std::thread::sleep(*pause);
            write_response(&mut stream, 200, "text/plain", b"late", 4);
        }
        Some(Route::Truncated(body)) => {
            // Declared length exceeds what is actually written.
            write_response(&mut stream, 200, "image/jpeg", body, body.len() + 512);
        }
        None => {
            write_response(&mut stream, 404, "text/plain", b"", 0);
        }
    }
}

fn write_response(
    stream: &mut TcpStream,
    code: u16,
    content_type: &str,
    body: &[u8],
    declared_length: usize,
) {
    let reason = match code {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code, reason, content_type, declared_length
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

/// Encode a solid-color JPEG of the given size.
pub fn jpeg_frame(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 120, 90]));
    let mut bytes = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut bytes);
    encoder
        .encode(&img, width, height, image::ExtendedColorType::Rgb8)
        .expect("encode jpeg");
    bytes
}
