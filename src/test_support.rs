use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use url::Url;

use crate::args::HttpMethod;
use crate::config::RunConfig;
use crate::http::RetryPolicy;

/// Local HTTP server that answers with a scripted status sequence.
///
/// Request `n` gets `statuses[n]`; once the script runs out the last status
/// repeats. Every request received is kept for inspection.
pub(crate) struct ScriptedServer {
    url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ScriptedServer {
    pub(crate) fn spawn(statuses: Vec<u16>) -> Result<Self, String> {
        Self::spawn_with_delay(statuses, Duration::ZERO)
    }

    pub(crate) fn spawn_with_delay(statuses: Vec<u16>, delay: Duration) -> Result<Self, String> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind test server failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("server addr failed: {}", err))?;
        listener
            .set_nonblocking(true)
            .map_err(|err| format!("set_nonblocking failed: {}", err))?;

        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let statuses = Arc::new(statuses);
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let server_hits = Arc::clone(&hits);
        let server_requests = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                match listener.accept() {
                    Ok((stream, _)) => {
                        let hits = Arc::clone(&server_hits);
                        let requests = Arc::clone(&server_requests);
                        let statuses = Arc::clone(&statuses);
                        thread::spawn(move || {
                            handle_client(stream, &hits, &requests, &statuses, delay);
                        });
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            hits,
            requests,
            shutdown: shutdown_tx,
            thread: Some(handle),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Result<Vec<RecordedRequest>, String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .map_err(|_poisoned| "request log poisoned".to_owned())
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// One request as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    /// Request line, e.g. `POST /submit HTTP/1.1`.
    pub(crate) request_line: String,
    /// Header names lowercased.
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        raw.extend_from_slice(chunk.get(..read)?);
    };

    let head = String::from_utf8_lossy(raw.get(..head_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = raw.get(head_end.checked_add(4)?..)?.to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(chunk.get(..read)?);
    }
    body.truncate(content_length);

    Some(RecordedRequest {
        request_line,
        headers,
        body,
    })
}

fn handle_client(
    mut stream: TcpStream,
    hits: &AtomicUsize,
    requests: &Mutex<Vec<RecordedRequest>>,
    statuses: &[u16],
    delay: Duration,
) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    if let Ok(mut log) = requests.lock() {
        log.push(request);
    }
    let index = hits.fetch_add(1, Ordering::SeqCst);
    let status = statuses
        .get(index)
        .or_else(|| statuses.last())
        .copied()
        .unwrap_or(200);
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
        status
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// URL on a port nothing listens on.
pub(crate) fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind closed listener failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("closed listener addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/refused", addr))
}

/// Run config with millisecond retry waits so retry tests stay fast.
pub(crate) fn test_config(
    url: &str,
    concurrency: usize,
    retry_max: u32,
) -> Result<RunConfig, String> {
    Ok(RunConfig {
        target_url: Url::parse(url).map_err(|err| format!("bad test url: {}", err))?,
        method: HttpMethod::Get,
        body: Vec::new(),
        content_type: Some("application/json".to_owned()),
        concurrency: NonZeroUsize::new(concurrency)
            .ok_or_else(|| "concurrency must be >= 1".to_owned())?,
        retry: RetryPolicy {
            retry_max,
            wait_min: Duration::from_millis(1),
            wait_max: Duration::from_millis(5),
        },
        expected_status: 200,
        request_timeout: Duration::from_secs(5),
        deadline: None,
    })
}

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}
