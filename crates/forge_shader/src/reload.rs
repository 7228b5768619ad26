//! Hot-reload transmitter
//!
//! Compiles a single entry point to a raw binary object and pushes it to
//! the engine's asset server as one [`HotReloadPacket`] frame. Fire and
//! forget: no acknowledgement is read. Connect and write both carry a
//! timeout so an unreachable endpoint cannot hang the tool.

use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use crate::compile::ShaderCompiler;
use crate::kind::ShaderKind;
use crate::packet::HotReloadPacket;
use crate::ShaderError;

/// Default asset-server endpoint
pub const DEFAULT_SERVER: &str = "127.0.0.1:8000";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Compiles one shader entry point and transmits it to a running process
pub struct ShaderReloader {
    compiler: ShaderCompiler,
    server: String,
    timeout: Duration,
}

impl ShaderReloader {
    pub fn new(compiler: ShaderCompiler, server: impl Into<String>) -> Self {
        Self {
            compiler,
            server: server.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recompile `entry_point` from `source_path` and send it to the asset
    /// server.
    ///
    /// The entry-point prefix is validated before anything else runs, and a
    /// compile failure performs no network activity. Success means the
    /// whole frame was written without I/O error; neither step is retried.
    pub fn reload(&self, source_path: &Path, entry_point: &str) -> Result<(), ShaderError> {
        ShaderKind::from_entry_point(entry_point)?;

        let bytecode = self.compiler.compile_object(source_path, entry_point)?;
        let frame = HotReloadPacket::new(entry_point, bytecode).encode();

        let mut stream = self.connect()?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| self.connection_failed(e))?;
        stream
            .write_all(&frame)
            .map_err(|e| self.connection_failed(e))?;
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            log::debug!("Socket shutdown after send failed: {e}");
        }

        log::info!(
            "Hot reloaded {} ({} frame bytes) via {}",
            entry_point,
            frame.len(),
            self.server
        );
        Ok(())
    }

    fn connect(&self) -> Result<TcpStream, ShaderError> {
        let addrs = self
            .server
            .to_socket_addrs()
            .map_err(|e| self.connection_failed(e))?;

        let mut last_error = std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "endpoint resolved to no addresses",
        );
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = e,
            }
        }
        Err(self.connection_failed(last_error))
    }

    fn connection_failed(&self, source: std::io::Error) -> ShaderError {
        ShaderError::ConnectionFailed {
            server: self.server.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::path::PathBuf;

    #[test]
    fn test_unknown_prefix_rejected_before_compile() {
        // Compiler points at a nonexistent executable; reaching it would
        // surface an I/O error instead of the prefix error.
        let reloader = ShaderReloader::new(ShaderCompiler::new("/nonexistent/dxc"), "127.0.0.1:1");
        let err = reloader
            .reload(&PathBuf::from("post.psh"), "XX_Foo")
            .unwrap_err();
        assert!(matches!(
            err,
            ShaderError::UnknownEntryPointPrefix { entry_point } if entry_point == "XX_Foo"
        ));
    }

    #[test]
    fn test_connection_failure_is_reported() {
        // Port 1 on loopback is essentially never listening.
        let reloader = ShaderReloader::new(ShaderCompiler::new("/nonexistent/dxc"), "127.0.0.1:1")
            .with_timeout(Duration::from_millis(200));
        // Skip compilation by transmitting a prebuilt frame path: reload
        // would fail at the compiler first, so exercise connect directly.
        let err = reloader.connect().unwrap_err();
        assert!(matches!(err, ShaderError::ConnectionFailed { .. }));
    }

    #[test]
    fn test_frame_arrives_intact() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let expected = HotReloadPacket::new("PS_Tonemap", vec![7; 128]).encode();
        let frame = expected.clone();

        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).unwrap();
            received
        });

        let reloader = ShaderReloader::new(
            ShaderCompiler::new("/nonexistent/dxc"),
            addr.to_string(),
        );
        let mut stream = reloader.connect().unwrap();
        stream.write_all(&frame).unwrap();
        stream.shutdown(Shutdown::Both).unwrap();

        assert_eq!(server.join().unwrap(), expected);
    }
}
