use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::stream::BoxedSocket;
use boring::ssl::{SslConnector, SslMethod};
use std::io;
use tokio::net::TcpStream;
use url::Url;

/// ALPN protocol list: HTTP/1.1 only.
const ALPN_HTTP11: &[u8] = b"\x08http/1.1";

/// Opens the connection for a URL: DNS -> TCP -> TLS (for `https`).
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url) -> Result<BoxedSocket, NetError> {
        let host = url
            .host_str()
            .ok_or_else(|| NetError::invalid_url(url.as_str(), url::ParseError::EmptyHost))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| NetError::invalid_url(url.as_str(), url::ParseError::InvalidPort))?;
        let lookup_host = host.trim_start_matches('[').trim_end_matches(']');

        let addrs: Vec<_> = tokio::net::lookup_host((lookup_host, port))
            .await
            .dns_context(host)?
            .collect();

        let mut stream = None;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let stream = stream
            .ok_or_else(|| {
                last_err.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
                })
            })
            .connection_context(host, port)?;
        let _ = stream.set_nodelay(true);

        if url.scheme() != "https" {
            return Ok(BoxedSocket::new(stream));
        }

        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| NetError::transport("TLS setup failed", e))?;
        builder
            .set_alpn_protos(ALPN_HTTP11)
            .map_err(|e| NetError::transport("TLS setup failed", e))?;

        let config = builder
            .build()
            .configure()
            .map_err(|e| NetError::transport("TLS setup failed", e))?;

        let tls_stream = tokio_boring::connect(config, lookup_host, stream)
            .await
            .map_err(|e| {
                NetError::transport(format!("TLS handshake with {host} failed"), e.to_string())
            })?;

        tracing::debug!(%host, port, "TLS established");
        Ok(BoxedSocket::new(tls_stream))
    }
}
