//! Docker Engine API client over the unix socket.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::net::UnixStream;

use crate::docker::error::{DockerError, DockerResult};
use crate::docker::models::{Container, ContainerInspect, ContainerSummary, ExecCreated, Network, NetworkSummary};
use crate::docker::ContainerInventory;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// One HTTP/1.1 connection per call; the daemon is local and calls are rare.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn send(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> DockerResult<Bytes> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| DockerError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Docker connection closed with error");
            }
        });

        let payload = match body {
            Some(value) => Bytes::from(serde_json::to_vec(&value)?),
            None => Bytes::new(),
        };

        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, "docker")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(payload))?;

        let response = sender.send_request(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            return Err(DockerError::Api {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        Ok(bytes)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> DockerResult<T> {
        let bytes = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// The daemon reports errors as `{"message": "..."}`.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[async_trait]
impl ContainerInventory for DockerClient {
    async fn list_containers(&self) -> DockerResult<Vec<Container>> {
        let summaries: Vec<ContainerSummary> = self.get_json("/containers/json").await?;
        Ok(summaries.into_iter().map(Container::from).collect())
    }

    async fn list_networks(&self) -> DockerResult<Vec<Network>> {
        let summaries: Vec<NetworkSummary> = self.get_json("/networks").await?;
        Ok(summaries.into_iter().map(Network::from).collect())
    }

    async fn connect_container(&self, network_id: &str, container_id: &str) -> DockerResult<()> {
        tracing::info!(network = %network_id, container = %container_id, "Connecting container to proxy network");
        self.send(
            Method::POST,
            &format!("/networks/{}/connect", network_id),
            Some(json!({ "Container": container_id })),
        )
        .await?;
        Ok(())
    }

    async fn get_container(&self, container_id: &str) -> DockerResult<Container> {
        let inspect: ContainerInspect = self.get_json(&format!("/containers/{}/json", container_id)).await?;
        Ok(Container::from(inspect))
    }

    async fn execute_command(&self, container_id: &str, argv: &[&str]) -> DockerResult<()> {
        let bytes = self
            .send(
                Method::POST,
                &format!("/containers/{}/exec", container_id),
                Some(json!({
                    "AttachStdout": false,
                    "AttachStderr": false,
                    "Cmd": argv,
                })),
            )
            .await?;
        let exec: ExecCreated = serde_json::from_slice(&bytes)?;

        self.send(
            Method::POST,
            &format!("/exec/{}/start", exec.id),
            Some(json!({ "Detach": true, "Tty": false })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(br#"{"message": "No such container: x"}"#), "No such container: x");
        assert_eq!(error_message(b"page not found\n"), "page not found");
    }

    /// Answers every connection on a unix socket with a fixed response.
    async fn serve_once(path: &Path, status_line: &'static str, body: &'static str) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::UnixListener::bind(path).unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
    }

    #[tokio::test]
    async fn test_list_networks_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.sock");
        serve_once(
            &path,
            "200 OK",
            r#"[{"Id":"net1","Name":"docker-proxy_default","Labels":{"com.docker.compose.project":"docker-proxy"}}]"#,
        )
        .await;

        let networks = DockerClient::new(&path).list_networks().await.unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].id, "net1");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.sock");
        serve_once(&path, "404 Not Found", r#"{"message":"No such container: nope"}"#).await;

        let err = DockerClient::new(&path).get_container("nope").await.unwrap_err();
        assert!(matches!(
            err,
            DockerError::Api { status: 404, ref message } if message == "No such container: nope"
        ));
    }

    #[tokio::test]
    async fn test_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let client = DockerClient::new(dir.path().join("docker.sock"));
        let err = client.list_containers().await.unwrap_err();
        assert!(matches!(err, DockerError::Connect { .. }));
    }
}
