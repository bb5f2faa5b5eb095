use std::time::Duration;

use dax_codec::Value;
use dax_network::{Endpoint, Pool};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Clone)]
struct NullSigner;

impl dax_network::signer::LocalSigner for NullSigner {
    async fn sign(&self) -> Result<dax_network::signer::SignedAuth, dax_network::Error> {
        Ok(dax_network::signer::SignedAuth {
            access_key: "AKIATEST".to_string(),
            signature: "00".to_string(),
            string_to_sign: b"test".to_vec(),
            token: None,
        })
    }
}

async fn read_values(socket: &mut tokio::net::TcpStream, count: usize) -> Vec<Value> {
    let mut buf = Vec::new();
    let mut values = Vec::new();

    while values.len() < count {
        match dax_codec::decode(&buf) {
            Ok((value, remaining)) => {
                let consumed = buf.len() - remaining.len();
                buf.drain(..consumed);
                values.push(value);
            }
            Err(_) => {
                let mut chunk = vec![0u8; 4096];
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "socket closed before {count} values were read");
                buf.extend_from_slice(&chunk[..n]);
            }
        }
    }

    values
}

async fn spawn_fake_server() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => return,
            };

            tokio::spawn(async move {
                // five handshake frames, no replies
                let _ = read_values(&mut socket, 5).await;
                // seven authorizeConnection frames
                let _ = read_values(&mut socket, 7).await;

                let descriptor = Value::Sequence(vec![]);
                if socket
                    .write_all(&dax_codec::encode(&descriptor))
                    .await
                    .is_err()
                {
                    return;
                }
                if socket
                    .write_all(&dax_codec::encode(&Value::map([])))
                    .await
                    .is_err()
                {
                    return;
                }

                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
            });
        }
    });

    Endpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
        tls: false,
    }
}

#[tokio::test]
async fn round_robin_visits_every_endpoint_before_repeating() {
    let endpoints = vec![spawn_fake_server().await, spawn_fake_server().await];

    let pool = Pool::new(
        endpoints.clone(),
        4,
        Duration::from_secs(3600),
        Duration::from_secs(5),
        Duration::from_secs(5),
        Duration::from_secs(30),
        "dax-rs-test/0.1".into(),
        NullSigner,
        None,
    );

    let mut visited = Vec::new();
    for _ in 0..4 {
        let conn = pool.checkout().await.unwrap();
        visited.push(conn.endpoint().port);
    }

    assert_eq!(visited[0], endpoints[0].port);
    assert_eq!(visited[1], endpoints[1].port);
    assert_eq!(visited[2], endpoints[0].port);
    assert_eq!(visited[3], endpoints[1].port);
}

#[tokio::test]
async fn checkout_fails_once_the_per_host_cap_is_reached() {
    let endpoint = spawn_fake_server().await;

    let pool = Pool::new(
        vec![endpoint.clone()],
        1,
        Duration::from_secs(3600),
        Duration::from_secs(5),
        Duration::from_secs(5),
        Duration::from_secs(30),
        "dax-rs-test/0.1".into(),
        NullSigner,
        None,
    );

    let _first = pool.checkout().await.unwrap();
    let second = pool.checkout().await;
    assert!(second.is_err());
}

#[tokio::test]
async fn checkout_fails_immediately_with_no_endpoints() {
    let pool = Pool::new(
        vec![],
        4,
        Duration::from_secs(3600),
        Duration::from_secs(5),
        Duration::from_secs(5),
        Duration::from_secs(30),
        "dax-rs-test/0.1".into(),
        NullSigner,
        None,
    );

    assert!(matches!(
        pool.checkout().await,
        Err(dax_network::Error::NoEndpoints)
    ));
}

#[tokio::test]
async fn checkout_fails_after_close() {
    let endpoint = spawn_fake_server().await;

    let pool = Pool::new(
        vec![endpoint],
        4,
        Duration::from_secs(3600),
        Duration::from_secs(5),
        Duration::from_secs(5),
        Duration::from_secs(30),
        "dax-rs-test/0.1".into(),
        NullSigner,
        None,
    );

    pool.close();

    assert!(matches!(
        pool.checkout().await,
        Err(dax_network::Error::PoolClosed)
    ));
}
