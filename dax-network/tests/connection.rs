use std::time::Duration;

use dax_codec::Value;
use dax_network::{Endpoint, Pool};
use dax_protocol::wire::HANDSHAKE_MAGIC;
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

/// Reads from `socket` until `count` more top-level CBE values have been
/// decoded out of the accumulated bytes, returning them in order. Mirrors
/// `dax_network::bearer::FrameBuffer::read_value`'s decode-what-you-have
/// loop, since the wire has no length-prefixed frame header to read ahead
/// by.
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

/// Accepts one connection and plays the server side of the handshake: read
/// the five fixed handshake frames (no acknowledgements), then the seven
/// `authorizeConnection` frames, then reply with a two-value ok envelope
/// (an empty error descriptor followed by the body).
async fn run_fake_server(listener: TcpListener) {
    let (mut socket, _) = listener.accept().await.unwrap();

    let handshake = read_values(&mut socket, 5).await;
    assert_eq!(handshake[0].as_text(), Some(HANDSHAKE_MAGIC));
    assert_eq!(handshake[1], Value::UInt(0));
    assert!(handshake[2].as_text().is_some());
    assert!(handshake[3].as_map().is_some());
    assert_eq!(handshake[4], Value::UInt(0));

    let auth = read_values(&mut socket, 7).await;
    assert_eq!(auth[0], Value::UInt(1));
    assert_eq!(auth[2].as_text(), Some("AKIATEST"));

    let descriptor = Value::Sequence(vec![]);
    socket
        .write_all(&dax_codec::encode(&descriptor))
        .await
        .unwrap();
    socket
        .write_all(&dax_codec::encode(&Value::map([])))
        .await
        .unwrap();

    // keep the socket open so the pooled connection stays usable for the
    // test's lifetime
    let mut buf = vec![0u8; 4096];
    let _ = socket.read(&mut buf).await;
}

#[tokio::test]
async fn checkout_performs_the_handshake_against_a_fake_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run_fake_server(listener));

    let pool = Pool::new(
        vec![Endpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
            tls: false,
        }],
        4,
        Duration::from_secs(3600),
        Duration::from_secs(5),
        Duration::from_secs(5),
        Duration::from_secs(30),
        "dax-rs-test/0.1".into(),
        NullSigner,
        None,
    );

    let conn = pool.checkout().await.unwrap();
    assert_eq!(conn.endpoint().port, addr.port());
}
