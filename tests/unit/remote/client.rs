use std::io::{BufRead, Write};
use std::net::TcpListener;
use std::sync::mpsc;

use super::*;

/// One-connection server that answers each request via `reply` and reports what it received.
fn scripted_server(
    reply: impl Fn(&Request) -> Option<Response> + Send + 'static,
) -> (SocketAddr, mpsc::Receiver<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let req: Request = serde_json::from_str(line.trim_end()).unwrap();
            let resp = reply(&req);
            let _ = tx.send(req);
            // `None` simulates a server that dies mid-call.
            let Some(resp) = resp else {
                return;
            };
            let mut out = serde_json::to_vec(&resp).unwrap();
            out.push(b'\n');
            writer.write_all(&out).unwrap();
        }
    });
    (addr, rx)
}

fn two_by_one(req: &Request) -> Option<Response> {
    Some(match req {
        Request::Geometry => Response::Geometry {
            width: 2,
            height: 1,
        },
        _ => Response::Done,
    })
}

#[test]
fn connect_sizes_buffer_from_server_geometry() {
    let (addr, rx) = scripted_server(two_by_one);
    let m = RemoteMatrix::connect(addr).unwrap();
    assert_eq!(m.peer_addr(), addr);
    assert_eq!(rx.recv().unwrap(), Request::Geometry);
    assert_eq!(m.at(0), Rgb8::BLACK);
    assert_eq!(m.at(1), Rgb8::BLACK);
}

#[test]
fn geometry_is_fetched_on_every_call() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    assert_eq!(m.geometry().unwrap(), Geometry::new(2, 1));
    assert_eq!(m.geometry().unwrap(), Geometry::new(2, 1));
    let seen: Vec<Request> = rx.try_iter().collect();
    assert_eq!(seen, vec![Request::Geometry; 3]);
}

#[test]
fn render_ships_whole_buffer_then_resets_it() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let _ = rx.recv();

    let red = Rgb8::new(255, 0, 0);
    m.set(1, red);
    assert_eq!(m.at(1), red);
    m.render().unwrap();
    assert_eq!(
        rx.recv().unwrap(),
        Request::Apply {
            colors: vec![Rgb8::BLACK, red]
        }
    );
    assert_eq!(m.at(1), Rgb8::BLACK);
}

#[test]
fn apply_validates_length_locally() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let _ = rx.recv();
    let err = m.apply(vec![Rgb8::WHITE]).unwrap_err();
    assert!(matches!(err, MatrixError::Validation(_)));
    assert!(rx.try_recv().is_err());
}

#[test]
fn close_blanks_then_closes() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let _ = rx.recv();
    m.close().unwrap();
    assert_eq!(
        rx.recv().unwrap(),
        Request::Apply {
            colors: vec![Rgb8::BLACK; 2]
        }
    );
    assert_eq!(rx.recv().unwrap(), Request::Close);
}

#[test]
fn close_skips_blanking_when_black_is_already_shown() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let _ = rx.recv();

    m.set(0, Rgb8::WHITE);
    m.render().unwrap();
    // Nothing pending, so this ships an all-black frame.
    m.render().unwrap();
    m.close().unwrap();
    drop(m);

    let seen: Vec<Request> = rx.iter().collect();
    assert_eq!(
        seen,
        vec![
            Request::Apply {
                colors: vec![Rgb8::WHITE, Rgb8::BLACK]
            },
            Request::Apply {
                colors: vec![Rgb8::BLACK; 2]
            },
            Request::Close,
        ]
    );
}

#[test]
fn close_blanks_when_a_lit_frame_is_shown() {
    let (addr, rx) = scripted_server(two_by_one);
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let _ = rx.recv();

    m.apply(vec![Rgb8::WHITE; 2]).unwrap();
    m.close().unwrap();
    drop(m);

    let seen: Vec<Request> = rx.iter().skip(1).collect();
    assert_eq!(
        seen,
        vec![
            Request::Apply {
                colors: vec![Rgb8::BLACK; 2]
            },
            Request::Close,
        ]
    );
}

#[test]
fn server_errors_surface_as_remote_errors() {
    let (addr, _rx) = scripted_server(|req| {
        Some(match req {
            Request::Geometry => Response::Geometry {
                width: 1,
                height: 1,
            },
            _ => Response::Error {
                message: "panel on fire".to_string(),
            },
        })
    });
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let err = m.render().unwrap_err();
    assert!(matches!(err, MatrixError::Remote(ref msg) if msg == "panel on fire"));
}

#[test]
fn dropped_connection_is_a_transport_error_without_retry() {
    let (addr, rx) = scripted_server(|req| match req {
        Request::Geometry => Some(Response::Geometry {
            width: 1,
            height: 1,
        }),
        _ => None,
    });
    let mut m = RemoteMatrix::connect(addr).unwrap();
    let err = m.render().unwrap_err();
    assert!(matches!(err, MatrixError::Transport(_)));
    // Exactly one attempt reached the server.
    let seen: Vec<Request> = rx.iter().collect();
    assert_eq!(seen.len(), 2);
}
