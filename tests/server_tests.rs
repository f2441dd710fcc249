//! End-to-end tests
//!
//! A real server on an ephemeral port, driven through the client and
//! through raw frames.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use reeldb::network::{Server, ShutdownHandle};
use reeldb::protocol::{read_response, write_request, Command, RequestHeader, Status};
use reeldb::{Client, Config, NewFilm, ReelError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<thread::JoinHandle<()>>,
    _temp: TempDir,
}

impl TestServer {
    fn start() -> Self {
        Self::start_with(|builder| builder)
    }

    fn start_with(
        configure: impl FnOnce(reeldb::config::ConfigBuilder) -> reeldb::config::ConfigBuilder,
    ) -> Self {
        let temp = TempDir::new().unwrap();
        let config = configure(
            Config::builder()
                .db_path(temp.path().join("streaming.db"))
                .listen_addr("127.0.0.1:0")
                .accept_poll_ms(5),
        )
        .build();

        let server = Server::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run().unwrap());

        Self {
            addr,
            shutdown,
            thread: Some(thread),
            _temp: temp,
        }
    }

    fn client(&self) -> Client {
        Client::connect(self.addr).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn dune() -> NewFilm {
    NewFilm::new("Dune", "Sci-Fi", "Villeneuve", 2021)
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_create_then_get() {
    let server = TestServer::start();
    let mut client = server.client();

    let id = client.create_film(&dune()).unwrap();
    assert!(id > 0);

    let response = client.request(Command::GetFilm, id.to_string().as_bytes()).unwrap();
    assert_eq!(response.status, Status::NoError);
    assert_eq!(response.count, 1);

    let film = client.get_film(id).unwrap();
    assert_eq!(film.id, id);
    assert_eq!(film.title, "Dune");
    assert_eq!(film.genre, "Sci-Fi");
    assert_eq!(film.director, "Villeneuve");
    assert_eq!(film.year, 2021);
}

#[test]
fn test_delete_then_get() {
    let server = TestServer::start();
    let mut client = server.client();

    let id = client.create_film(&dune()).unwrap();
    client.remove_film(id).unwrap();

    let response = client.request(Command::GetFilm, id.to_string().as_bytes()).unwrap();
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.count, 0);
    assert!(response.body.is_empty());
    assert!(matches!(client.get_film(id), Err(ReelError::NotFound)));
}

#[test]
fn test_remove_missing() {
    let server = TestServer::start();
    let mut client = server.client();
    assert!(matches!(client.remove_film(77), Err(ReelError::NotFound)));
}

#[test]
fn test_add_genre_missing_leaves_store_unchanged() {
    let server = TestServer::start();
    let mut client = server.client();
    client.create_film(&dune()).unwrap();
    client
        .create_film(&NewFilm::new("Heat", "Crime", "Mann", 1995))
        .unwrap();
    let before = client.list_films().unwrap();

    let response = client.request(Command::AddGenre, b"999\x1FX").unwrap();
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.body.len(), 0);

    assert_eq!(client.list_films().unwrap(), before);
}

#[test]
fn test_concurrent_genre_append() {
    let server = TestServer::start();
    let id = server
        .client()
        .create_film(&NewFilm::new("Se7en", "Drama", "Fincher", 1995))
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["Horror", "Thriller"]
        .into_iter()
        .map(|genre| {
            let mut client = server.client();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                client.add_genre(id, genre).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let film = server.client().get_film(id).unwrap();
    let mut tokens: Vec<&str> = film.genres().collect();
    assert_eq!(tokens[0], "Drama");
    tokens.sort_unstable();
    assert_eq!(tokens, vec!["Drama", "Horror", "Thriller"], "genre text: {}", film.genre);
}

#[test]
fn test_list_by_genre_substring() {
    let server = TestServer::start();
    let mut client = server.client();
    let alien = client
        .create_film(&NewFilm::new("Alien", "Horror,Sci-Fi", "Scott", 1979))
        .unwrap();
    client
        .create_film(&NewFilm::new("Heat", "Crime", "Mann", 1995))
        .unwrap();
    let it = client
        .create_film(&NewFilm::new("It", "Drama,Horror", "Muschietti", 2017))
        .unwrap();

    let films = client.list_by_genre("orr").unwrap();
    let ids: Vec<i64> = films.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![alien, it]);
    assert!(films.iter().all(|f| f.genre.contains("orr")));
}

#[test]
fn test_list_titles_and_films() {
    let server = TestServer::start();
    let mut client = server.client();
    assert!(client.list_titles().unwrap().is_empty());

    let first = client.create_film(&dune()).unwrap();
    let second = client
        .create_film(&NewFilm::new("Arrival", "Sci-Fi,Drama", "Villeneuve", 2016))
        .unwrap();

    let titles = client.list_titles().unwrap();
    assert_eq!(titles.len(), 2);
    assert_eq!((titles[0].id, titles[0].title.as_str()), (first, "Dune"));
    assert_eq!((titles[1].id, titles[1].title.as_str()), (second, "Arrival"));

    let films = client.list_films().unwrap();
    assert_eq!(films.len(), 2);
    assert_eq!(films[1].genre, "Sci-Fi,Drama");
    assert_eq!(films[1].year, 2016);

    let raw = client.request(Command::ListTitles, b"").unwrap();
    assert_eq!(raw.count, 2);
    assert_eq!(raw.body, format!("{}\x1FDune\x1E{}\x1FArrival", first, second).into_bytes());
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_validation_error_keeps_connection_open() {
    let server = TestServer::start();
    let mut client = server.client();

    let bad_year = client
        .request(Command::CreateFilm, b"Dune\x1FSci-Fi\x1FVilleneuve\x1Fnext year")
        .unwrap();
    assert_eq!(bad_year.status, Status::InternalError);
    assert_eq!(bad_year.count, 0);
    assert!(bad_year.body.is_empty());

    let bad_id = client.request(Command::GetFilm, b"twelve").unwrap();
    assert_eq!(bad_id.status, Status::InternalError);

    // Same connection still serves requests
    let id = client.create_film(&dune()).unwrap();
    assert_eq!(client.get_film(id).unwrap().title, "Dune");
    assert_eq!(client.list_titles().unwrap().len(), 1);
}

#[test]
fn test_client_rejects_separator_bytes() {
    let server = TestServer::start();
    let mut client = server.client();

    let result = client.create_film(&NewFilm::new("Du\x1Ene", "Sci-Fi", "Villeneuve", 2021));
    assert!(matches!(result, Err(ReelError::Validation(_))));
    assert!(client.list_titles().unwrap().is_empty());
}

#[test]
fn test_unknown_command_gets_internal_error() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let header = RequestHeader {
        command: 99,
        body_size: 3,
    };
    stream.write_all(&header.to_bytes()).unwrap();
    stream.write_all(b"abc").unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::InternalError);

    // The body was consumed; the next request is framed correctly
    write_request(&mut stream, Command::ListFilms, b"").unwrap();
    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::NoError);
    assert_eq!(response.count, 0);
}

#[test]
fn test_requests_answered_in_order() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    // Pipeline three requests before reading anything
    write_request(&mut stream, Command::CreateFilm, b"A\x1Fx\x1Fd\x1F2000").unwrap();
    write_request(&mut stream, Command::GetFilm, b"404").unwrap();
    write_request(&mut stream, Command::ListTitles, b"").unwrap();

    let created = read_response(&mut stream).unwrap();
    assert_eq!(created.status, Status::NoError);
    assert!(created.count > 0);
    assert_eq!(read_response(&mut stream).unwrap().status, Status::NotFound);
    assert_eq!(read_response(&mut stream).unwrap().count, 1);
}

#[test]
fn test_peer_closing_mid_body_does_not_affect_others() {
    let server = TestServer::start();

    {
        let mut stream = TcpStream::connect(server.addr).unwrap();
        let header = RequestHeader::new(Command::ListByGenre, 100);
        stream.write_all(&header.to_bytes()).unwrap();
        stream.write_all(b"partial").unwrap();
        // Dropped here: the worker sees a premature close
    }

    let mut client = server.client();
    client.create_film(&dune()).unwrap();
    assert_eq!(client.list_films().unwrap().len(), 1);
}

// =============================================================================
// Connection Management Tests
// =============================================================================

#[test]
fn test_many_clients_share_the_store() {
    let server = TestServer::start();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let mut client = server.client();
            thread::spawn(move || {
                for j in 0..5 {
                    let film = NewFilm::new(format!("Film {}-{}", i, j), "Drama", "Someone", 2000);
                    let id = client.create_film(&film).unwrap();
                    assert_eq!(client.get_film(id).unwrap().title, film.title);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(server.client().list_titles().unwrap().len(), 40);
}

#[test]
fn test_connection_limit_queues_extra_clients() {
    let server = TestServer::start_with(|b| b.max_connections(1));

    let mut first = server.client();
    first.create_film(&dune()).unwrap();

    // Connects (kernel backlog) but is not served while `first` is open
    let mut second = TcpStream::connect(server.addr).unwrap();
    second.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    write_request(&mut second, Command::ListTitles, b"").unwrap();
    let mut byte = [0u8; 1];
    assert!(second.read(&mut byte).is_err(), "second client served while at limit");

    drop(first);
    second.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let response = read_response(&mut second).unwrap();
    assert_eq!(response.status, Status::NoError);
    assert_eq!(response.count, 1);
}

#[test]
fn test_read_timeout_closes_stalled_connection() {
    let server = TestServer::start_with(|b| b.read_timeout_ms(100));

    let mut stream = TcpStream::connect(server.addr).unwrap();
    let header = RequestHeader::new(Command::ListByGenre, 10);
    stream.write_all(&header.to_bytes()).unwrap();
    // Never send the body; the server gives up and closes
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut buf = [0u8; 1];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0);
}
