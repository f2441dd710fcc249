//! ReelDB CLI Client
//!
//! Command-line interface for interacting with a ReelDB server.

use clap::{Parser, Subcommand};
use reeldb::{Client, Film, FilmTitle, NewFilm, ReelError};
use tracing_subscriber::{fmt, EnvFilter};

/// ReelDB CLI
#[derive(Parser, Debug)]
#[command(name = "reeldb-cli")]
#[command(about = "CLI for the ReelDB film catalog")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new film
    Create {
        title: String,

        /// Comma-separated genres
        genre: String,

        director: String,

        /// Release year (0-9999)
        year: u16,
    },

    /// Remove a film by id
    Remove { id: i64 },

    /// Append a genre to a film
    AddGenre { id: i64, genre: String },

    /// List id and title of every film
    Titles,

    /// List every film
    List,

    /// Show one film
    Get { id: i64 },

    /// List films whose genre contains the given text
    ByGenre { pattern: String },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        match e {
            ReelError::NotFound => eprintln!("Film not found."),
            e => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> reeldb::Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Create {
            title,
            genre,
            director,
            year,
        } => {
            let id = client.create_film(&NewFilm::new(title, genre, director, year))?;
            println!("Created film {}", id);
        }
        Commands::Remove { id } => {
            client.remove_film(id)?;
            println!("Removed film {}", id);
        }
        Commands::AddGenre { id, genre } => {
            client.add_genre(id, &genre)?;
            println!("Updated film {}", id);
        }
        Commands::Titles => {
            for title in client.list_titles()? {
                print_title(&title);
            }
        }
        Commands::List => {
            for film in client.list_films()? {
                print_film(&film);
            }
        }
        Commands::Get { id } => print_film(&client.get_film(id)?),
        Commands::ByGenre { pattern } => {
            for film in client.list_by_genre(&pattern)? {
                print_film(&film);
            }
        }
    }

    Ok(())
}

fn print_title(title: &FilmTitle) {
    println!("| {} | {} |", title.id, title.title);
}

fn print_film(film: &Film) {
    println!(
        "| {} | {} | {} | {} | {} |",
        film.id, film.title, film.genre, film.director, film.year
    );
}
