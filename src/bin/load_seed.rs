use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use sales_dashboard::{
    count_transactions, initialize_db, load_seed_file, replace_all_transactions,
};

/// A utility for loading a seed dataset file into a sales dashboard database.
///
/// Any transactions already in the database are replaced.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// File path to the seed dataset, a JSON array of product transactions.
    #[arg(long, short)]
    seed_path: String,
}

/// Replace the transactions in a database with those in a seed file.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let db_path = Path::new(&args.db_path);

    match db_path.extension() {
        None => {
            eprintln!("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    println!("Reading seed data from {:#?}", args.seed_path);
    let transactions = load_seed_file(Path::new(&args.seed_path))?;

    println!("Opening database at {db_path:#?}");
    let mut conn = Connection::open(db_path)?;
    initialize_db(&conn)?;

    let inserted = replace_all_transactions(&transactions, &mut conn)?;
    println!(
        "Loaded {inserted} transactions, the database now holds {}.",
        count_transactions(&conn)?
    );

    Ok(())
}
