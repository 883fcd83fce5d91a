//! Seed the database with demo rooms and guests.

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use rust_decimal_macros::dec;

use innkeeper::HotelRegistry;
use innkeeper::config::DatabaseConfig;
use innkeeper::domain::RoomType;
use innkeeper::registry::{NewGuest, NewRoom};
use innkeeper::store::PgStore;

#[derive(Parser, Debug)]
#[command(about = "Seed the hotel database with demo rooms and guests")]
struct Args {
    /// Number of floors to create rooms on.
    #[arg(long, default_value_t = 3)]
    floors: i32,

    /// Rooms per floor.
    #[arg(long, default_value_t = 6)]
    rooms_per_floor: i32,

    /// Skip creating demo guests.
    #[arg(long)]
    no_guests: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = DatabaseConfig::from_env()?;
    let store = Arc::new(PgStore::new(&config).await?);
    store.run_migrations().await?;

    let registry = HotelRegistry::new(store);

    let mut created = 0;
    for floor in 1..=args.floors {
        for slot in 1..=args.rooms_per_floor {
            let number = format!("{floor}{slot:02}");
            let (room_type, capacity, price) = match slot % 4 {
                0 => (RoomType::Deluxe, 2, dec!(280.00)),
                1 => (RoomType::Single, 1, dec!(90.00)),
                2 => (RoomType::Double, 2, dec!(140.00)),
                _ => (RoomType::Suite, 4, dec!(320.00)),
            };

            match registry
                .create_room(NewRoom::new(&number, room_type, floor, capacity, price))
                .await
            {
                Ok(_) => created += 1,
                // Re-running the seeder against an existing database is fine.
                Err(innkeeper::BookingError::Validation(_)) => {
                    tracing::debug!(room = %number, "room already exists, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    tracing::info!(created, "rooms seeded");

    if !args.no_guests {
        let demo_guests = [
            ("Amelia", "Ward", "amelia.ward@example.com"),
            ("Hiro", "Tanaka", "hiro.tanaka@example.com"),
            ("Leila", "Haddad", "leila.haddad@example.com"),
            ("Tom", "Becker", "tom.becker@example.com"),
        ];

        let mut created = 0;
        for (first, last, email) in demo_guests {
            match registry.create_guest(NewGuest::new(first, last, email)).await {
                Ok(_) => created += 1,
                Err(innkeeper::BookingError::Validation(_)) => {
                    tracing::debug!(email, "guest already exists, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(created, "guests seeded");
    }

    Ok(())
}
