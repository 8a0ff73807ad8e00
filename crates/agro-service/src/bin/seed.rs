//! # Seed Data Generator
//!
//! Populates the database with producers for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 producers (default)
//! cargo run -p agro-service --bin seed
//!
//! # Generate custom amount
//! cargo run -p agro-service --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p agro-service --bin seed -- --db ./data/agro.db
//! ```
//!
//! Every producer goes through `ProducerService::create`, so seeded data
//! obeys the same rules as API traffic: valid CPF, consistent areas, one to
//! three crops from the catalog.

use std::env;

use agro_core::document::cpf_from_base;
use agro_core::{Area, CreateProducerInput, SEED_CROPS};
use agro_db::{Database, DbConfig};
use agro_service::ProducerService;

/// (city, state) pairs for realistic test data
const LOCATIONS: &[(&str, &str)] = &[
    ("Sorriso", "MT"),
    ("Rio Verde", "GO"),
    ("Cascavel", "PR"),
    ("Chapecó", "SC"),
    ("Uberaba", "MG"),
    ("Barreiras", "BA"),
    ("Dourados", "MS"),
    ("Passo Fundo", "RS"),
    ("Ribeirão Preto", "SP"),
    ("Balsas", "MA"),
];

const FIRST_NAMES: &[&str] = &[
    "João", "Maria", "José", "Ana", "Carlos", "Fernanda", "Paulo", "Juliana", "Marcos", "Luciana",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Souza", "Oliveira", "Pereira", "Costa", "Rodrigues", "Almeida", "Nascimento",
];

const FARM_PREFIXES: &[&str] = &["Fazenda", "Sítio", "Chácara", "Estância"];

const FARM_NAMES: &[&str] = &[
    "Boa Vista", "Santa Rita", "Esperança", "Aurora", "São José", "Bela Vista", "Primavera",
];

/// First CPF base handed out; each producer takes the next one.
const CPF_BASE_START: u32 = 100_000_001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./agro_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Agro Registry Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of producers to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./agro_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Agro Registry Seed Data Generator");
    println!("====================================");
    println!("Database:  {}", db_path);
    println!("Producers: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.producers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} producers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let service = ProducerService::new(db.store(), db.store());

    println!();
    println!("Generating producers...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let Some(input) = generate_producer(seed) else {
            eprintln!("Skipping seed {}: no valid document", seed);
            continue;
        };

        if let Err(e) = service.create(input).await {
            eprintln!("Failed to create producer {}: {}", seed, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} producers...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} producers in {:?}", generated, elapsed);

    let dashboard = service.get_dashboard_data().await?;
    println!();
    println!("Dashboard:");
    println!("  Farms:        {}", dashboard.total_farms);
    println!("  Total area:   {}", dashboard.total_area);
    println!("  Agricultural: {}", dashboard.land_usage.agricultural_area);
    println!("  Vegetation:   {}", dashboard.land_usage.vegetation_area);
    for crop in &dashboard.farms_by_crop {
        println!("  {:<13} {}", format!("{}:", crop.crop), crop.count);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one producer with deterministic, rule-abiding data.
fn generate_producer(seed: usize) -> Option<CreateProducerInput> {
    let base = CPF_BASE_START.checked_add(u32::try_from(seed).ok()?)?;
    let document = cpf_from_base(&format!("{:09}", base))?;

    let (city, state) = LOCATIONS[seed % LOCATIONS.len()];
    let producer_name = format!(
        "{} {}",
        FIRST_NAMES[seed % FIRST_NAMES.len()],
        LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()]
    );
    let farm_name = format!(
        "{} {}",
        FARM_PREFIXES[seed % FARM_PREFIXES.len()],
        FARM_NAMES[(seed * 7) % FARM_NAMES.len()]
    );

    // 50.00 - 2049.99 ha, split 40-80% agricultural, 20% vegetation at most
    let total = 5_000 + ((seed as i64 * 7_919) % 200_000);
    let agricultural = total * (40 + (seed as i64 % 41)) / 100;
    let vegetation = (total - agricultural).min(total / 5);

    let crop_count = 1 + seed % 3;
    let crops = (0..crop_count)
        .map(|offset| SEED_CROPS[(seed + offset * 2) % SEED_CROPS.len()].0.to_string())
        .collect();

    Some(CreateProducerInput {
        document,
        producer_name,
        farm_name,
        city: city.to_string(),
        state: state.to_string(),
        total_area: Area::from_hundredths(total),
        agricultural_area: Area::from_hundredths(agricultural),
        vegetation_area: Area::from_hundredths(vegetation),
        crops,
    })
}
