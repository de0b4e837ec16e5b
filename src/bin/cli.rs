use clap::{Parser, Subcommand};
use cuaderno::cli::create_admin;
use cuaderno::cli::seeder::{SeedCounts, clear_seeded_data, seed_database};
use cuaderno_db::{DatabaseConfig, SqlitePool, init_db_pool, run_migrations};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "cuaderno-cli")]
#[command(about = "Cuaderno CLI - Administrative tools for Cuaderno", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin {
        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake subjects, commissions and users
    Seed {
        /// Number of subjects to create
        #[arg(short = 's', long, default_value = "8")]
        subjects: usize,

        /// Number of commissions per subject
        #[arg(short = 'c', long, default_value = "2")]
        commissions: usize,

        /// Number of professors
        #[arg(long, default_value = "6")]
        professors: usize,

        /// Number of students
        #[arg(long, default_value = "60")]
        students: usize,
    },
    /// Clear all seeded data (keeps admins)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            subjects,
            commissions,
            professors,
            students,
        } => {
            let counts = SeedCounts {
                subjects,
                commissions_per_subject: commissions.max(1),
                professors,
                students,
            };
            handle_seed(&pool, counts).await
        }
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

async fn connect() -> Result<SqlitePool, Box<dyn std::error::Error>> {
    let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn prompt(value: Option<String>, label: &str) -> String {
    if let Some(value) = value {
        return value;
    }
    match Input::new().with_prompt(label).interact_text() {
        Ok(value) => value,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", label.to_lowercase(), e);
            std::process::exit(1);
        }
    }
}

async fn handle_create_admin(
    pool: &SqlitePool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let first_name = prompt(first_name, "First name");
    let last_name = prompt(last_name, "Last name");
    let email = prompt(email, "Email address");

    let password = match password {
        Some(password) => password,
        None => match Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
        {
            Ok(password) => password,
            Err(e) => {
                eprintln!("❌ Failed to read password: {}", e);
                std::process::exit(1);
            }
        },
    };

    match create_admin(pool, &first_name, &last_name, &email, &password).await {
        Ok(user) => {
            println!("\n✅ Admin created successfully!");
            println!("   ID: {}", user.id);
            println!("   Email: {}", user.email);
            println!("   Name: {} {}", user.first_name, user.last_name);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(pool: &SqlitePool, counts: SeedCounts) {
    if let Err(e) = seed_database(pool, counts).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
}

async fn handle_clear_seed(pool: &SqlitePool) {
    if let Err(e) = clear_seeded_data(pool).await {
        eprintln!("\n❌ Error clearing seeded data: {}", e);
        std::process::exit(1);
    }
}
