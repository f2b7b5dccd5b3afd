use clap::{Parser, Subcommand};
use dialoguer::Input;
use dotenvy::dotenv;
use scholaris_cli::{
    admin,
    seeder::{self, SeedConfig, UsersPerSchool},
};
use scholaris_config::{DatabaseConfig, JwtConfig};
use scholaris_db::{PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "scholaris-cli")]
#[command(about = "Scholaris CLI - Administrative tools for Scholaris", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a new super admin account
    CreateSuperAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Full name of the super admin
        #[arg(short = 'n', long)]
        full_name: Option<String>,
    },
    /// Print a bearer token for an existing user
    IssueToken {
        /// Email of the user the token is issued for
        #[arg(short = 'e', long)]
        email: String,
    },
    /// Seed the database with fake schools, staff, parents, students and canteen items
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        /// Number of school admins per school
        #[arg(long, default_value = "1")]
        admins: usize,

        /// Number of finance staff per school
        #[arg(long, default_value = "1")]
        finance: usize,

        /// Number of canteen staff per school
        #[arg(long, default_value = "2")]
        canteen: usize,

        /// Number of parents per school
        #[arg(long, default_value = "20")]
        parents: usize,

        /// Number of students per parent
        #[arg(long, default_value = "2")]
        children: usize,
    },
    /// Clear all seeded schools and their data (real tenants are kept)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => fail("connecting to database", e),
    };

    match cli.command {
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::CreateSuperAdmin { email, full_name } => {
            handle_create_super_admin(&pool, email, full_name).await
        }
        Commands::IssueToken { email } => handle_issue_token(&pool, &email).await,
        Commands::Seed {
            schools,
            admins,
            finance,
            canteen,
            parents,
            children,
        } => {
            let config = SeedConfig::new(schools)
                .with_users(UsersPerSchool {
                    admins,
                    finance,
                    canteen_staff: canteen,
                    parents,
                })
                .with_children_per_parent(children);

            if let Err(e) = seeder::seed_all(&pool, config).await {
                fail("seeding database", e);
            }
        }
        Commands::ClearSeed => {
            if let Err(e) = seeder::clear_seeded_data(&pool).await {
                fail("clearing seeded data", e);
            }
        }
    }

    pool.close().await;
}

async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    Ok(init_db_pool(&config).await?)
}

fn fail(action: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ Error {}: {}", action, e);
    std::process::exit(1);
}

async fn handle_migrate(pool: &PgPool) {
    match sqlx::migrate!("../../migrations").run(pool).await {
        Ok(()) => println!("✅ Migrations applied"),
        Err(e) => fail("running migrations", e),
    }
}

async fn handle_create_super_admin(
    pool: &PgPool,
    email: Option<String>,
    full_name: Option<String>,
) {
    let email = match email {
        Some(email) => email,
        None => prompt("Email address"),
    };
    let full_name = match full_name {
        Some(name) => name,
        None => prompt("Full name"),
    };

    match admin::create_super_admin(pool, &email, &full_name).await {
        Ok(user_id) => {
            println!("\n✅ Super admin created successfully!");
            println!("   Id: {}", user_id);
            println!("   Email: {}", email);
            println!("   Name: {}", full_name);
        }
        Err(e) => fail("creating super admin", e),
    }
}

async fn handle_issue_token(pool: &PgPool, email: &str) {
    let jwt_config = JwtConfig::from_env();
    match admin::issue_token(pool, email, &jwt_config).await {
        Ok(token) => println!("{}", token),
        Err(e) => fail("issuing token", e),
    }
}

fn prompt(label: &str) -> String {
    match Input::<String>::new().with_prompt(label).interact_text() {
        Ok(value) => value,
        Err(e) => fail("reading input", e),
    }
}
