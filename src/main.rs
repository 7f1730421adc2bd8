use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use role2_exercise_builder::display::{print_exercise_schedule, write_msel_to_file};
use role2_exercise_builder::narrative::{NarrativeBackend, NarrativeSettings};
use role2_exercise_builder::{generate_exercise, web, ExerciseConfig};

const USAGE: &str = "usage: role2-exercise-builder <config.json> [--seed N] [--out FILE]\n       role2-exercise-builder web [port]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let generator = NarrativeBackend::from_settings(NarrativeSettings::from_env());
    info!(narrative = %generator.describe(), "narrative generator configured");

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let password = std::env::var("ADMIN_PASSWORD")
            .unwrap_or_else(|_| "admin123".to_string());

        println!("Starting web server on port {}...", port);
        println!("Access the API at http://localhost:{}/api/exercises", port);

        web::start_server(port, password, generator).await?;
        return Ok(());
    }

    // CLI mode
    let Some(config_path) = args.get(1) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut seed: Option<u64> = None;
    let mut out_path = "msel.csv".to_string();
    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--seed" => seed = rest.next().and_then(|s| s.parse().ok()),
            "--out" => {
                if let Some(path) = rest.next() {
                    out_path = path.clone();
                }
            }
            other => {
                eprintln!("unknown argument: {}\n{}", other, USAGE);
                return Ok(());
            }
        }
    }

    println!("Loading exercise configuration from {}...", config_path);
    let config = match ExerciseConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid exercise configuration");
            return Err(e.into());
        }
    };

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let schedule = generate_exercise(&config, &generator, &mut rng).await?;
    print_exercise_schedule(&config, &schedule);

    write_msel_to_file(&schedule.entries, &out_path)?;
    println!("\nMSEL saved to: {}", out_path);

    Ok(())
}
