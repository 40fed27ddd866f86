use anyhow::{bail, Context as _};
use clap::Parser;
use nririsk::{Address, Config};
use std::{process, time::Duration};

#[derive(Parser, Debug)]
#[command(
    name = "nririsk",
    version,
    about = "Prints FEMA National Risk Index information for an address"
)]
struct Args {
    /// Google Maps API key, see https://developers.google.com/maps/documentation/geocoding/get-api-key
    #[arg(long, alias = "apiKey", env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Timeout for each request
    #[arg(long, default_value_t = nririsk::DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    #[arg(long, default_value = "Central Park West")]
    street: String,
    #[arg(long, default_value_t = 115)]
    number: u32,
    #[arg(long, default_value = "New York")]
    city: String,
    #[arg(long, default_value = "New York")]
    state: String,
    #[arg(long, default_value = "United States")]
    country: String,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let api_key = match self.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!("please provide a value for --api-key"),
        };
        Ok(Config {
            api_key,
            address: Address {
                street: self.street,
                number: self.number,
                city: self.city,
                state: self.state,
                country: self.country,
            },
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let attrs = nririsk::report(&config)
        .await
        .with_context(|| format!("no risk report for {}", config.address))?;
    println!("{}", nririsk::PREAMBLE);
    println!("{}", attrs);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("could not start tokio runtime: {}", err);
            process::exit(1);
        }
    };
    if let Err(err) = runtime.block_on(run(config)) {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["nririsk"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn without_key(api_key: Option<&str>) -> Args {
        Args {
            api_key: api_key.map(String::from),
            ..args(&["--api-key=unused"])
        }
    }

    #[test]
    fn api_key_is_required() {
        let err = without_key(None).into_config().unwrap_err();
        assert_eq!(err.to_string(), "please provide a value for --api-key");
        assert!(without_key(Some("  ")).into_config().is_err());
        assert!(args(&["--api-key", "  "]).into_config().is_err());
    }

    #[test]
    fn both_flag_spellings() {
        let config = args(&["--apiKey=abc"]).into_config().unwrap();
        assert_eq!(config.api_key, "abc");
        let config = args(&["--api-key", "abc", "--timeout-ms", "100"])
            .into_config()
            .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(100));
        assert_eq!(config.address, Address::default());
    }

    #[test]
    fn address_overrides() {
        let config = args(&[
            "--api-key=k",
            "--street",
            "Broad St",
            "--number",
            "400",
            "--city",
            "Seattle",
            "--state",
            "Washington",
        ])
        .into_config()
        .unwrap();
        assert_eq!(
            config.address.to_string(),
            "400 Broad St, Seattle, Washington, United States"
        );
    }
}
